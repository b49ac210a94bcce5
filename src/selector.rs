// File: ./src/selector.rs
// Structural selectors: a small CSS subset held as data and matched against a HostDocument
use crate::dom::HostDocument;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected '{found}' at offset {offset}")]
    Unexpected { offset: usize, found: char },
    #[error("unexpected end of selector, expected {0}")]
    UnexpectedEnd(&'static str),
    #[error("combinators are not supported (offset {0}), use :has(...)")]
    Combinator(usize),
    #[error("unknown pseudo-class ':{0}'")]
    UnknownPseudo(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrOp {
    /// `[name]`
    Exists,
    /// `[name="v"]`
    Equals(String),
    /// `[name*="v"]`
    Contains(String),
    /// `[name^="v"]`
    Prefix(String),
    /// `[name$="v"]`
    Suffix(String),
    /// `[name~="v"]`
    Word(String),
}

impl AttrOp {
    fn test(&self, value: &str) -> bool {
        match self {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            AttrOp::Contains(v) => value.contains(v.as_str()),
            AttrOp::Prefix(v) => value.starts_with(v.as_str()),
            AttrOp::Suffix(v) => value.ends_with(v.as_str()),
            AttrOp::Word(v) => value.split_whitespace().any(|w| w == v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Simple {
    Tag(String),
    Class(String),
    Id(String),
    Attr { name: String, op: AttrOp },
    Has(Selector),
    Not(Selector),
}

/// A selector list: matches when any alternative matches.
/// Each alternative is a compound of simple selectors that must all hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
    alternatives: Vec<Vec<Simple>>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut cursor = Cursor::new(source);
        cursor.skip_ws();
        if cursor.at_end() {
            return Err(SelectorError::Empty);
        }
        let selector = cursor.list()?;
        cursor.skip_ws();
        match cursor.peek() {
            None => Ok(selector),
            Some(found) => Err(SelectorError::Unexpected {
                offset: cursor.pos,
                found,
            }),
        }
    }

    pub fn compound(parts: Vec<Simple>) -> Self {
        Self {
            alternatives: vec![parts],
        }
    }

    pub fn class(name: &str) -> Self {
        Self::compound(vec![Simple::Class(name.to_string())])
    }

    pub fn attr(name: &str, op: AttrOp) -> Self {
        Self::compound(vec![Simple::Attr {
            name: name.to_string(),
            op,
        }])
    }

    /// Selector list matching whatever `self` or `other` matches.
    pub fn or(mut self, other: Selector) -> Self {
        self.alternatives.extend(other.alternatives);
        self
    }

    pub fn matches<D: HostDocument>(&self, doc: &D, node: D::Node) -> bool {
        doc.is_element(node)
            && self
                .alternatives
                .iter()
                .any(|parts| parts.iter().all(|part| part.matches(doc, node)))
    }

    /// Matching descendants of `root` in document order, `root` excluded.
    pub fn query_all<D: HostDocument>(&self, doc: &D, root: D::Node) -> Vec<D::Node> {
        doc.descendants(root)
            .into_iter()
            .filter(|node| self.matches(doc, *node))
            .collect()
    }

    pub fn query_first<D: HostDocument>(&self, doc: &D, root: D::Node) -> Option<D::Node> {
        doc.descendants(root)
            .into_iter()
            .find(|node| self.matches(doc, *node))
    }

    pub fn has_descendant<D: HostDocument>(&self, doc: &D, root: D::Node) -> bool {
        self.query_first(doc, root).is_some()
    }
}

impl Simple {
    fn matches<D: HostDocument>(&self, doc: &D, node: D::Node) -> bool {
        match self {
            Simple::Tag(tag) => doc
                .tag_name(node)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag)),
            Simple::Class(class) => doc.has_class(node, class),
            Simple::Id(id) => doc.attribute(node, "id") == Some(id.as_str()),
            Simple::Attr { name, op } => doc.attribute(node, name).is_some_and(|v| op.test(v)),
            Simple::Has(inner) => inner.has_descendant(doc, node),
            Simple::Not(inner) => !inner.matches(doc, node),
        }
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, parts) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            for part in parts {
                write!(f, "{}", part)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Simple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Simple::Tag(tag) => write!(f, "{}", tag),
            Simple::Class(class) => write!(f, ".{}", class),
            Simple::Id(id) => write!(f, "#{}", id),
            Simple::Attr { name, op } => match op {
                AttrOp::Exists => write!(f, "[{}]", name),
                AttrOp::Equals(v) => write!(f, "[{}=\"{}\"]", name, v),
                AttrOp::Contains(v) => write!(f, "[{}*=\"{}\"]", name, v),
                AttrOp::Prefix(v) => write!(f, "[{}^=\"{}\"]", name, v),
                AttrOp::Suffix(v) => write!(f, "[{}$=\"{}\"]", name, v),
                AttrOp::Word(v) => write!(f, "[{}~=\"{}\"]", name, v),
            },
            Simple::Has(inner) => write!(f, ":has({})", inner),
            Simple::Not(inner) => write!(f, ":not({})", inner),
        }
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char, what: &'static str) -> Result<(), SelectorError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(SelectorError::Unexpected {
                offset: self.pos,
                found,
            }),
            None => Err(SelectorError::UnexpectedEnd(what)),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if start == self.pos {
            return match self.peek() {
                Some(found) => Err(SelectorError::Unexpected {
                    offset: self.pos,
                    found,
                }),
                None => Err(SelectorError::UnexpectedEnd("an identifier")),
            };
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn list(&mut self) -> Result<Selector, SelectorError> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_ws();
            alternatives.push(self.compound()?);
            let before_ws = self.pos;
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            // Whitespace followed by another selector would be a descendant combinator.
            if self.pos > before_ws
                && self
                    .peek()
                    .is_some_and(|c| c != ')' && c != ',')
            {
                return Err(SelectorError::Combinator(before_ws));
            }
            return Ok(Selector { alternatives });
        }
    }

    fn compound(&mut self) -> Result<Vec<Simple>, SelectorError> {
        let mut parts = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump();
                    parts.push(Simple::Class(self.ident()?));
                }
                '#' => {
                    self.bump();
                    parts.push(Simple::Id(self.ident()?));
                }
                '[' => parts.push(self.attribute()?),
                ':' => parts.push(self.pseudo()?),
                c if is_ident_char(c) && parts.is_empty() => {
                    parts.push(Simple::Tag(self.ident()?));
                }
                '>' | '+' | '~' => return Err(SelectorError::Combinator(self.pos)),
                _ => break,
            }
        }
        if parts.is_empty() {
            return match self.peek() {
                Some(found) => Err(SelectorError::Unexpected {
                    offset: self.pos,
                    found,
                }),
                None => Err(SelectorError::UnexpectedEnd("a selector")),
            };
        }
        Ok(parts)
    }

    fn attribute(&mut self) -> Result<Simple, SelectorError> {
        self.expect('[', "'['")?;
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        if self.eat(']') {
            return Ok(Simple::Attr {
                name,
                op: AttrOp::Exists,
            });
        }
        let kind = match self.peek() {
            Some(c @ ('*' | '^' | '$' | '~')) => {
                self.bump();
                Some(c)
            }
            _ => None,
        };
        self.expect('=', "'='")?;
        self.skip_ws();
        let value = self.value()?;
        self.skip_ws();
        self.expect(']', "']'")?;
        let op = match kind {
            None => AttrOp::Equals(value),
            Some('*') => AttrOp::Contains(value),
            Some('^') => AttrOp::Prefix(value),
            Some('$') => AttrOp::Suffix(value),
            _ => AttrOp::Word(value),
        };
        Ok(Simple::Attr { name, op })
    }

    fn value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == quote {
                        let value = self.src[start..self.pos].to_string();
                        self.bump();
                        return Ok(value);
                    }
                    self.bump();
                }
                Err(SelectorError::UnexpectedEnd("a closing quote"))
            }
            _ => self.ident(),
        }
    }

    fn pseudo(&mut self) -> Result<Simple, SelectorError> {
        self.expect(':', "':'")?;
        let name = self.ident()?;
        let wrap: fn(Selector) -> Simple = match name.as_str() {
            "has" => Simple::Has,
            "not" => Simple::Not,
            _ => return Err(SelectorError::UnknownPseudo(name)),
        };
        self.expect('(', "'('")?;
        let inner = self.list()?;
        self.skip_ws();
        self.expect(')', "')'")?;
        Ok(wrap(inner))
    }
}
