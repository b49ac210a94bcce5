// File: ./src/dialect.rs
// The two markup dialects and the selector data each one is recognised by
use crate::dom::HostDocument;
use crate::model::Category;
use crate::selector::{AttrOp, Selector, Simple};
use serde::{Deserialize, Serialize};

/// Attribute carrying the event node id in the current markup.
pub const EVENT_ID_ATTR: &str = "data-timeline-event-id";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Older server-rendered markup, still used on pull requests.
    Legacy,
    /// React issue viewer.
    Current,
}

/// Structural test applied to one timeline item.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Some descendant matches.
    Has(Selector),
    /// No descendant matches.
    Lacks(Selector),
    /// The first descendant carrying `attribute` has a value starting with `prefix`.
    DescendantAttrPrefix { attribute: String, prefix: String },
    AllOf(Vec<Predicate>),
}

impl Predicate {
    pub fn evaluate<D: HostDocument>(&self, doc: &D, item: D::Node) -> bool {
        match self {
            Predicate::Has(selector) => selector.has_descendant(doc, item),
            Predicate::Lacks(selector) => !selector.has_descendant(doc, item),
            Predicate::DescendantAttrPrefix { attribute, prefix } => {
                Selector::attr(attribute, AttrOp::Exists)
                    .query_first(doc, item)
                    .and_then(|node| doc.attribute(node, attribute))
                    .is_some_and(|value| value.starts_with(prefix.as_str()))
            }
            Predicate::AllOf(predicates) => predicates.iter().all(|p| p.evaluate(doc, item)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub category: Category,
    pub predicate: Predicate,
}

impl Rule {
    pub fn new(category: Category, predicate: Predicate) -> Self {
        Self {
            category,
            predicate,
        }
    }
}

/// Selector data for one dialect. Rules are evaluated in order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DialectProfile {
    pub container: Selector,
    pub item: Selector,
    pub rules: Vec<Rule>,
}

fn event_id_prefix(prefix: &str) -> Predicate {
    Predicate::DescendantAttrPrefix {
        attribute: EVENT_ID_ATTR.to_string(),
        prefix: prefix.to_string(),
    }
}

impl DialectProfile {
    pub fn legacy() -> Self {
        let review = || Selector::attr("id", AttrOp::Contains("pullrequestreview-".to_string()));
        let hovercard =
            |kind: &str| Selector::attr("data-hovercard-type", AttrOp::Equals(kind.to_string()));
        Self {
            container: Selector::class("js-discussion"),
            item: Selector::class("js-timeline-item"),
            rules: vec![
                Rule::new(
                    Category::Comments,
                    Predicate::AllOf(vec![
                        Predicate::Has(Selector::class("js-comment-container")),
                        Predicate::Lacks(review()),
                    ]),
                ),
                Rule::new(
                    Category::Commits,
                    Predicate::Has(Selector::attr(
                        "id",
                        AttrOp::Contains("commits-pushed-".to_string()),
                    )),
                ),
                Rule::new(Category::Pulls, Predicate::Has(hovercard("pull_request"))),
                Rule::new(Category::Issues, Predicate::Has(hovercard("issue"))),
                Rule::new(Category::Reviews, Predicate::Has(review())),
            ],
        }
    }

    pub fn current() -> Self {
        let cross_reference = |path: &str| {
            Predicate::AllOf(vec![
                event_id_prefix("CRE_"),
                Predicate::Has(Selector::attr(
                    "data-hovercard-url",
                    AttrOp::Contains(path.to_string()),
                )),
            ])
        };
        Self {
            container: Selector::attr(
                "data-testid",
                AttrOp::Equals("issue-viewer-container".to_string()),
            ),
            item: Selector::compound(vec![
                Simple::Attr {
                    name: "class".to_string(),
                    op: AttrOp::Contains("LayoutHelpers-module__timelineElement".to_string()),
                },
                Simple::Has(Selector::attr(EVENT_ID_ATTR, AttrOp::Exists)),
            ]),
            rules: vec![
                Rule::new(Category::Comments, event_id_prefix("IC_")),
                Rule::new(Category::Commits, event_id_prefix("REFE_")),
                Rule::new(Category::Pulls, cross_reference("/pull/")),
                Rule::new(Category::Issues, cross_reference("/issues/")),
                Rule::new(Category::Deployments, event_id_prefix("DE_")),
            ],
        }
    }

    /// Rule categories in priority order, then `Others`.
    pub fn categories(&self) -> Vec<Category> {
        let mut out: Vec<Category> = Vec::new();
        for rule in &self.rules {
            if !out.contains(&rule.category) {
                out.push(rule.category);
            }
        }
        out.retain(|c| *c != Category::Others);
        out.push(Category::Others);
        out
    }
}

/// Both dialects side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profiles {
    pub legacy: DialectProfile,
    pub current: DialectProfile,
}

impl Default for Profiles {
    fn default() -> Self {
        Self {
            legacy: DialectProfile::legacy(),
            current: DialectProfile::current(),
        }
    }
}

impl Profiles {
    pub fn get(&self, dialect: Dialect) -> &DialectProfile {
        match dialect {
            Dialect::Legacy => &self.legacy,
            Dialect::Current => &self.current,
        }
    }

    /// Decides which dialect a container is written in.
    /// `None` when it matches neither container selector or both.
    pub fn detect<D: HostDocument>(&self, doc: &D, container: D::Node) -> Option<Dialect> {
        let legacy = self.legacy.container.matches(doc, container);
        let current = self.current.container.matches(doc, container);
        match (legacy, current) {
            (true, false) => Some(Dialect::Legacy),
            (false, true) => Some(Dialect::Current),
            _ => None,
        }
    }

    pub fn is_container<D: HostDocument>(&self, doc: &D, node: D::Node) -> bool {
        self.legacy.container.matches(doc, node) || self.current.container.matches(doc, node)
    }

    /// `node` itself when it is a container, followed by every container below it.
    pub fn containers_within<D: HostDocument>(&self, doc: &D, node: D::Node) -> Vec<D::Node> {
        if !doc.is_element(node) {
            return vec![];
        }
        let mut found = Vec::new();
        if self.is_container(doc, node) {
            found.push(node);
        }
        found.extend(
            doc.descendants(node)
                .into_iter()
                .filter(|n| self.is_container(doc, *n)),
        );
        found
    }

    /// Items of a container whose dialect could not be told apart:
    /// anything either dialect would treat as an item.
    pub fn any_items<D: HostDocument>(&self, doc: &D, container: D::Node) -> Vec<D::Node> {
        self.legacy
            .item
            .clone()
            .or(self.current.item.clone())
            .query_all(doc, container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, Tree};

    #[test]
    fn builtin_selectors_match_their_text_form() {
        let current = DialectProfile::current();
        let parsed = Selector::parse(
            "[class*=\"LayoutHelpers-module__timelineElement\"]:has([data-timeline-event-id])",
        )
        .unwrap();
        assert_eq!(current.item, parsed);
        assert_eq!(
            DialectProfile::legacy().container,
            Selector::parse(".js-discussion").unwrap()
        );
    }

    #[test]
    fn category_sets_differ_per_dialect() {
        let legacy = DialectProfile::legacy().categories();
        let current = DialectProfile::current().categories();
        assert!(legacy.contains(&Category::Reviews));
        assert!(!current.contains(&Category::Reviews));
        assert!(current.contains(&Category::Deployments));
        assert_eq!(legacy.last(), Some(&Category::Others));
        assert_eq!(current.last(), Some(&Category::Others));
    }

    #[test]
    fn detection_is_exclusive() {
        let tree = Tree::with_content(&[
            ElementSpec::new("div").class("js-discussion"),
            ElementSpec::new("div").attr("data-testid", "issue-viewer-container"),
            ElementSpec::new("div")
                .class("js-discussion")
                .attr("data-testid", "issue-viewer-container"),
            ElementSpec::new("div"),
        ]);
        let profiles = Profiles::default();
        let nodes = tree.children(tree.body());
        assert_eq!(profiles.detect(&tree, nodes[0]), Some(Dialect::Legacy));
        assert_eq!(profiles.detect(&tree, nodes[1]), Some(Dialect::Current));
        assert_eq!(profiles.detect(&tree, nodes[2]), None);
        assert_eq!(profiles.detect(&tree, nodes[3]), None);
    }

    #[test]
    fn containers_within_checks_node_and_descendants() {
        let tree = Tree::with_content(&[ElementSpec::new("main")
            .child(ElementSpec::new("div").class("js-discussion"))
            .child(ElementSpec::new("div").attr("data-testid", "issue-viewer-container"))]);
        let profiles = Profiles::default();
        let main = tree.children(tree.body())[0];
        assert_eq!(profiles.containers_within(&tree, main).len(), 2);

        let direct = tree.children(main)[0];
        assert_eq!(profiles.containers_within(&tree, direct), vec![direct]);
    }

    #[test]
    fn event_id_prefix_reads_the_first_marked_descendant() {
        let tree = Tree::with_content(&[ElementSpec::new("div")
            .child(ElementSpec::new("span").attr(EVENT_ID_ATTR, "IC_kwDO"))
            .child(ElementSpec::new("span").attr(EVENT_ID_ATTR, "REFE_x"))]);
        let item = tree.children(tree.body())[0];
        assert!(event_id_prefix("IC_").evaluate(&tree, item));
        assert!(!event_id_prefix("REFE_").evaluate(&tree, item));
    }

    #[test]
    fn profiles_deserialize_from_toml() {
        let toml_src = r#"
            container = ".js-discussion"
            item = ".js-timeline-item"

            [[rules]]
            category = "comments"
            predicate = { has = ".js-comment-container" }

            [[rules]]
            category = "commits"
            predicate = { descendant_attr_prefix = { attribute = "data-id", prefix = "C" } }
        "#;
        let profile: DialectProfile = toml::from_str(toml_src).unwrap();
        assert_eq!(profile.rules.len(), 2);
        assert_eq!(
            profile.categories(),
            vec![Category::Comments, Category::Commits, Category::Others]
        );
    }
}
