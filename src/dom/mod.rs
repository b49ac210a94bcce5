// File: ./src/dom/mod.rs
// Host document abstraction plus the in-memory tree used by the driver and tests
pub mod tree;

pub use tree::{ElementSpec, NodeId, Tree};

use std::fmt::Debug;
use std::hash::Hash;

/// One structural change, shaped like a mutation observer record:
/// `added` and `removed` are direct children of `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub target: N,
    pub added: Vec<N>,
    pub removed: Vec<N>,
}

/// The records delivered together in one notification.
pub type MutationBatch<N> = Vec<MutationRecord<N>>;

/// The page the engine is injected into.
///
/// Only structure and attributes are read. The engine writes nothing but
/// the hidden marker class on timeline items and the nodes of its own panel.
pub trait HostDocument {
    type Node: Copy + Eq + Hash + Debug;

    fn body(&self) -> Self::Node;
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
    /// False for text and comment nodes.
    fn is_element(&self, node: Self::Node) -> bool;
    fn tag_name(&self, node: Self::Node) -> Option<&str>;
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;
    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);
    fn remove_attribute(&mut self, node: Self::Node, name: &str);
    /// Replaces the node's own text.
    fn set_text(&mut self, node: Self::Node, text: &str);
    /// Creates a detached element.
    fn create_element(&mut self, tag: &str) -> Self::Node;
    fn append_child(&mut self, parent: Self::Node, child: Self::Node);

    fn has_class(&self, node: Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Adds or removes `class`. Returns whether the class list changed.
    fn set_class(&mut self, node: Self::Node, class: &str, on: bool) -> bool {
        if self.has_class(node, class) == on {
            return false;
        }
        let joined = {
            let current = self.attribute(node, "class").unwrap_or("");
            let mut classes: Vec<&str> = current
                .split_whitespace()
                .filter(|c| *c != class)
                .collect();
            if on {
                classes.push(class);
            }
            classes.join(" ")
        };
        self.set_attribute(node, "class", &joined);
        true
    }

    /// Inclusive: a node contains itself.
    fn contains(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Every node below `root` in document order, `root` excluded.
    fn descendants(&self, root: Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Node> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }
}

/// A standing interest in structural changes below one subtree root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeSubscription<N> {
    root: N,
}

impl<N: Copy + Eq + Hash + Debug> SubtreeSubscription<N> {
    pub fn new(root: N) -> Self {
        Self { root }
    }

    pub fn root(&self) -> N {
        self.root
    }

    /// Whether any record in the batch happened inside the subtree.
    pub fn wants<D>(&self, doc: &D, batch: &[MutationRecord<N>]) -> bool
    where
        D: HostDocument<Node = N>,
    {
        batch
            .iter()
            .any(|record| doc.contains(self.root, record.target))
    }
}
