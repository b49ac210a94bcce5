// File: ./src/dom/tree.rs
// Arena-backed document that queues structural changes like a mutation observer
use crate::dom::{HostDocument, MutationBatch, MutationRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const TEXT_TAG: &str = "#text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Serializable description of an element subtree (fixture format).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
            text: None,
            children: vec![],
        }
    }

    pub fn text_node(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::new(TEXT_TAG)
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attrs: IndexMap<String, String>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    body: NodeId,
    pending: MutationBatch<NodeId>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        let body = NodeData {
            tag: "body".to_string(),
            attrs: IndexMap::new(),
            text: None,
            parent: None,
            children: vec![],
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            pending: vec![],
        }
    }

    /// Builds a document whose body holds `content`. Nothing is queued.
    pub fn with_content(content: &[ElementSpec]) -> Self {
        let mut tree = Self::new();
        let body = tree.body;
        for spec in content {
            tree.insert(body, spec);
        }
        tree.pending.clear();
        tree
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let content: Vec<ElementSpec> = serde_json::from_str(json)?;
        Ok(Self::with_content(&content))
    }

    /// Appends the subtree described by `spec` under `parent`.
    /// Queues a single record for the subtree root, as a browser would.
    pub fn insert(&mut self, parent: NodeId, spec: &ElementSpec) -> NodeId {
        let node = self.build(spec);
        self.append_child(parent, node);
        node
    }

    fn build(&mut self, spec: &ElementSpec) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag: spec.tag.clone(),
            attrs: spec.attrs.clone(),
            text: spec.text.clone(),
            parent: None,
            children: vec![],
        });
        for child_spec in &spec.children {
            let child = self.build(child_spec);
            self.nodes[child.0].parent = Some(id);
            self.nodes[id.0].children.push(child);
        }
        id
    }

    /// Detaches `node` from its parent. The node keeps its own subtree.
    pub fn remove(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        self.pending.push(MutationRecord {
            target: parent,
            added: vec![],
            removed: vec![node],
        });
        true
    }

    /// Drains queued records as one batch, like `MutationObserver.takeRecords`.
    pub fn take_records(&mut self) -> MutationBatch<NodeId> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.body, node)
    }

    /// Own text followed by the text of every descendant.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        if let Some(text) = &self.nodes[node.0].text {
            parts.push(text.as_str());
        }
        for descendant in self.descendants(node) {
            if let Some(text) = &self.nodes[descendant.0].text {
                parts.push(text.as_str());
            }
        }
        parts.join(" ")
    }

    /// Snapshot of a subtree, suitable for re-inserting a copy.
    pub fn to_spec(&self, node: NodeId) -> ElementSpec {
        let data = &self.nodes[node.0];
        ElementSpec {
            tag: data.tag.clone(),
            attrs: data.attrs.clone(),
            text: data.text.clone(),
            children: data.children.iter().map(|c| self.to_spec(*c)).collect(),
        }
    }
}

impl HostDocument for Tree {
    type Node = NodeId;

    fn body(&self) -> NodeId {
        self.body
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.nodes[node.0].tag != TEXT_TAG
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        Some(self.nodes[node.0].tag.as_str()).filter(|tag| *tag != TEXT_TAG)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attrs.get(name).map(String::as_str)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.nodes[node.0].attrs.shift_remove(name);
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].text = Some(text.to_string());
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.build(&ElementSpec::new(tag))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.remove(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.pending.push(MutationRecord {
            target: parent,
            added: vec![child],
            removed: vec![],
        });
    }
}
