//! An in-memory [`DomSink`] fake, for exercising [`crate::interpreter::Interpreter`]
//! without a real DOM binding. Modeled on `dioxus-core`'s test-only mock renderer:
//! an arena of node records addressed by index rather than a real tree of pointers,
//! with parent links kept only so splice operations (`replace`, `insert_before`) can
//! find and update a node's current parent.

use crate::dom::DomSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element(u16),
    Text(String),
    Placeholder,
}

#[derive(Clone, Debug, Default)]
pub struct NodeRecord {
    pub kind: Option<NodeKind>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub attrs: Vec<(u8, String, String)>,
    pub listeners: Vec<String>,
}

/// A flat vec-of-records tree, with a dedicated root record at index 0 that every
/// mutation stream mounts its top-level nodes into.
pub struct VecDom {
    nodes: Vec<NodeRecord>,
}

impl Default for VecDom {
    fn default() -> Self {
        let root = NodeRecord {
            kind: None,
            ..Default::default()
        };
        Self { nodes: vec![root] }
    }
}

impl VecDom {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, record: NodeRecord) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(record);
        id
    }

    fn record(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id.0]
    }

    fn record_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        &mut self.nodes[id.0]
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.record(id).parent {
            self.record_mut(parent).children.retain(|&c| c != id);
        }
        self.record_mut(id).parent = None;
    }

    // --- test-assertion helpers, not part of `DomSink` ---

    pub fn root_children(&self) -> &[NodeId] {
        &self.record(NodeId(0)).children
    }

    pub fn kind_of(&self, id: NodeId) -> &NodeKind {
        self.record(id).kind.as_ref().expect("node has no kind")
    }

    pub fn tag_of(&self, id: NodeId) -> u16 {
        match self.kind_of(id) {
            NodeKind::Element(tag) => *tag,
            other => panic!("tag_of called on non-element {other:?}"),
        }
    }

    pub fn text_of(&self, id: NodeId) -> &str {
        match self.kind_of(id) {
            NodeKind::Text(s) => s,
            other => panic!("text_of called on non-text {other:?}"),
        }
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.record(id).children
    }

    pub fn attr_value(&self, id: NodeId, name: &str) -> Option<&str> {
        self.record(id)
            .attrs
            .iter()
            .find(|(_, n, _)| n == name)
            .map(|(_, _, v)| v.as_str())
    }

    pub fn has_listener(&self, id: NodeId, name: &str) -> bool {
        self.record(id).listeners.iter().any(|n| n == name)
    }
}

impl DomSink for VecDom {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn create_element(&mut self, tag: u16) -> NodeId {
        self.push(NodeRecord {
            kind: Some(NodeKind::Element(tag)),
            ..Default::default()
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeRecord {
            kind: Some(NodeKind::Text(text.to_string())),
            ..Default::default()
        })
    }

    fn create_placeholder(&mut self) -> NodeId {
        self.push(NodeRecord {
            kind: Some(NodeKind::Placeholder),
            ..Default::default()
        })
    }

    fn clone_node(&mut self, node: &NodeId) -> NodeId {
        let kind = self.record(*node).kind.clone();
        let children: Vec<NodeId> = self.record(*node).children.clone();
        let attrs = self.record(*node).attrs.clone();
        let cloned_children: Vec<NodeId> = children.iter().map(|&c| self.clone_node(&c)).collect();
        let new_id = self.push(NodeRecord {
            kind,
            children: Vec::new(),
            parent: None,
            attrs,
            listeners: Vec::new(),
        });
        for child in cloned_children {
            self.append_child(&new_id, child);
        }
        new_id
    }

    fn set_attribute(&mut self, node: &NodeId, ns: u8, name: &str, value: &str) {
        let rec = self.record_mut(*node);
        if let Some(entry) = rec.attrs.iter_mut().find(|(_, n, _)| n == name) {
            entry.2 = value.to_string();
        } else {
            rec.attrs.push((ns, name.to_string(), value.to_string()));
        }
    }

    /// Per the owning-element convention: setting text on an `Element` node rewrites
    /// its first text child in place rather than requiring a separate node id.
    fn set_text(&mut self, node: &NodeId, text: &str) {
        match self.record(*node).kind.clone() {
            Some(NodeKind::Text(_)) => {
                self.record_mut(*node).kind = Some(NodeKind::Text(text.to_string()));
            }
            Some(NodeKind::Element(_)) => {
                let child = self
                    .record(*node)
                    .children
                    .iter()
                    .copied()
                    .find(|&c| matches!(self.record(c).kind, Some(NodeKind::Text(_))))
                    .expect("set_text on an element with no text child");
                self.record_mut(child).kind = Some(NodeKind::Text(text.to_string()));
            }
            other => panic!("set_text on unsupported node {other:?}"),
        }
    }

    fn append_child(&mut self, parent: &NodeId, child: NodeId) {
        self.detach(child);
        self.record_mut(child).parent = Some(*parent);
        self.record_mut(*parent).children.push(child);
    }

    fn insert_after(&mut self, anchor: &NodeId, node: NodeId) {
        self.detach(node);
        let parent = self.record(*anchor).parent.expect("insert_after on a parentless anchor");
        let pos = self.record(parent).children.iter().position(|&c| c == *anchor).unwrap();
        self.record_mut(node).parent = Some(parent);
        self.record_mut(parent).children.insert(pos + 1, node);
    }

    fn insert_before(&mut self, anchor: &NodeId, node: NodeId) {
        self.detach(node);
        let parent = self.record(*anchor).parent.expect("insert_before on a parentless anchor");
        let pos = self.record(parent).children.iter().position(|&c| c == *anchor).unwrap();
        self.record_mut(node).parent = Some(parent);
        self.record_mut(parent).children.insert(pos, node);
    }

    fn replace(&mut self, old: &NodeId, new: Vec<NodeId>) {
        let parent = self.record(*old).parent.expect("replace on a parentless node");
        let pos = self.record(parent).children.iter().position(|&c| c == *old).unwrap();
        self.record_mut(parent).children.remove(pos);
        for (offset, node) in new.into_iter().enumerate() {
            self.detach(node);
            self.record_mut(node).parent = Some(parent);
            self.record_mut(parent).children.insert(pos + offset, node);
        }
    }

    fn remove(&mut self, node: &NodeId) {
        self.detach(*node);
    }

    fn add_listener(&mut self, node: &NodeId, name: &str) {
        let listeners = &mut self.record_mut(*node).listeners;
        if !listeners.iter().any(|n| n == name) {
            listeners.push(name.to_string());
        }
    }

    fn remove_listener(&mut self, node: &NodeId, name: &str) {
        self.record_mut(*node).listeners.retain(|n| n != name);
    }

    fn child_at(&self, node: &NodeId, index: u8) -> NodeId {
        self.record(*node).children[index as usize]
    }
}
