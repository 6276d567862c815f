//! Interned, immutable template trees (spec §4.7, §3).
//!
//! A template is a flat node vector rather than a pointer tree: each [`TNode`]
//! records its parent's index, so path resolution (used by `AssignId` emission and,
//! on the consumer side, by the interpreter's own path walk) is O(depth) with no
//! per-template allocation. This is the same flattening `dioxus-core`'s
//! `TemplateNode` enum achieves with lifetime-scoped slices; we use owned `Vec`s
//! since templates here are registered once and live for the runtime's lifetime
//! rather than being re-borrowed from a `'static` codegen output.

use crate::ids::TemplateId;
use fxhash::FxHashMap;

/// Discriminant returned by [`Template::kind`], since `TNode` itself carries payload
/// that callers outside this module shouldn't need to pattern-match directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TNodeKind {
    Element,
    Text,
    DynamicText,
    DynamicAttr,
    Dynamic,
    StaticAttr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrValueKind {
    Text,
    Bool,
    Int,
    None,
    Event,
}

#[derive(Clone, Debug)]
pub enum TNode {
    Element {
        tag: u16,
        children: Vec<usize>,
        attrs: Vec<usize>,
    },
    Text(String),
    /// A dynamic text child; addressed by its own path (it's a real node position),
    /// filled per-render from the VNode's dynamic-text vector at `slot`.
    DynamicText(usize),
    /// An attribute binding on the owning element; addressed via the *element's*
    /// path, since `SetAttribute` targets the element, not a standalone node.
    DynamicAttr { slot: usize, name: String, ns: u8 },
    /// An arbitrary dynamic child (text or placeholder supplied at render time);
    /// addressed by its own path.
    Dynamic(usize),
    StaticAttr { name: String, value: String, ns: u8 },
}

impl TNode {
    fn kind(&self) -> TNodeKind {
        match self {
            TNode::Element { .. } => TNodeKind::Element,
            TNode::Text(_) => TNodeKind::Text,
            TNode::DynamicText(_) => TNodeKind::DynamicText,
            TNode::DynamicAttr { .. } => TNodeKind::DynamicAttr,
            TNode::Dynamic(_) => TNodeKind::Dynamic,
            TNode::StaticAttr { .. } => TNodeKind::StaticAttr,
        }
    }
}

/// An immutable template tree plus its registration-order root list.
#[derive(Clone, Debug, Default)]
pub struct Template {
    nodes: Vec<TNode>,
    /// Parent node index for every node (including attrs), `None` for roots.
    parent: Vec<Option<usize>>,
    roots: Vec<usize>,
}

impl Template {
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn root_index(&self, i: usize) -> usize {
        self.roots[i]
    }

    pub fn kind(&self, ix: usize) -> TNodeKind {
        self.nodes[ix].kind()
    }

    pub fn tag(&self, ix: usize) -> u16 {
        match &self.nodes[ix] {
            TNode::Element { tag, .. } => *tag,
            other => panic!("tag() called on non-element node {:?}", other.kind()),
        }
    }

    pub fn child_count(&self, ix: usize) -> usize {
        match &self.nodes[ix] {
            TNode::Element { children, .. } => children.len(),
            _ => 0,
        }
    }

    pub fn child_at(&self, ix: usize, j: usize) -> usize {
        match &self.nodes[ix] {
            TNode::Element { children, .. } => children[j],
            other => panic!("child_at() called on non-element node {:?}", other.kind()),
        }
    }

    pub fn attr_count(&self, ix: usize) -> usize {
        match &self.nodes[ix] {
            TNode::Element { attrs, .. } => attrs.len(),
            _ => 0,
        }
    }

    pub fn attr_at(&self, ix: usize, j: usize) -> usize {
        match &self.nodes[ix] {
            TNode::Element { attrs, .. } => attrs[j],
            other => panic!("attr_at() called on non-element node {:?}", other.kind()),
        }
    }

    pub fn node(&self, ix: usize) -> &TNode {
        &self.nodes[ix]
    }

    pub fn dynamic_slot(&self, ix: usize) -> usize {
        match &self.nodes[ix] {
            TNode::DynamicText(slot) | TNode::Dynamic(slot) => *slot,
            TNode::DynamicAttr { slot, .. } => *slot,
            other => panic!("dynamic_slot() called on {:?}", other.kind()),
        }
    }

    /// Child-index path from the containing root down to `ix`, addressing the node
    /// itself. Used by `CreateEngine` for `DynamicText`/`Dynamic` slots.
    pub fn path_to(&self, ix: usize) -> Vec<u8> {
        self.path_to_parent_chain(ix, false)
    }

    /// Path to `ix`'s owning element, used for `DynamicAttr` slots, which are
    /// addressed through the element that carries them rather than as a node in
    /// their own right.
    pub fn path_to_owning_element(&self, ix: usize) -> Vec<u8> {
        let parent = self.parent[ix].expect("attribute node must have a parent element");
        self.path_to_parent_chain(parent, false)
    }

    /// Namespace and name of the `DynamicAttr` node carrying `slot`, used by the
    /// diff engine to emit `SetAttribute`/event-listener ops without re-walking
    /// the whole tree.
    pub fn attr_slot_meta(&self, slot: usize) -> (u8, &str) {
        for node in &self.nodes {
            if let TNode::DynamicAttr { slot: s, name, ns } = node {
                if *s == slot {
                    return (*ns, name);
                }
            }
        }
        panic!("no DynamicAttr node for slot {slot}");
    }

    fn path_to_parent_chain(&self, mut ix: usize, _unused: bool) -> Vec<u8> {
        let mut rev = Vec::new();
        while let Some(parent) = self.parent[ix] {
            let children = match &self.nodes[parent] {
                TNode::Element { children, .. } => children,
                _ => unreachable!("only elements can be parents of path-addressed nodes"),
            };
            let pos = children
                .iter()
                .position(|&c| c == ix)
                .expect("node missing from its recorded parent's child list");
            assert!(pos <= u8::MAX as usize, "template child fan-out exceeds 255");
            rev.push(pos as u8);
            ix = parent;
        }
        rev.reverse();
        rev
    }
}

/// Builds a [`Template`] bottom-up: children before the element that contains them.
#[derive(Default)]
pub struct TemplateBuilder {
    nodes: Vec<TNode>,
    parent: Vec<Option<usize>>,
    roots: Vec<usize>,
}

impl TemplateBuilder {
    fn push(&mut self, node: TNode, parent: Option<usize>) -> usize {
        let ix = self.nodes.len();
        self.nodes.push(node);
        self.parent.push(parent);
        ix
    }

    pub fn text(&mut self, literal: impl Into<String>) -> usize {
        self.push(TNode::Text(literal.into()), None)
    }

    pub fn dynamic_text(&mut self, slot: usize) -> usize {
        self.push(TNode::DynamicText(slot), None)
    }

    pub fn dynamic(&mut self, slot: usize) -> usize {
        self.push(TNode::Dynamic(slot), None)
    }

    pub fn static_attr(&mut self, name: impl Into<String>, value: impl Into<String>, ns: u8) -> usize {
        self.push(
            TNode::StaticAttr {
                name: name.into(),
                value: value.into(),
                ns,
            },
            None,
        )
    }

    pub fn dynamic_attr(&mut self, slot: usize, name: impl Into<String>, ns: u8) -> usize {
        self.push(
            TNode::DynamicAttr {
                slot,
                name: name.into(),
                ns,
            },
            None,
        )
    }

    /// Wraps already-built child/attr node indices into an element, fixing up their
    /// parent pointers.
    pub fn element(&mut self, tag: u16, children: Vec<usize>, attrs: Vec<usize>) -> usize {
        let ix = self.nodes.len();
        for &c in &children {
            self.parent[c] = Some(ix);
        }
        for &a in &attrs {
            self.parent[a] = Some(ix);
        }
        self.nodes.push(TNode::Element {
            tag,
            children,
            attrs,
        });
        self.parent.push(None);
        ix
    }

    pub fn root(&mut self, ix: usize) -> &mut Self {
        self.roots.push(ix);
        self
    }

    pub fn finish(self) -> Template {
        Template {
            nodes: self.nodes,
            parent: self.parent,
            roots: self.roots,
        }
    }
}

/// Registry of immutable templates addressed by [`TemplateId`].
#[derive(Default)]
pub struct TemplateRegistry {
    templates: FxHashMap<u32, Template>,
    next_id: u32,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: Template) -> TemplateId {
        let id = self.next_id;
        self.next_id += 1;
        self.templates.insert(id, template);
        TemplateId(id)
    }

    pub fn register_with_id(
        &mut self,
        id: TemplateId,
        template: Template,
    ) -> crate::error::Result<()> {
        if self.templates.contains_key(&id.0) {
            return Err(crate::error::RuntimeError::TemplateAlreadyRegistered(id));
        }
        self.templates.insert(id.0, template);
        self.next_id = self.next_id.max(id.0 + 1);
        Ok(())
    }

    pub fn get(&self, id: TemplateId) -> &Template {
        &self.templates[&id.0]
    }

    pub fn contains(&self, id: TemplateId) -> bool {
        self.templates.contains_key(&id.0)
    }

    pub fn count(&self) -> usize {
        self.templates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_template() -> Template {
        let mut b = Template::builder();
        let text = b.dynamic_text(0);
        let span = b.element(1, vec![text], vec![]);
        let plus_click = b.dynamic_attr(0, "click", 0);
        let plus = b.element(12, vec![], vec![plus_click]);
        let minus_click = b.dynamic_attr(1, "click", 0);
        let minus = b.element(12, vec![], vec![minus_click]);
        let div = b.element(0, vec![span, plus, minus], vec![]);
        b.root(div);
        b.finish()
    }

    #[test]
    fn path_to_dynamic_text_child() {
        let tmpl = counter_template();
        let div = tmpl.root_index(0);
        let span = tmpl.child_at(div, 0);
        let text = tmpl.child_at(span, 0);
        assert_eq!(tmpl.path_to(text), vec![0, 0]);
    }

    #[test]
    fn path_to_owning_element_for_dynamic_attr() {
        let tmpl = counter_template();
        let div = tmpl.root_index(0);
        let plus = tmpl.child_at(div, 1);
        let attr_ix = tmpl.attr_at(plus, 0);
        assert_eq!(tmpl.path_to_owning_element(attr_ix), vec![1]);
    }

    #[test]
    fn registry_dedups_explicit_ids() {
        let mut registry = TemplateRegistry::new();
        let id = TemplateId(7);
        registry.register_with_id(id, counter_template()).unwrap();
        let err = registry.register_with_id(id, counter_template()).unwrap_err();
        assert_eq!(err, crate::error::RuntimeError::TemplateAlreadyRegistered(id));
    }
}
