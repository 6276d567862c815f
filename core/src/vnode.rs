//! Per-frame VNode arena (spec §4.8, §3).
//!
//! A `VNodeStore` holds exactly one render's worth of virtual nodes. The engines
//! (`CreateEngine`/`DiffEngine`) populate each node's mount state as they walk it;
//! [`crate::context::ComponentContext`] keeps the previously-mounted store alive
//! across a frame boundary so `DiffEngine` can read old mount state from one store
//! while writing new mount state into the other, then drops the old store once the
//! transfer is done — this is the systems-language stand-in for "VNodes live for
//! exactly one render then become garbage" (mount state, a handful of `ElementId`s,
//! is the only part of a VNode that survives).

use crate::ids::{ElementId, TemplateId};
use crate::template::AttrValueKind;

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Int(i64),
    Bool(bool),
    None,
    /// Handler id dispatched by the interpreter's event routing (spec §6).
    Event(u32),
}

impl AttributeValue {
    pub fn kind(&self) -> AttrValueKind {
        match self {
            AttributeValue::Text(_) => AttrValueKind::Text,
            AttributeValue::Int(_) => AttrValueKind::Int,
            AttributeValue::Bool(_) => AttrValueKind::Bool,
            AttributeValue::None => AttrValueKind::None,
            AttributeValue::Event(_) => AttrValueKind::Event,
        }
    }
}

#[derive(Clone, Debug)]
pub enum DynamicNode {
    Text(String),
    Placeholder,
}

#[derive(Clone, Debug)]
enum VNodeKind {
    Text(String),
    Placeholder,
    TemplateRef {
        template_id: TemplateId,
        dyn_text: Vec<String>,
        dyn_attr: Vec<AttributeValue>,
        dyn_node: Vec<DynamicNode>,
        optional_key: Option<String>,
    },
    Fragment(Vec<usize>),
}

#[derive(Clone, Debug, Default)]
struct MountState {
    root_ids: Vec<ElementId>,
    dyn_text_ids: Vec<ElementId>,
    dyn_attr_ids: Vec<ElementId>,
    dyn_node_ids: Vec<ElementId>,
    mounted: bool,
}

#[derive(Clone, Debug)]
struct VNodeRecord {
    kind: VNodeKind,
    mount: MountState,
}

/// A single render's VNode arena, built top-down via the `push_*` methods and then
/// handed to `CreateEngine` or `DiffEngine`.
#[derive(Default)]
pub struct VNodeStore {
    arena: Vec<VNodeRecord>,
}

pub type VNodeIx = usize;

/// Alias matching the data model's "VNode" terminology; a VNode is just an index
/// into its owning [`VNodeStore`], not a standalone handle.
pub type VNode = VNodeIx;

impl VNodeStore {
    pub fn new() -> Self {
        Self { arena: Vec::new() }
    }

    pub fn reset(&mut self) {
        self.arena.clear();
    }

    fn push(&mut self, kind: VNodeKind) -> VNodeIx {
        self.arena.push(VNodeRecord {
            kind,
            mount: MountState::default(),
        });
        self.arena.len() - 1
    }

    pub fn push_text(&mut self, content: impl Into<String>) -> VNodeIx {
        self.push(VNodeKind::Text(content.into()))
    }

    pub fn push_placeholder(&mut self) -> VNodeIx {
        self.push(VNodeKind::Placeholder)
    }

    pub fn push_template_ref(
        &mut self,
        template_id: TemplateId,
        optional_key: Option<String>,
    ) -> VNodeIx {
        self.push(VNodeKind::TemplateRef {
            template_id,
            dyn_text: Vec::new(),
            dyn_attr: Vec::new(),
            dyn_node: Vec::new(),
            optional_key,
        })
    }

    pub fn push_fragment(&mut self) -> VNodeIx {
        self.push(VNodeKind::Fragment(Vec::new()))
    }

    pub fn push_fragment_child(&mut self, fragment: VNodeIx, child: VNodeIx) {
        match &mut self.arena[fragment].kind {
            VNodeKind::Fragment(children) => children.push(child),
            other => panic!("push_fragment_child on non-fragment vnode {:?}", kind_name(other)),
        }
    }

    pub fn push_dynamic_text_node(&mut self, template_ref: VNodeIx, text: impl Into<String>) {
        self.dyn_text_mut(template_ref).push(text.into());
    }

    pub fn push_dynamic_placeholder(&mut self, template_ref: VNodeIx) {
        self.dyn_node_mut(template_ref).push(DynamicNode::Placeholder);
    }

    pub fn push_dynamic_node_text(&mut self, template_ref: VNodeIx, text: impl Into<String>) {
        self.dyn_node_mut(template_ref).push(DynamicNode::Text(text.into()));
    }

    pub fn push_dynamic_attr_text(&mut self, template_ref: VNodeIx, value: impl Into<String>) {
        self.dyn_attr_mut(template_ref)
            .push(AttributeValue::Text(value.into()));
    }

    pub fn push_dynamic_attr_bool(&mut self, template_ref: VNodeIx, value: bool) {
        self.dyn_attr_mut(template_ref).push(AttributeValue::Bool(value));
    }

    pub fn push_dynamic_attr_int(&mut self, template_ref: VNodeIx, value: i64) {
        self.dyn_attr_mut(template_ref).push(AttributeValue::Int(value));
    }

    pub fn push_dynamic_attr_none(&mut self, template_ref: VNodeIx) {
        self.dyn_attr_mut(template_ref).push(AttributeValue::None);
    }

    pub fn push_dynamic_attr_event(&mut self, template_ref: VNodeIx, handler_id: u32) {
        self.dyn_attr_mut(template_ref)
            .push(AttributeValue::Event(handler_id));
    }

    fn dyn_text_mut(&mut self, ix: VNodeIx) -> &mut Vec<String> {
        match &mut self.arena[ix].kind {
            VNodeKind::TemplateRef { dyn_text, .. } => dyn_text,
            other => panic!("dynamic text push on non-template-ref vnode {:?}", kind_name(other)),
        }
    }

    fn dyn_attr_mut(&mut self, ix: VNodeIx) -> &mut Vec<AttributeValue> {
        match &mut self.arena[ix].kind {
            VNodeKind::TemplateRef { dyn_attr, .. } => dyn_attr,
            other => panic!("dynamic attr push on non-template-ref vnode {:?}", kind_name(other)),
        }
    }

    fn dyn_node_mut(&mut self, ix: VNodeIx) -> &mut Vec<DynamicNode> {
        match &mut self.arena[ix].kind {
            VNodeKind::TemplateRef { dyn_node, .. } => dyn_node,
            other => panic!("dynamic node push on non-template-ref vnode {:?}", kind_name(other)),
        }
    }

    // --- read accessors used by the engines ---

    pub fn is_text(&self, ix: VNodeIx) -> Option<&str> {
        match &self.arena[ix].kind {
            VNodeKind::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_placeholder(&self, ix: VNodeIx) -> bool {
        matches!(self.arena[ix].kind, VNodeKind::Placeholder)
    }

    pub fn template_ref(
        &self,
        ix: VNodeIx,
    ) -> Option<(TemplateId, &[String], &[AttributeValue], &[DynamicNode], Option<&str>)> {
        match &self.arena[ix].kind {
            VNodeKind::TemplateRef {
                template_id,
                dyn_text,
                dyn_attr,
                dyn_node,
                optional_key,
            } => Some((
                *template_id,
                dyn_text,
                dyn_attr,
                dyn_node,
                optional_key.as_deref(),
            )),
            _ => None,
        }
    }

    pub fn fragment_children(&self, ix: VNodeIx) -> Option<&[VNodeIx]> {
        match &self.arena[ix].kind {
            VNodeKind::Fragment(children) => Some(children),
            _ => None,
        }
    }

    // --- mount state ---

    pub fn is_mounted(&self, ix: VNodeIx) -> bool {
        self.arena[ix].mount.mounted
    }

    pub fn root_id_count(&self, ix: VNodeIx) -> usize {
        self.arena[ix].mount.root_ids.len()
    }

    pub fn get_root_id(&self, ix: VNodeIx, i: usize) -> ElementId {
        self.arena[ix].mount.root_ids[i]
    }

    pub fn set_root_ids(&mut self, ix: VNodeIx, ids: Vec<ElementId>) {
        self.arena[ix].mount.root_ids = ids;
        self.arena[ix].mount.mounted = true;
    }

    pub fn get_dyn_text_id(&self, ix: VNodeIx, slot: usize) -> ElementId {
        self.arena[ix].mount.dyn_text_ids[slot]
    }

    pub fn set_dyn_text_ids(&mut self, ix: VNodeIx, ids: Vec<ElementId>) {
        self.arena[ix].mount.dyn_text_ids = ids;
    }

    pub fn get_dyn_attr_id(&self, ix: VNodeIx, slot: usize) -> ElementId {
        self.arena[ix].mount.dyn_attr_ids[slot]
    }

    pub fn set_dyn_attr_ids(&mut self, ix: VNodeIx, ids: Vec<ElementId>) {
        self.arena[ix].mount.dyn_attr_ids = ids;
    }

    pub fn get_dyn_node_id(&self, ix: VNodeIx, slot: usize) -> ElementId {
        self.arena[ix].mount.dyn_node_ids[slot]
    }

    pub fn set_dyn_node_ids(&mut self, ix: VNodeIx, ids: Vec<ElementId>) {
        self.arena[ix].mount.dyn_node_ids = ids;
    }

    /// Copies `old`'s full mount state onto `new` in this same store (used by
    /// `DiffEngine` for the common case where old and new vnodes live in the same
    /// arena generation).
    pub fn transfer_mount_state(&mut self, old: VNodeIx, new: VNodeIx) {
        let mount = self.arena[old].mount.clone();
        self.arena[new].mount = mount;
    }

    /// Same as [`Self::transfer_mount_state`] but `old` lives in a different store
    /// (the previous frame's), which is the shape `ComponentContext::diff` uses.
    pub fn adopt_mount_state_from(&mut self, new: VNodeIx, old_store: &VNodeStore, old: VNodeIx) {
        self.arena[new].mount = old_store.arena[old].mount.clone();
    }
}

fn kind_name(kind: &VNodeKind) -> &'static str {
    match kind {
        VNodeKind::Text(_) => "text",
        VNodeKind::Placeholder => "placeholder",
        VNodeKind::TemplateRef { .. } => "template_ref",
        VNodeKind::Fragment(_) => "fragment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_ref_accumulates_dynamic_slots_in_push_order() {
        let mut store = VNodeStore::new();
        let vref = store.push_template_ref(TemplateId(0), None);
        store.push_dynamic_text_node(vref, "Count: 0");
        store.push_dynamic_attr_event(vref, 1);
        store.push_dynamic_attr_event(vref, 2);
        let (_, text, attrs, _, _) = store.template_ref(vref).unwrap();
        assert_eq!(text, &["Count: 0".to_string()]);
        assert_eq!(attrs, &[AttributeValue::Event(1), AttributeValue::Event(2)]);
    }

    #[test]
    fn mount_state_transfers_across_stores() {
        let mut old_store = VNodeStore::new();
        let old = old_store.push_text("A");
        old_store.set_root_ids(old, vec![ElementId(3)]);

        let mut new_store = VNodeStore::new();
        let new = new_store.push_text("A");
        new_store.adopt_mount_state_from(new, &old_store, old);
        assert_eq!(new_store.get_root_id(new, 0), ElementId(3));
        assert!(new_store.is_mounted(new));
    }
}
