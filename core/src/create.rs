//! Walks a fresh VNode, allocates element ids, and emits the mutations that
//! instantiate and mount it (spec §4.10).
//!
//! Two-pass per template root, per the spec's explicit contract: a first DFS pass
//! assigns every dynamic slot an `ElementId` (reusing the root's own `LoadTemplate`
//! id when a slot sits at the root itself, e.g. a dynamic attribute on the
//! outermost element), then a second pass emits the slot-specific fill opcodes.
//! This mirrors the create half of `dioxus-core`'s `DiffMachine`, minus its bump
//! arena — ids and paths here come from plain `Vec`s since nodes own their data.

use crate::element::ElementIdAllocator;
use crate::error::Result;
use crate::ids::ElementId;
use crate::protocol::MutationWriter;
use crate::template::{TNodeKind, Template, TemplateRegistry};
use crate::vnode::{AttributeValue, DynamicNode, VNodeIx, VNodeStore};
use fxhash::FxHashMap;

pub struct CreateEngine;

impl CreateEngine {
    /// Creates `vnode_ix` in `store`, writing mutation bytes into `writer` and
    /// returning the number of DOM roots produced.
    pub fn create(
        writer: &mut MutationWriter,
        alloc: &mut ElementIdAllocator,
        registry: &TemplateRegistry,
        store: &mut VNodeStore,
        vnode_ix: VNodeIx,
    ) -> Result<usize> {
        if let Some(text) = store.is_text(vnode_ix).map(str::to_owned) {
            let id = alloc.allocate();
            writer.create_text_node(id.0, &text)?;
            store.set_root_ids(vnode_ix, vec![id]);
            return Ok(1);
        }

        if store.is_placeholder(vnode_ix) {
            let id = alloc.allocate();
            writer.create_placeholder(id.0)?;
            store.set_root_ids(vnode_ix, vec![id]);
            return Ok(1);
        }

        if let Some(fragment_children) = store.fragment_children(vnode_ix).map(|c| c.to_vec()) {
            let mut total = 0;
            for child in fragment_children {
                total += Self::create(writer, alloc, registry, store, child)?;
            }
            return Ok(total);
        }

        let (template_id, dyn_text, dyn_attr, dyn_node, _key) = store
            .template_ref(vnode_ix)
            .map(|(t, dt, da, dn, k)| (t, dt.to_vec(), da.to_vec(), dn.to_vec(), k.map(str::to_owned)))
            .expect("vnode must be text, placeholder, fragment, or template ref");

        let template = registry.get(template_id);
        let mut root_ids = Vec::with_capacity(template.root_count());
        let mut dyn_text_ids = vec![ElementId::default(); dyn_text.len()];
        let mut dyn_attr_ids = vec![ElementId::default(); dyn_attr.len()];
        let mut dyn_node_ids = vec![ElementId::default(); dyn_node.len()];

        for r in 0..template.root_count() {
            let root_node = template.root_index(r);
            let root_id = alloc.allocate();
            writer.load_template(template_id.0, r as u32, root_id.0)?;
            root_ids.push(root_id);

            let mut element_ids: FxHashMap<usize, ElementId> = FxHashMap::default();
            element_ids.insert(root_node, root_id);

            assign_pass(
                template,
                root_node,
                root_id,
                writer,
                alloc,
                &mut element_ids,
                &mut dyn_text_ids,
                &mut dyn_attr_ids,
                &mut dyn_node_ids,
            )?;

            fill_pass(
                template,
                root_node,
                writer,
                alloc,
                &dyn_text,
                &dyn_attr,
                &dyn_node,
                &dyn_text_ids,
                &dyn_attr_ids,
                &mut dyn_node_ids,
            )?;
        }

        store.set_root_ids(vnode_ix, root_ids.clone());
        store.set_dyn_text_ids(vnode_ix, dyn_text_ids);
        store.set_dyn_attr_ids(vnode_ix, dyn_attr_ids);
        store.set_dyn_node_ids(vnode_ix, dyn_node_ids);
        Ok(root_ids.len())
    }
}

#[allow(clippy::too_many_arguments)]
fn assign_pass(
    template: &Template,
    node_ix: usize,
    root_id: ElementId,
    writer: &mut MutationWriter,
    alloc: &mut ElementIdAllocator,
    element_ids: &mut FxHashMap<usize, ElementId>,
    dyn_text_ids: &mut [ElementId],
    dyn_attr_ids: &mut [ElementId],
    dyn_node_ids: &mut [ElementId],
) -> Result<()> {
    match template.kind(node_ix) {
        TNodeKind::Element => {
            let has_dynamic_attr = (0..template.attr_count(node_ix))
                .any(|j| template.kind(template.attr_at(node_ix, j)) == TNodeKind::DynamicAttr);
            let has_dynamic_text_child = (0..template.child_count(node_ix))
                .any(|j| template.kind(template.child_at(node_ix, j)) == TNodeKind::DynamicText);
            if (has_dynamic_attr || has_dynamic_text_child) && !element_ids.contains_key(&node_ix) {
                let path = template.path_to(node_ix);
                let id = if path.is_empty() {
                    root_id
                } else {
                    let id = alloc.allocate();
                    writer.assign_id(&path, id.0)?;
                    id
                };
                element_ids.insert(node_ix, id);
            }
            if let Some(&owner_id) = element_ids.get(&node_ix) {
                for j in 0..template.attr_count(node_ix) {
                    let attr_ix = template.attr_at(node_ix, j);
                    if template.kind(attr_ix) == TNodeKind::DynamicAttr {
                        let slot = template.dynamic_slot(attr_ix);
                        dyn_attr_ids[slot] = owner_id;
                    }
                }
                for j in 0..template.child_count(node_ix) {
                    let child = template.child_at(node_ix, j);
                    if template.kind(child) == TNodeKind::DynamicText {
                        let slot = template.dynamic_slot(child);
                        dyn_text_ids[slot] = owner_id;
                    }
                }
            }
            for j in 0..template.child_count(node_ix) {
                let child = template.child_at(node_ix, j);
                assign_pass(
                    template,
                    child,
                    root_id,
                    writer,
                    alloc,
                    element_ids,
                    dyn_text_ids,
                    dyn_attr_ids,
                    dyn_node_ids,
                )?;
            }
        }
        // `DynamicText`'s id is its owning element's id, assigned above when the
        // parent `Element` arm was visited.
        TNodeKind::DynamicText => {}
        // `Dynamic` slots get no id here: whatever is currently at this template
        // position is about to be replaced wholesale in the fill pass, so assigning
        // it an id would just be immediately invalidated (see scenario 7, which
        // emits no `AssignId` for a bare dynamic child at all).
        TNodeKind::Dynamic => {}
        TNodeKind::Text | TNodeKind::StaticAttr | TNodeKind::DynamicAttr => {}
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn fill_pass(
    template: &Template,
    node_ix: usize,
    writer: &mut MutationWriter,
    alloc: &mut ElementIdAllocator,
    dyn_text: &[String],
    dyn_attr: &[AttributeValue],
    dyn_node: &[DynamicNode],
    dyn_text_ids: &[ElementId],
    dyn_attr_ids: &[ElementId],
    dyn_node_ids: &mut [ElementId],
) -> Result<()> {
    match template.kind(node_ix) {
        TNodeKind::Element => {
            for j in 0..template.attr_count(node_ix) {
                let attr_ix = template.attr_at(node_ix, j);
                if let TNodeKind::DynamicAttr = template.kind(attr_ix) {
                    let slot = template.dynamic_slot(attr_ix);
                    let (ns, name) = match template.node(attr_ix) {
                        crate::template::TNode::DynamicAttr { ns, name, .. } => (*ns, name.clone()),
                        _ => unreachable!(),
                    };
                    let id = dyn_attr_ids[slot];
                    emit_attr(writer, id.0, ns, &name, &dyn_attr[slot])?;
                }
            }
            for j in 0..template.child_count(node_ix) {
                let child = template.child_at(node_ix, j);
                fill_pass(
                    template,
                    child,
                    writer,
                    alloc,
                    dyn_text,
                    dyn_attr,
                    dyn_node,
                    dyn_text_ids,
                    dyn_attr_ids,
                    &mut *dyn_node_ids,
                )?;
            }
        }
        TNodeKind::DynamicText => {
            let slot = template.dynamic_slot(node_ix);
            let id = dyn_text_ids[slot];
            writer.set_text(id.0, &dyn_text[slot])?;
        }
        TNodeKind::Dynamic => {
            let slot = template.dynamic_slot(node_ix);
            let path = template.path_to(node_ix);
            let child_id = match &dyn_node[slot] {
                DynamicNode::Text(text) => {
                    let child_id = alloc.allocate();
                    writer.create_text_node(child_id.0, text)?;
                    writer.replace_placeholder(&path, 1)?;
                    child_id
                }
                DynamicNode::Placeholder => {
                    let child_id = alloc.allocate();
                    writer.create_placeholder(child_id.0)?;
                    writer.replace_placeholder(&path, 1)?;
                    child_id
                }
            };
            dyn_node_ids[slot] = child_id;
        }
        TNodeKind::Text | TNodeKind::StaticAttr | TNodeKind::DynamicAttr => {}
    }
    Ok(())
}

/// Emits the opcode(s) that give `id`'s attribute/listener named `name` the
/// value `value`. Shared with [`crate::diff::DiffEngine`] so both engines agree
/// on encoding (spec §9's "bool/none encoding is emitter-defined" open question).
pub(crate) fn emit_attr(writer: &mut MutationWriter, id: u32, ns: u8, name: &str, value: &AttributeValue) -> Result<()> {
    match value {
        AttributeValue::Text(s) => writer.set_attribute(id, ns, name, s)?,
        AttributeValue::Int(n) => writer.set_attribute(id, ns, name, &n.to_string())?,
        AttributeValue::Bool(b) => writer.set_attribute(id, ns, name, if *b { "true" } else { "false" })?,
        AttributeValue::None => writer.set_attribute(id, ns, name, "")?,
        AttributeValue::Event(_handler) => writer.new_event_listener(id, name)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TemplateId;
    use crate::template::Template;

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
    fn counter_mount_emits_expected_opcode_shape() {
        let mut registry = TemplateRegistry::new();
        let tid = registry.register(counter_template());
        let mut alloc = ElementIdAllocator::new();
        let mut store = VNodeStore::new();
        let vref = store.push_template_ref(tid, None);
        store.push_dynamic_text_node(vref, "Count: 0");
        store.push_dynamic_attr_event(vref, 1);
        store.push_dynamic_attr_event(vref, 2);

        let mut buf = [0u8; 1024];
        let mut writer = MutationWriter::new(&mut buf);
        let roots = CreateEngine::create(&mut writer, &mut alloc, &registry, &mut store, vref).unwrap();
        assert_eq!(roots, 1);
        let n = writer.finalize().unwrap();

        let mut reader = crate::protocol::MutationReader::new(&buf[..n]);
        let ops: Vec<_> = std::iter::from_fn(|| reader.next().transpose())
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert!(matches!(ops[0], crate::protocol::Opcode::LoadTemplate { .. }));
        assert!(ops
            .iter()
            .any(|op| matches!(op, crate::protocol::Opcode::SetText { text, .. } if text == "Count: 0")));
        assert_eq!(
            ops.iter()
                .filter(|op| matches!(op, crate::protocol::Opcode::NewEventListener { .. }))
                .count(),
            2
        );
        assert_eq!(store.root_id_count(vref), 1);
    }

    #[test]
    fn dynamic_text_resolves_via_owning_element_not_its_own_position() {
        // span > dyntext0, span itself has no dynamic attrs: the AssignId path
        // recorded should be the span's path, not the text node's.
        let mut b = Template::builder();
        let text = b.dynamic_text(0);
        let span = b.element(1, vec![text], vec![]);
        b.root(span);
        let template = b.finish();

        let mut registry = TemplateRegistry::new();
        let tid = registry.register(template);
        let mut alloc = ElementIdAllocator::new();
        let mut store = VNodeStore::new();
        let vref = store.push_template_ref(tid, None);
        store.push_dynamic_text_node(vref, "hi");

        let mut buf = [0u8; 256];
        let mut writer = MutationWriter::new(&mut buf);
        CreateEngine::create(&mut writer, &mut alloc, &registry, &mut store, vref).unwrap();
        let n = writer.finalize().unwrap();
        let mut reader = crate::protocol::MutationReader::new(&buf[..n]);
        let ops: Vec<_> = std::iter::from_fn(|| reader.next().transpose())
            .collect::<Result<Vec<_>>>()
            .unwrap();

        // The span is the template root itself, so its own id is the LoadTemplate
        // id: no separate AssignId is needed for it.
        assert!(!ops.iter().any(|op| matches!(op, crate::protocol::Opcode::AssignId { .. })));
        assert!(ops
            .iter()
            .any(|op| matches!(op, crate::protocol::Opcode::SetText { text, .. } if text == "hi")));
    }

    #[test]
    fn dynamic_slot_emits_no_assign_id() {
        let mut b = Template::builder();
        let dyn_child = b.dynamic(0);
        let div = b.element(0, vec![dyn_child], vec![]);
        b.root(div);
        let template = b.finish();

        let mut registry = TemplateRegistry::new();
        let tid = registry.register(template);
        let mut alloc = ElementIdAllocator::new();
        let mut store = VNodeStore::new();
        let vref = store.push_template_ref(tid, None);
        store.push_dynamic_node_text(vref, "child");

        let mut buf = [0u8; 256];
        let mut writer = MutationWriter::new(&mut buf);
        CreateEngine::create(&mut writer, &mut alloc, &registry, &mut store, vref).unwrap();
        let n = writer.finalize().unwrap();
        let mut reader = crate::protocol::MutationReader::new(&buf[..n]);
        let ops: Vec<_> = std::iter::from_fn(|| reader.next().transpose())
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert!(!ops.iter().any(|op| matches!(op, crate::protocol::Opcode::AssignId { .. })));
        assert!(ops
            .iter()
            .any(|op| matches!(op, crate::protocol::Opcode::ReplacePlaceholder { m: 1, .. })));
        assert_eq!(store.get_dyn_node_id(vref, 0), ElementId(store.get_root_id(vref, 0).0 + 1));
    }
}
