//! Walks two compatible VNodes and emits the minimal mutations that turn the old
//! one into the new one (spec §4.11).
//!
//! Grounded on `dioxus-core`'s `DiffMachine`: kind mismatches fall back to a
//! create-then-`ReplaceWith`, same-kind pairs get a structural diff. As with
//! `CreateEngine`, `DiffEngine` never calls `writer.finalize()` itself — that is
//! the frame-level caller's job (`ComponentContext::flush`), so a diff can be one
//! step inside a larger buffer.

use crate::create::{emit_attr, CreateEngine};
use crate::element::ElementIdAllocator;
use crate::error::Result;
use crate::ids::ElementId;
use crate::protocol::MutationWriter;
use crate::template::TemplateRegistry;
use crate::vnode::{AttributeValue, DynamicNode, VNodeIx, VNodeStore};

pub struct DiffEngine;

#[derive(Clone, Copy, PartialEq, Eq)]
enum VnKind {
    Text,
    Placeholder,
    TemplateRef,
    Fragment,
}

fn classify(store: &VNodeStore, ix: VNodeIx) -> VnKind {
    if store.is_text(ix).is_some() {
        VnKind::Text
    } else if store.is_placeholder(ix) {
        VnKind::Placeholder
    } else if store.template_ref(ix).is_some() {
        VnKind::TemplateRef
    } else {
        VnKind::Fragment
    }
}

/// Flattens `ix`'s live root element ids, recursing through fragments (spec §3:
/// a fragment's "root_ids" are its children's, concatenated in order).
fn collect_root_ids(store: &VNodeStore, ix: VNodeIx) -> Vec<ElementId> {
    if let Some(children) = store.fragment_children(ix) {
        children.to_vec().iter().flat_map(|&c| collect_root_ids(store, c)).collect()
    } else {
        (0..store.root_id_count(ix)).map(|i| store.get_root_id(ix, i)).collect()
    }
}

impl DiffEngine {
    pub fn diff(
        writer: &mut MutationWriter,
        alloc: &mut ElementIdAllocator,
        registry: &TemplateRegistry,
        store: &mut VNodeStore,
        old_vn: VNodeIx,
        new_vn: VNodeIx,
    ) -> Result<()> {
        match (classify(store, old_vn), classify(store, new_vn)) {
            (VnKind::Text, VnKind::Text) => Self::diff_text(writer, store, old_vn, new_vn),
            (VnKind::Placeholder, VnKind::Placeholder) => {
                store.transfer_mount_state(old_vn, new_vn);
                Ok(())
            }
            (VnKind::TemplateRef, VnKind::TemplateRef) => {
                Self::diff_template_ref(writer, alloc, registry, store, old_vn, new_vn)
            }
            (VnKind::Fragment, VnKind::Fragment) => {
                Self::diff_fragment(writer, alloc, registry, store, old_vn, new_vn)
            }
            _ => Self::replace(writer, alloc, registry, store, old_vn, new_vn),
        }
    }

    fn diff_text(writer: &mut MutationWriter, store: &mut VNodeStore, old: VNodeIx, new: VNodeIx) -> Result<()> {
        store.transfer_mount_state(old, new);
        let old_text = store.is_text(old).expect("classified as Text").to_string();
        let new_text = store.is_text(new).expect("classified as Text").to_string();
        if old_text != new_text {
            let id = store.get_root_id(new, 0);
            writer.set_text(id.0, &new_text)?;
        }
        Ok(())
    }

    /// Kind mismatch, or same-kind `TemplateRef` with a different `TemplateId`:
    /// create the new tree fresh and splice it in over the old one's first root.
    fn replace(
        writer: &mut MutationWriter,
        alloc: &mut ElementIdAllocator,
        registry: &TemplateRegistry,
        store: &mut VNodeStore,
        old: VNodeIx,
        new: VNodeIx,
    ) -> Result<()> {
        let old_root_ids = collect_root_ids(store, old);
        let new_root_count = CreateEngine::create(writer, alloc, registry, store, new)?;
        let head = old_root_ids.first().copied().expect("replaced vnode must have had at least one root");
        writer.replace_with(head.0, new_root_count as u32)?;
        for id in old_root_ids {
            alloc.free(id);
        }
        Ok(())
    }

    fn diff_template_ref(
        writer: &mut MutationWriter,
        alloc: &mut ElementIdAllocator,
        registry: &TemplateRegistry,
        store: &mut VNodeStore,
        old: VNodeIx,
        new: VNodeIx,
    ) -> Result<()> {
        let (old_tid, old_text, old_attr, old_node, _) = store
            .template_ref(old)
            .map(|(t, dt, da, dn, k)| (t, dt.to_vec(), da.to_vec(), dn.to_vec(), k.map(str::to_owned)))
            .expect("classified as TemplateRef");
        let (new_tid, new_text, new_attr, new_node, _) = store
            .template_ref(new)
            .map(|(t, dt, da, dn, k)| (t, dt.to_vec(), da.to_vec(), dn.to_vec(), k.map(str::to_owned)))
            .expect("classified as TemplateRef");

        if old_tid != new_tid {
            return Self::replace(writer, alloc, registry, store, old, new);
        }

        store.transfer_mount_state(old, new);
        let template = registry.get(new_tid);

        for slot in 0..new_text.len() {
            if old_text[slot] != new_text[slot] {
                let id = store.get_dyn_text_id(new, slot);
                writer.set_text(id.0, &new_text[slot])?;
            }
        }

        for slot in 0..new_attr.len() {
            if old_attr[slot] != new_attr[slot] {
                let id = store.get_dyn_attr_id(new, slot);
                let (ns, name) = template.attr_slot_meta(slot);
                let name = name.to_string();
                Self::diff_attr(writer, id.0, ns, &name, &old_attr[slot], &new_attr[slot])?;
            }
        }

        let mut dyn_node_ids: Vec<ElementId> = (0..new_node.len()).map(|slot| store.get_dyn_node_id(new, slot)).collect();
        for slot in 0..new_node.len() {
            Self::diff_dynamic_node(writer, alloc, &mut dyn_node_ids, slot, &old_node[slot], &new_node[slot])?;
        }
        store.set_dyn_node_ids(new, dyn_node_ids);

        Ok(())
    }

    /// Already-known-unequal old/new attribute values for the same slot; emits
    /// the minimal listener/attribute ops for the transition (spec §4.11 item 4).
    fn diff_attr(
        writer: &mut MutationWriter,
        id: u32,
        ns: u8,
        name: &str,
        old_val: &AttributeValue,
        new_val: &AttributeValue,
    ) -> Result<()> {
        match (old_val, new_val) {
            (AttributeValue::Event(_), AttributeValue::Event(_)) => {
                writer.remove_event_listener(id, name)?;
                writer.new_event_listener(id, name)?;
            }
            (AttributeValue::Event(_), other) => {
                writer.remove_event_listener(id, name)?;
                emit_attr(writer, id, ns, name, other)?;
            }
            (_, AttributeValue::Event(_)) => {
                writer.new_event_listener(id, name)?;
            }
            (_, new_other) => {
                emit_attr(writer, id, ns, name, new_other)?;
            }
        }
        Ok(())
    }

    /// A bare dynamic child only ever holds `Text` or `Placeholder` content in
    /// this data model (spec §3's "arbitrary child node (text or placeholder)"),
    /// so diffing it reduces to: same shape → update/no-op, different shape →
    /// create the new content and `ReplaceWith` the old element id.
    fn diff_dynamic_node(
        writer: &mut MutationWriter,
        alloc: &mut ElementIdAllocator,
        dyn_node_ids: &mut [ElementId],
        slot: usize,
        old: &DynamicNode,
        new: &DynamicNode,
    ) -> Result<()> {
        let id = dyn_node_ids[slot];
        match (old, new) {
            (DynamicNode::Text(a), DynamicNode::Text(b)) => {
                if a != b {
                    writer.set_text(id.0, b)?;
                }
            }
            (DynamicNode::Placeholder, DynamicNode::Placeholder) => {}
            (DynamicNode::Text(_), DynamicNode::Placeholder) => {
                let new_id = alloc.allocate();
                writer.create_placeholder(new_id.0)?;
                writer.replace_with(id.0, 1)?;
                alloc.free(id);
                dyn_node_ids[slot] = new_id;
            }
            (DynamicNode::Placeholder, DynamicNode::Text(text)) => {
                let new_id = alloc.allocate();
                writer.create_text_node(new_id.0, text)?;
                writer.replace_with(id.0, 1)?;
                alloc.free(id);
                dyn_node_ids[slot] = new_id;
            }
        }
        Ok(())
    }

    /// Fragment children are paired positionally by default (spec §9); when both
    /// the old and new child at a position carry a key and the keys disagree, a
    /// single rescan of the not-yet-paired new children looks for a key match and
    /// pairs against that instead, so a reordered keyed child keeps its old
    /// ElementIds rather than being torn down and recreated. This is a pairing
    /// fast path only, not general list-move reconciliation: children outside the
    /// common prefix are still handled by plain remove/create-and-append.
    fn diff_fragment(
        writer: &mut MutationWriter,
        alloc: &mut ElementIdAllocator,
        registry: &TemplateRegistry,
        store: &mut VNodeStore,
        old: VNodeIx,
        new: VNodeIx,
    ) -> Result<()> {
        let old_children = store.fragment_children(old).expect("classified as Fragment").to_vec();
        let new_children = store.fragment_children(new).expect("classified as Fragment").to_vec();
        let common = old_children.len().min(new_children.len());

        let mut matched_new = vec![false; new_children.len()];
        let mut pairs: Vec<(VNodeIx, VNodeIx)> = Vec::with_capacity(common);

        for (i, &old_ix) in old_children.iter().enumerate().take(common) {
            let mut new_ix = new_children[i];
            let key_old = vnode_key(store, old_ix);
            let key_new = vnode_key(store, new_ix);
            if key_old.is_some() && key_new.is_some() && key_old != key_new {
                if let Some(j) = (0..new_children.len())
                    .find(|&j| !matched_new[j] && vnode_key(store, new_children[j]) == key_old)
                {
                    new_ix = new_children[j];
                    matched_new[j] = true;
                    pairs.push((old_ix, new_ix));
                    continue;
                }
            }
            matched_new[i] = true;
            pairs.push((old_ix, new_ix));
        }

        for (o, n) in &pairs {
            Self::diff(writer, alloc, registry, store, *o, *n)?;
        }

        if old_children.len() > new_children.len() {
            for &child in &old_children[common..] {
                for id in collect_root_ids(store, child) {
                    writer.remove(id.0)?;
                    alloc.free(id);
                }
            }
        }

        let pending_new: Vec<VNodeIx> = new_children
            .iter()
            .enumerate()
            .filter(|(j, _)| !matched_new[*j])
            .map(|(_, &c)| c)
            .collect();

        if !pending_new.is_empty() {
            let mut created_count = 0usize;
            for &child in &pending_new {
                created_count += CreateEngine::create(writer, alloc, registry, store, child)?;
            }
            if common > 0 {
                let anchor_ids = collect_root_ids(store, old_children[common - 1]);
                if let Some(&anchor) = anchor_ids.last() {
                    writer.insert_after(anchor.0, created_count as u32)?;
                }
            }
            // A fragment growing from zero children has no sibling root to anchor
            // on; the parent context needed to splice it in lives one level up
            // (ComponentContext's own AppendChildren), which is outside what a
            // bare fragment-to-fragment diff can resolve on its own.
        }

        Ok(())
    }
}

/// The pairing key for keyed-fragment reconciliation; only template-ref vnodes
/// carry one (spec §3's `optional_key`).
fn vnode_key(store: &VNodeStore, ix: VNodeIx) -> Option<String> {
    store.template_ref(ix).and_then(|(_, _, _, _, key)| key.map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TemplateId;

    #[test]
    fn diffing_equal_text_emits_nothing() {
        let mut alloc = ElementIdAllocator::new();
        let registry = TemplateRegistry::new();
        let mut store = VNodeStore::new();
        let old = store.push_text("same");
        store.set_root_ids(old, vec![alloc.allocate()]);
        let new = store.push_text("same");

        let mut buf = [0u8; 64];
        let mut writer = MutationWriter::new(&mut buf);
        DiffEngine::diff(&mut writer, &mut alloc, &registry, &mut store, old, new).unwrap();
        let n = writer.finalize().unwrap();
        let mut reader = crate::protocol::MutationReader::new(&buf[..n]);
        assert_eq!(reader.next().unwrap(), None, "idempotent diff emits only End");
    }

    #[test]
    fn diffing_changed_text_emits_set_text() {
        let mut alloc = ElementIdAllocator::new();
        let registry = TemplateRegistry::new();
        let mut store = VNodeStore::new();
        let old = store.push_text("Count: 0");
        store.set_root_ids(old, vec![alloc.allocate()]);
        let new = store.push_text("Count: 3");

        let mut buf = [0u8; 64];
        let mut writer = MutationWriter::new(&mut buf);
        DiffEngine::diff(&mut writer, &mut alloc, &registry, &mut store, old, new).unwrap();
        let n = writer.finalize().unwrap();
        let mut reader = crate::protocol::MutationReader::new(&buf[..n]);
        let ops: Vec<_> = std::iter::from_fn(|| reader.next().transpose()).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], crate::protocol::Opcode::SetText { text, .. } if text == "Count: 3"));
        assert_eq!(store.get_root_id(new, 0), store.get_root_id(old, 0));
    }

    #[test]
    fn fragment_removed_tail_emits_remove_per_extra_old_child() {
        let mut alloc = ElementIdAllocator::new();
        let registry = TemplateRegistry::new();
        let mut store = VNodeStore::new();

        let old_frag = store.push_fragment();
        for s in ["A", "B", "C"] {
            let t = store.push_text(s);
            store.set_root_ids(t, vec![alloc.allocate()]);
            store.push_fragment_child(old_frag, t);
        }

        let new_frag = store.push_fragment();
        let new_a = store.push_text("A");
        store.push_fragment_child(new_frag, new_a);

        let mut buf = [0u8; 256];
        let mut writer = MutationWriter::new(&mut buf);
        DiffEngine::diff(&mut writer, &mut alloc, &registry, &mut store, old_frag, new_frag).unwrap();
        let n = writer.finalize().unwrap();
        let mut reader = crate::protocol::MutationReader::new(&buf[..n]);
        let ops: Vec<_> = std::iter::from_fn(|| reader.next().transpose()).collect::<Result<Vec<_>>>().unwrap();
        let removes = ops.iter().filter(|op| matches!(op, crate::protocol::Opcode::Remove { .. })).count();
        assert_eq!(removes, 2);
    }

    #[test]
    fn fragment_added_tail_creates_then_inserts_after_remaining_root() {
        let mut alloc = ElementIdAllocator::new();
        let registry = TemplateRegistry::new();
        let mut store = VNodeStore::new();

        let old_frag = store.push_fragment();
        let old_a = store.push_text("A");
        store.set_root_ids(old_a, vec![alloc.allocate()]);
        store.push_fragment_child(old_frag, old_a);

        let new_frag = store.push_fragment();
        for s in ["A", "B", "C"] {
            let t = store.push_text(s);
            store.push_fragment_child(new_frag, t);
        }

        let mut buf = [0u8; 256];
        let mut writer = MutationWriter::new(&mut buf);
        DiffEngine::diff(&mut writer, &mut alloc, &registry, &mut store, old_frag, new_frag).unwrap();
        let n = writer.finalize().unwrap();
        let mut reader = crate::protocol::MutationReader::new(&buf[..n]);
        let ops: Vec<_> = std::iter::from_fn(|| reader.next().transpose()).collect::<Result<Vec<_>>>().unwrap();
        let creates = ops
            .iter()
            .filter(|op| matches!(op, crate::protocol::Opcode::CreateTextNode { .. }))
            .count();
        assert_eq!(creates, 2);
        assert!(matches!(
            ops.last(),
            Some(crate::protocol::Opcode::InsertAfter { m: 2, .. })
        ));
    }

    #[test]
    fn keyed_fragment_reorder_pairs_by_key_instead_of_position() {
        let mut alloc = ElementIdAllocator::new();
        let mut registry = TemplateRegistry::new();
        let tmpl = {
            let mut b = crate::template::Template::builder();
            let div = b.element(0, vec![], vec![]);
            b.root(div);
            b.finish()
        };
        let tid = registry.register_with_id(TemplateId(1), tmpl).map(|_| TemplateId(1)).unwrap();

        let push_keyed = |store: &mut VNodeStore, key: &str, id: ElementId| {
            let v = store.push_template_ref(tid, Some(key.to_string()));
            store.set_root_ids(v, vec![id]);
            v
        };

        let mut store = VNodeStore::new();
        let old_frag = store.push_fragment();
        let old_a = push_keyed(&mut store, "a", alloc.allocate());
        let old_b = push_keyed(&mut store, "b", alloc.allocate());
        store.push_fragment_child(old_frag, old_a);
        store.push_fragment_child(old_frag, old_b);
        let a_id = store.get_root_id(old_a, 0);
        let b_id = store.get_root_id(old_b, 0);

        // Swapped order: new position 0 carries key "b", position 1 carries "a".
        let new_frag = store.push_fragment();
        let new_b = store.push_template_ref(tid, Some("b".to_string()));
        let new_a = store.push_template_ref(tid, Some("a".to_string()));
        store.push_fragment_child(new_frag, new_b);
        store.push_fragment_child(new_frag, new_a);

        let mut buf = [0u8; 256];
        let mut writer = MutationWriter::new(&mut buf);
        DiffEngine::diff(&mut writer, &mut alloc, &registry, &mut store, old_frag, new_frag).unwrap();
        let n = writer.finalize().unwrap();
        let mut reader = crate::protocol::MutationReader::new(&buf[..n]);
        let ops: Vec<_> = std::iter::from_fn(|| reader.next().transpose()).collect::<Result<Vec<_>>>().unwrap();
        assert!(ops.is_empty(), "same templates, same attrs/text: a pure key-based reorder is a no-op diff");

        // The rescan pairing kept each key's original ElementId rather than
        // reassigning by position.
        assert_eq!(store.get_root_id(new_b, 0), b_id);
        assert_eq!(store.get_root_id(new_a, 0), a_id);
    }

    #[test]
    fn template_kind_swap_replaces_and_frees_old_root() {
        let mut alloc = ElementIdAllocator::new();
        let mut registry = TemplateRegistry::new();
        let old_tmpl = {
            let mut b = crate::template::Template::builder();
            let div = b.element(0, vec![], vec![]);
            b.root(div);
            b.finish()
        };
        let new_tmpl = {
            let mut b = crate::template::Template::builder();
            let span = b.element(1, vec![], vec![]);
            b.root(span);
            b.finish()
        };
        let old_tid = registry.register_with_id(TemplateId(7), old_tmpl).map(|_| TemplateId(7)).unwrap();
        let new_tid = registry.register_with_id(TemplateId(8), new_tmpl).map(|_| TemplateId(8)).unwrap();

        let mut store = VNodeStore::new();
        let old = store.push_template_ref(old_tid, None);
        let old_id = alloc.allocate();
        store.set_root_ids(old, vec![old_id]);

        let new = store.push_template_ref(new_tid, None);

        let mut buf = [0u8; 256];
        let mut writer = MutationWriter::new(&mut buf);
        DiffEngine::diff(&mut writer, &mut alloc, &registry, &mut store, old, new).unwrap();
        let n = writer.finalize().unwrap();
        let mut reader = crate::protocol::MutationReader::new(&buf[..n]);
        let ops: Vec<_> = std::iter::from_fn(|| reader.next().transpose()).collect::<Result<Vec<_>>>().unwrap();

        assert!(matches!(ops[0], crate::protocol::Opcode::LoadTemplate { tmpl_id: 8, .. }));
        assert!(matches!(
            ops.last(),
            Some(crate::protocol::Opcode::ReplaceWith { id, m: 1 }) if *id == old_id.0
        ));
    }
}
