//! End-to-end exercises of the full mount/diff/dispatch pipeline through the public
//! `ComponentContext` facade and the bare `CreateEngine`, matching the literal
//! scenarios a host embedding this runtime needs to behave correctly end to end.

use reactive_ui_core::{
    ComponentContext, CreateEngine, ElementIdAllocator, MutationReader, MutationWriter, Opcode,
    SignalValue, Template, TemplateRegistry,
};

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

fn decode(buf: &[u8]) -> Vec<Opcode> {
    let mut reader = MutationReader::new(buf);
    std::iter::from_fn(|| reader.next().transpose())
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

/// Counter mount + 3 increments, then a single-`SetText` diff.
#[test]
fn counter_mount_three_increments_then_single_set_text_diff() {
    let mut ctx = ComponentContext::new();
    let tid = ctx.register_template(counter_template(), "counter");

    let vref = ctx.vnode_builder().push_template_ref(tid, None);
    ctx.vnode_builder().push_dynamic_text_node(vref, "Count: 0");
    ctx.vnode_builder().push_dynamic_attr_event(vref, 0);
    ctx.vnode_builder().push_dynamic_attr_event(vref, 1);

    let count = ctx.create_signal(SignalValue::Int(0));
    let add = ctx.on_click_add(count, 1);

    let mut mount_buf = [0u8; 1024];
    let writer = MutationWriter::new(&mut mount_buf);
    let n = ctx.mount(writer, vref).unwrap();
    let ops = decode(&mount_buf[..n]);

    assert!(matches!(ops[0], Opcode::LoadTemplate { .. }));
    assert!(ops
        .iter()
        .any(|op| matches!(op, Opcode::SetText { text, .. } if text == "Count: 0")));
    assert_eq!(
        ops.iter().filter(|op| matches!(op, Opcode::NewEventListener { .. })).count(),
        2
    );
    assert!(ops
        .iter()
        .any(|op| matches!(op, Opcode::AppendChildren { id: 0, .. })));

    for _ in 0..3 {
        ctx.dispatch_event(add, "click").unwrap();
    }
    assert_eq!(ctx.runtime.signals.peek(count).as_int(), Some(3));

    let vref2 = ctx.vnode_builder().push_template_ref(tid, None);
    ctx.vnode_builder().push_dynamic_text_node(vref2, "Count: 3");
    ctx.vnode_builder().push_dynamic_attr_event(vref2, 0);
    ctx.vnode_builder().push_dynamic_attr_event(vref2, 1);

    let mut diff_buf = [0u8; 256];
    let writer = MutationWriter::new(&mut diff_buf);
    let n = ctx.flush(writer, vref2).unwrap();
    let ops = decode(&diff_buf[..n]);
    assert_eq!(ops.len(), 1, "an unchanged template ref diffs to exactly one SetText");
    assert!(matches!(&ops[0], Opcode::SetText { text, .. } if text == "Count: 3"));
}

/// Placeholder template: `<div><!--ph--></div>` filled with a dynamic text child.
#[test]
fn placeholder_child_create_emits_replace_placeholder_then_append() {
    let mut registry = TemplateRegistry::new();
    let template = {
        let mut b = Template::builder();
        let ph = b.dynamic(0);
        let div = b.element(0, vec![ph], vec![]);
        b.root(div);
        b.finish()
    };
    let tid = registry.register(template);

    let mut alloc = ElementIdAllocator::new();
    let mut store = reactive_ui_core::VNodeStore::new();
    let vref = store.push_template_ref(tid, None);
    store.push_dynamic_node_text(vref, "hello");

    let mut buf = [0u8; 256];
    let mut writer = MutationWriter::new(&mut buf);
    let roots = CreateEngine::create(&mut writer, &mut alloc, &registry, &mut store, vref).unwrap();
    assert_eq!(roots, 1);
    let n = writer.finalize().unwrap();
    let ops = decode(&buf[..n]);

    assert!(matches!(ops[0], Opcode::LoadTemplate { .. }));
    assert!(ops.iter().any(|op| matches!(op, Opcode::CreateTextNode { text, .. } if text == "hello")));
    assert!(ops
        .iter()
        .any(|op| matches!(op, Opcode::ReplacePlaceholder { path, m: 1 } if path.as_slice() == [0])));
}
