//! Drives a real [`Interpreter`] against the [`VecDom`] test fake end to end,
//! covering the mount/diff scenarios that actually touch a consumer-side tree
//! rather than just the emitted opcode shape (already covered on the core side).

use reactive_ui_core::{
    ComponentContext, MutationWriter, SignalValue, Template,
};
use reactive_ui_interpreter::test_util::{NodeKind, VecDom};
use reactive_ui_interpreter::Interpreter;

fn counter_template() -> Template {
    let mut b = Template::builder();
    let text = b.dynamic_text(0);
    let span = b.element(1, vec![text], vec![]);
    let plus_click = b.dynamic_attr(0, "click", 0);
    let plus = b.element(12, vec![], vec![plus_click]);
    let div = b.element(0, vec![span, plus], vec![]);
    b.root(div);
    b.finish()
}

#[test]
fn counter_mounts_then_updates_text_in_the_fake_dom() {
    let mut ctx = ComponentContext::new();
    let tid = ctx.register_template(counter_template(), "counter");
    let mut interp = Interpreter::new(VecDom::new());
    interp.register_template(tid, ctx.runtime.templates.get(tid));

    let vref = ctx.vnode_builder().push_template_ref(tid, None);
    ctx.vnode_builder().push_dynamic_text_node(vref, "Count: 0");
    let count = ctx.create_signal(SignalValue::Int(0));
    let add = ctx.on_click_add(count, 1);
    ctx.vnode_builder().push_dynamic_attr_event(vref, add);

    let mut buf = [0u8; 1024];
    let writer = MutationWriter::new(&mut buf);
    let n = ctx.mount(writer, vref).unwrap();
    interp.apply(&buf[..n]).unwrap();

    let dom = interp.sink();
    let root_children = dom.root_children();
    assert_eq!(root_children.len(), 1, "one root div appended under the mount root");
    let div = root_children[0];
    assert_eq!(dom.tag_of(div), 0);
    let span = dom.children_of(div)[0];
    assert_eq!(dom.tag_of(span), 1);
    let text_node = dom.children_of(span)[0];
    assert_eq!(dom.text_of(text_node), "Count: 0");
    let plus = dom.children_of(div)[1];
    assert!(dom.has_listener(plus, "click"));

    ctx.dispatch_event(add, "click").unwrap();
    ctx.dispatch_event(add, "click").unwrap();
    ctx.dispatch_event(add, "click").unwrap();
    assert_eq!(ctx.runtime.signals.peek(count).as_int(), Some(3));

    let vref2 = ctx.vnode_builder().push_template_ref(tid, None);
    ctx.vnode_builder().push_dynamic_text_node(vref2, "Count: 3");
    ctx.vnode_builder().push_dynamic_attr_event(vref2, add);

    let mut buf2 = [0u8; 256];
    let writer = MutationWriter::new(&mut buf2);
    let n = ctx.flush(writer, vref2).unwrap();
    interp.apply(&buf2[..n]).unwrap();

    let dom = interp.sink();
    assert_eq!(dom.text_of(text_node), "Count: 3");
}

#[test]
fn placeholder_child_replacement_leaves_a_single_text_node() {
    let mut ctx = ComponentContext::new();
    let template = {
        let mut b = Template::builder();
        let ph = b.dynamic(0);
        let div = b.element(0, vec![ph], vec![]);
        b.root(div);
        b.finish()
    };
    let tid = ctx.register_template(template, "placeholder_child");
    let mut interp = Interpreter::new(VecDom::new());
    interp.register_template(tid, ctx.runtime.templates.get(tid));

    let vref = ctx.vnode_builder().push_template_ref(tid, None);
    ctx.vnode_builder().push_dynamic_node_text(vref, "hello");

    let mut buf = [0u8; 256];
    let writer = MutationWriter::new(&mut buf);
    let n = ctx.mount(writer, vref).unwrap();
    interp.apply(&buf[..n]).unwrap();

    let dom = interp.sink();
    let div = dom.root_children()[0];
    let children = dom.children_of(div);
    assert_eq!(children.len(), 1, "the placeholder was replaced in place, not appended alongside");
    assert!(matches!(dom.kind_of(children[0]), NodeKind::Text(s) if s == "hello"));
}
