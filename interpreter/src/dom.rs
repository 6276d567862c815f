//! The consumer-side abstraction the interpreter drives (spec §4.12's "some concrete
//! target," left abstract here since an actual browser/DOM binding is out of scope).
//!
//! Mirrors the shape of `dioxus-core`'s `WriteMutations` trait: one method per
//! mutation primitive, each taking already-resolved node handles rather than ids, so
//! id bookkeeping stays entirely inside [`crate::interpreter::Interpreter`] and a
//! `DomSink` only has to know how to build and splice its own node type.

/// A live node handle in whatever tree `Self` maintains. Required to be cheaply
/// `Clone`, since the interpreter holds the same handle in both its id map and its
/// working stack simultaneously.
pub trait DomSink {
    type Node: Clone;

    /// The pre-existing container every mutation stream mounts into; bound to
    /// element id 0 before any opcode is applied.
    fn root(&self) -> Self::Node;

    fn create_element(&mut self, tag: u16) -> Self::Node;
    fn create_text(&mut self, text: &str) -> Self::Node;
    fn create_placeholder(&mut self) -> Self::Node;

    /// Deep-clones a template prototype node for a fresh `LoadTemplate`.
    fn clone_node(&mut self, node: &Self::Node) -> Self::Node;

    fn set_attribute(&mut self, node: &Self::Node, ns: u8, name: &str, value: &str);
    fn set_text(&mut self, node: &Self::Node, text: &str);

    fn append_child(&mut self, parent: &Self::Node, child: Self::Node);
    fn insert_after(&mut self, anchor: &Self::Node, node: Self::Node);
    fn insert_before(&mut self, anchor: &Self::Node, node: Self::Node);

    /// Replaces `old` with `new` in its current parent, in the order given, then
    /// discards `old`.
    fn replace(&mut self, old: &Self::Node, new: Vec<Self::Node>);
    fn remove(&mut self, node: &Self::Node);

    fn add_listener(&mut self, node: &Self::Node, name: &str);
    fn remove_listener(&mut self, node: &Self::Node, name: &str);

    /// Resolves the `index`th child of `node`, used to walk an `AssignId`/
    /// `ReplacePlaceholder` path relative to the last-pushed stack node.
    fn child_at(&self, node: &Self::Node, index: u8) -> Self::Node;
}
