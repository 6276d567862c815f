//! Applies a decoded mutation stream to a [`DomSink`] (spec §4.12).
//!
//! Owns the id -> node map (element id 0 pre-bound to `sink.root()`) and the working
//! node stack the create/diff engines' `m`-counted opcodes address by position.
//! Every opcode here is a direct translation of its emitter-side counterpart in
//! `reactive-ui-core`'s `CreateEngine`/`DiffEngine`; nothing here re-derives tree
//! shape, it only plays back what was already decided.

use fxhash::FxHashMap;
use reactive_ui_core::{MutationReader, Opcode, Template, TemplateId};

use crate::dom::DomSink;
use crate::error::{InterpreterError, Result};
use crate::template_cache::TemplateCache;

pub struct Interpreter<S: DomSink> {
    sink: S,
    templates: TemplateCache<S>,
    nodes: FxHashMap<u32, S::Node>,
    stack: Vec<S::Node>,
}

impl<S: DomSink> Interpreter<S> {
    pub fn new(sink: S) -> Self {
        let root = sink.root();
        let mut nodes = FxHashMap::default();
        nodes.insert(reactive_ui_core::ElementId::MOUNT_ROOT.0, root);
        Self {
            sink,
            templates: TemplateCache::new(),
            nodes,
            stack: Vec::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Builds and caches `template`'s static skeleton under `id`. Must happen before
    /// any `LoadTemplate` opcode referencing that id is applied.
    pub fn register_template(&mut self, id: TemplateId, template: &Template) {
        self.templates.build(&mut self.sink, id, template);
    }

    /// Decodes and applies every opcode in `buf` in order.
    pub fn apply(&mut self, buf: &[u8]) -> Result<()> {
        let mut reader = MutationReader::new(buf);
        while let Some(op) = reader.next()? {
            self.apply_one(op)?;
        }
        debug_assert!(self.stack.is_empty(), "mutation stream left {} node(s) on the stack", self.stack.len());
        Ok(())
    }

    fn get(&self, id: u32) -> Result<&S::Node> {
        self.nodes.get(&id).ok_or(InterpreterError::UnknownElementId(id))
    }

    fn pop_n(&mut self, n: usize, op: &'static str) -> Result<Vec<S::Node>> {
        if self.stack.len() < n {
            return Err(InterpreterError::StackUnderflow(op));
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    fn resolve_path(&self, root: &S::Node, path: &[u8]) -> S::Node {
        let mut node = root.clone();
        for &idx in path {
            node = self.sink.child_at(&node, idx);
        }
        node
    }

    fn apply_one(&mut self, op: Opcode) -> Result<()> {
        match op {
            Opcode::End => {}

            Opcode::LoadTemplate { tmpl_id, root_index, id } => {
                let node = self
                    .templates
                    .clone_root(&mut self.sink, TemplateId(tmpl_id), root_index as usize)?;
                self.stack.push(node.clone());
                self.nodes.insert(id, node);
            }

            Opcode::CreateTextNode { id, text } => {
                let node = self.sink.create_text(&text);
                self.stack.push(node.clone());
                self.nodes.insert(id, node);
            }

            Opcode::CreatePlaceholder { id } => {
                let node = self.sink.create_placeholder();
                self.stack.push(node.clone());
                self.nodes.insert(id, node);
            }

            Opcode::AssignId { path, id } => {
                let top = self
                    .stack
                    .last()
                    .ok_or(InterpreterError::StackUnderflow("AssignId"))?
                    .clone();
                let node = self.resolve_path(&top, &path);
                self.nodes.insert(id, node);
            }

            Opcode::AppendChildren { id, m } => {
                let children = self.pop_n(m as usize, "AppendChildren")?;
                let parent = self.get(id)?.clone();
                for child in children {
                    self.sink.append_child(&parent, child);
                }
            }

            Opcode::ReplaceWith { id, m } => {
                let news = self.pop_n(m as usize, "ReplaceWith")?;
                let old = self.get(id)?.clone();
                self.sink.replace(&old, news);
                self.nodes.remove(&id);
            }

            // News are popped before the placeholder is resolved: the placeholder's
            // path is relative to the stack top left *after* the replacement nodes
            // were produced, matching the create engine's fill-pass emission order.
            Opcode::ReplacePlaceholder { path, m } => {
                let news = self.pop_n(m as usize, "ReplacePlaceholder")?;
                let top = self
                    .stack
                    .last()
                    .ok_or(InterpreterError::StackUnderflow("ReplacePlaceholder"))?
                    .clone();
                let placeholder = self.resolve_path(&top, &path);
                self.sink.replace(&placeholder, news);
            }

            Opcode::InsertAfter { id, m } => {
                let news = self.pop_n(m as usize, "InsertAfter")?;
                let anchor = self.get(id)?.clone();
                for node in news.into_iter().rev() {
                    self.sink.insert_after(&anchor, node);
                }
            }

            Opcode::InsertBefore { id, m } => {
                let news = self.pop_n(m as usize, "InsertBefore")?;
                let anchor = self.get(id)?.clone();
                for node in news {
                    self.sink.insert_before(&anchor, node);
                }
            }

            Opcode::SetAttribute { id, ns, name, value } => {
                let node = self.get(id)?.clone();
                self.sink.set_attribute(&node, ns, &name, &value);
            }

            Opcode::SetText { id, text } => {
                let node = self.get(id)?.clone();
                self.sink.set_text(&node, &text);
            }

            Opcode::NewEventListener { id, name } => {
                let node = self.get(id)?.clone();
                self.sink.add_listener(&node, &name);
            }

            Opcode::RemoveEventListener { id, name } => {
                let node = self.get(id)?.clone();
                self.sink.remove_listener(&node, &name);
            }

            Opcode::Remove { id } => {
                let node = self.get(id)?.clone();
                self.sink.remove(&node);
                self.nodes.remove(&id);
            }

            Opcode::PushRoot { id } => {
                let node = self.get(id)?.clone();
                self.stack.push(node);
            }
        }
        Ok(())
    }
}
