//! Builds each registered template's static DOM skeleton once, so every
//! `LoadTemplate` opcode after the first is a clone rather than a fresh walk of the
//! template tree (spec §4.12, §9's "templates amortize the tree walk" note).

use fxhash::FxHashMap;
use reactive_ui_core::{TNode, TNodeKind, Template, TemplateId};

use crate::dom::DomSink;
use crate::error::{InterpreterError, Result};

pub struct TemplateCache<S: DomSink> {
    /// Prototype node per (template, root index); cloned on every `LoadTemplate`.
    roots: FxHashMap<(u32, usize), S::Node>,
}

impl<S: DomSink> Default for TemplateCache<S> {
    fn default() -> Self {
        Self {
            roots: FxHashMap::default(),
        }
    }
}

impl<S: DomSink> TemplateCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: TemplateId, root_index: usize) -> bool {
        self.roots.contains_key(&(id.0, root_index))
    }

    /// Builds and caches the static skeleton for every root of `template`. Safe to
    /// call more than once for the same id; later calls overwrite the cached roots.
    pub fn build(&mut self, sink: &mut S, id: TemplateId, template: &Template) {
        for i in 0..template.root_count() {
            let root_ix = template.root_index(i);
            let node = Self::build_node(sink, template, root_ix);
            self.roots.insert((id.0, i), node);
        }
    }

    fn build_node(sink: &mut S, template: &Template, ix: usize) -> S::Node {
        match template.kind(ix) {
            TNodeKind::Element => {
                let node = sink.create_element(template.tag(ix));
                for j in 0..template.attr_count(ix) {
                    let attr_ix = template.attr_at(ix, j);
                    if template.kind(attr_ix) == TNodeKind::StaticAttr {
                        if let TNode::StaticAttr { name, value, ns } = template.node(attr_ix) {
                            sink.set_attribute(&node, *ns, name, value);
                        }
                    }
                }
                for j in 0..template.child_count(ix) {
                    let child_ix = template.child_at(ix, j);
                    let child = Self::build_node(sink, template, child_ix);
                    sink.append_child(&node, child);
                }
                node
            }
            TNodeKind::Text => match template.node(ix) {
                TNode::Text(s) => sink.create_text(s),
                other => unreachable!("Text kind carries non-text payload {other:?}"),
            },
            // Starts empty; the first render's fill pass (CreateTextNode, or a
            // SetText against the owning element) supplies real content.
            TNodeKind::DynamicText => sink.create_text(""),
            TNodeKind::Dynamic => sink.create_placeholder(),
            TNodeKind::DynamicAttr | TNodeKind::StaticAttr => {
                unreachable!("attribute nodes are consumed by their owning element, not built standalone")
            }
        }
    }

    /// Clones the cached prototype for `(id, root_index)`.
    pub fn clone_root(&self, sink: &mut S, id: TemplateId, root_index: usize) -> Result<S::Node> {
        let proto = self
            .roots
            .get(&(id.0, root_index))
            .ok_or(InterpreterError::UnknownTemplate(id.0))?;
        Ok(sink.clone_node(proto))
    }
}
