//! Reactive graph, scope/hook model, template registry and diffing engine that
//! compiles component renders into a compact mutation opcode stream.
//!
//! Follows the module split of `dioxus-core`: a set of focused arenas (signals,
//! scopes, memos, effects, templates, VNodes, element ids) composed by a top-level
//! [`runtime::Runtime`], with the create/diff engines walking VNodes against the
//! mutation writer.

mod config;
mod context;
mod create;
mod diff;
mod dirty;
mod effect;
mod element;
mod error;
mod ids;
mod memo;
mod protocol;
mod runtime;
mod scope;
mod signal;
mod string_store;
mod template;
mod vnode;

/// Flat re-export surface, matching the teacher's `innerlude`/`prelude` pattern:
/// internal modules stay private so the arena-organization can change shape without
/// breaking callers, while everything a host needs is available at the crate root.
pub mod innerlude {
    pub use crate::config::RuntimeConfig;
    pub use crate::context::{ComponentContext, HandlerId};
    pub use crate::create::CreateEngine;
    pub use crate::diff::DiffEngine;
    pub use crate::dirty::DirtyQueue;
    pub use crate::effect::EffectStore;
    pub use crate::element::ElementIdAllocator;
    pub use crate::error::{Result, RuntimeError};
    pub use crate::ids::{
        EffectId, ElementId, MemoId, ReactiveContextId, ScopeId, SignalKey, StringKey, TemplateId,
    };
    pub use crate::memo::MemoStore;
    pub use crate::protocol::{MutationReader, MutationWriter, Opcode};
    pub use crate::runtime::Runtime;
    pub use crate::scope::{HookEntry, ScopeStore};
    pub use crate::signal::{SignalStore, SignalValue};
    pub use crate::string_store::StringStore;
    pub use crate::template::{AttrValueKind, TNode, TNodeKind, Template, TemplateRegistry};
    pub use crate::vnode::{AttributeValue, DynamicNode, VNode, VNodeStore};
}

pub use innerlude::*;

/// Re-exports intended for `use reactive_ui_core::prelude::*;` at call sites that
/// only need the common hook/frame surface, not every arena type.
pub mod prelude {
    pub use crate::context::{ComponentContext, HandlerId};
    pub use crate::ids::{ElementId, ScopeId, TemplateId};
    pub use crate::protocol::MutationWriter;
    pub use crate::template::Template;
    pub use crate::vnode::{AttributeValue, VNodeStore};
}
