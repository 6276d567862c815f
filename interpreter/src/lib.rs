//! Consumer-side half of the reactive runtime's mutation protocol (spec §4.12): a
//! single-threaded interpreter that plays a decoded opcode stream into an abstract
//! [`dom::DomSink`], plus the template-skeleton cache that makes `LoadTemplate`
//! O(clone) instead of O(template size) after the first render.
//!
//! Split from `reactive-ui-core` the way `dioxus-web`/`dioxus-desktop` sit downstream
//! of `dioxus-core`: the runtime crate never depends on this one.

pub mod dom;
pub mod error;
pub mod interpreter;
pub mod template_cache;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use dom::DomSink;
pub use error::{InterpreterError, Result};
pub use interpreter::Interpreter;
pub use template_cache::TemplateCache;
