//! Error taxonomy for the interpreter (spec §7's "Fatal" bucket, the half that
//! crosses the runtime/interpreter boundary).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterpreterError {
    #[error("mutation stack underflow while applying {0}")]
    StackUnderflow(&'static str),

    #[error("reference to unknown element id {0}")]
    UnknownElementId(u32),

    #[error("reference to unregistered template id {0}")]
    UnknownTemplate(u32),

    #[error(transparent)]
    Protocol(#[from] reactive_ui_core::RuntimeError),
}

pub type Result<T> = std::result::Result<T, InterpreterError>;
