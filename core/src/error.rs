//! Error taxonomy for the runtime (spec §7).
//!
//! Fatal conditions (stack underflow, unknown opcode, unknown element id, hook-tag
//! mismatch, writer overflow) are asserted in debug builds and, in release, surfaced
//! as `Err` rather than left to panic silently, so a host embedding this runtime can
//! decide whether to abort just the current buffer. "Reported to caller" conditions
//! never mutate state before returning `Err`.

use crate::ids::{MemoId, ScopeId, SignalKey, TemplateId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("signal {0:?} has already been destroyed")]
    SignalDestroyed(SignalKey),

    #[error("memo {0:?} has already been destroyed")]
    MemoDestroyed(MemoId),

    #[error("scope {0:?} is not mounted")]
    ScopeNotMounted(ScopeId),

    #[error("template id {0:?} is already registered")]
    TemplateAlreadyRegistered(TemplateId),

    #[error("template index {index} out of range (template has {len} nodes)")]
    TemplateIndexOutOfRange { index: usize, len: usize },

    #[error("hook tag mismatch at cursor {cursor} in scope {scope:?}: expected {expected}, found {found}")]
    HookTagMismatch {
        scope: ScopeId,
        cursor: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("mutation writer overflow: needed {needed} bytes, {capacity} remaining")]
    WriterOverflow { needed: usize, capacity: usize },

    #[error("unknown mutation opcode byte 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("mutation buffer ended mid-operand")]
    BufferTruncated,

    #[error("template child fan-out exceeds 255 at depth addressed by path")]
    PathTooDeep,

    #[error("event handler id {0} is not registered")]
    UnknownHandler(u32),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
