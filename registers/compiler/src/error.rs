// Licensed under the Apache-2.0 license

use crate::types::{Direction, Side};
use thiserror::Error;

/// Errors reported by the compiler stages.
///
/// Every error is a deterministic authoring mistake in the schema; none of
/// them are retryable.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    #[error("field `{field}` has invalid width {width}")]
    InvalidWidth { field: String, width: i64 },

    #[error("`{name}` is not a valid identifier: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("`{tag}` is not a direction (expected i, o, input or output)")]
    InvalidDirection { tag: String },

    #[error("`{text}` is not a valid literal: {reason}")]
    InvalidLiteral { text: String, reason: String },

    #[error("field `{field}` is declared twice in the same list")]
    DuplicateField { field: String },

    #[error("prefixing with scope `{scope}` produces `{field}` twice")]
    DuplicateAfterRename { scope: String, field: String },

    #[error("constant `{mnemonic}` is already defined as {existing}")]
    DuplicateDefinition { mnemonic: String, existing: String },

    #[error("constant `{mnemonic}` is not defined")]
    UndefinedConstant { mnemonic: String },

    #[error("field `{field}` from scope `{second_scope}` collides with scope `{first_scope}`")]
    NameCollision {
        field: String,
        first_scope: String,
        second_scope: String,
    },

    #[error("scope `{scope}` is used by more than one part")]
    DuplicateScope { scope: String },

    #[error("{side} field `{field}` of channel `{channel}` is {found}, expected {expected}")]
    DirectionMismatch {
        channel: String,
        side: Side,
        field: String,
        found: Direction,
        expected: Direction,
    },

    #[error("field `{field}` of channel `{channel}` shadows a handshake signal")]
    HandshakeConflict { channel: String, field: String },

    #[error("field `{field}` is {width} bits wide, maximum is {max}")]
    WidthExceedsMaximum { field: String, width: u32, max: u32 },

    #[error("default value {value} of field `{field}` does not fit in {width} bits")]
    DefaultOverflow { field: String, width: u32, value: u64 },

    #[error("field `{field}` starts at bit {found}, expected bit {expected}")]
    LayoutMismatch { field: String, found: u64, expected: u64 },
}

impl CompileError {
    /// The field (or mnemonic) the error is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            CompileError::InvalidWidth { field, .. }
            | CompileError::DuplicateField { field }
            | CompileError::DuplicateAfterRename { field, .. }
            | CompileError::NameCollision { field, .. }
            | CompileError::DirectionMismatch { field, .. }
            | CompileError::HandshakeConflict { field, .. }
            | CompileError::WidthExceedsMaximum { field, .. }
            | CompileError::DefaultOverflow { field, .. }
            | CompileError::LayoutMismatch { field, .. } => Some(field),
            CompileError::InvalidName { name, .. } => Some(name),
            CompileError::DuplicateDefinition { mnemonic, .. }
            | CompileError::UndefinedConstant { mnemonic } => Some(mnemonic),
            CompileError::InvalidDirection { .. }
            | CompileError::InvalidLiteral { .. }
            | CompileError::DuplicateScope { .. } => None,
        }
    }
}

/// Result type for compiler operations.
pub type CompileResult<T> = std::result::Result<T, CompileError>;
