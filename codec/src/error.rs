//! Error types for replication.

use bitstream::BitError;
use schema::{ParamKind, SchemaError, SerializerKind};
use thiserror::Error;
use wire::{DecodeError, EncodeError};

use crate::types::EntityId;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while building, sending, or receiving entity state.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("bitstream error: {0}")]
    Bitstream(#[from] BitError),

    #[error("malformed frame: {0}")]
    Decode(#[from] DecodeError),

    #[error("frame encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("invalid layout: {0}")]
    Schema(#[from] SchemaError),

    /// Frame names a serializer the layout does not have.
    #[error("unknown serializer index {index} (layout has {count})")]
    UnknownSerializer { index: u8, count: usize },

    /// Parameter tag names an index past the parameter list.
    #[error("unknown animator parameter index {index} (layout has {count})")]
    UnknownParameter { index: usize, count: usize },

    /// Parameter tag names a parameter excluded from replication.
    #[error("animator parameter {index} is not replicated")]
    IgnoredParameter { index: usize },

    #[error("layout has {count} serializers, limit is {limit}")]
    TooManySerializers { count: usize, limit: usize },

    #[error("entity has no animator")]
    MissingAnimator,

    #[error("host has no flag named {name:?}")]
    MissingFlag { name: String },

    #[error("animator has {found} parameters, layout expects {expected}")]
    ParameterCountMismatch { expected: usize, found: usize },

    #[error(
        "animator parameter {index} is {found_name:?} ({}), layout expects {expected_name:?} ({})",
        .found_kind.as_str(),
        .expected_kind.as_str()
    )]
    ParameterMismatch {
        index: usize,
        expected_name: String,
        expected_kind: ParamKind,
        found_name: String,
        found_kind: ParamKind,
    },

    /// A decoded record was routed to a serializer of another kind.
    #[error("record does not match {} serializer", .expected.as_str())]
    RecordMismatch { expected: SerializerKind },

    #[error("only the owning peer may send entity state")]
    NotAuthoritative,

    #[error("entity {0} is already registered")]
    EntityExists(EntityId),

    #[error("entity {0} is not registered")]
    EntityNotFound(EntityId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_errors_convert() {
        let err: CodecError = BitError::EndOfBuffer {
            requested: 1,
            available: 0,
        }
        .into();
        assert!(matches!(err, CodecError::Bitstream(_)));

        let err: CodecError = DecodeError::DuplicateRecord { index: 2 }.into();
        assert!(err.to_string().starts_with("malformed frame"));

        let err: CodecError = SchemaError::EmptyFlags { serializer: 0 }.into();
        assert!(matches!(err, CodecError::Schema(_)));
    }

    #[test]
    fn error_display_parameter_mismatch() {
        let err = CodecError::ParameterMismatch {
            index: 1,
            expected_name: "speed".to_string(),
            expected_kind: ParamKind::Float,
            found_name: "grounded".to_string(),
            found_kind: ParamKind::Bool,
        };
        let msg = err.to_string();
        assert!(msg.contains("\"grounded\" (bool)"));
        assert!(msg.contains("\"speed\" (float)"));
    }

    #[test]
    fn error_display_entity() {
        let msg = CodecError::EntityNotFound(EntityId::new(7)).to_string();
        assert_eq!(msg, "entity #7 is not registered");
    }

    #[test]
    fn error_source_is_preserved() {
        use std::error::Error as _;
        let err: CodecError = DecodeError::DuplicateRecord { index: 2 }.into();
        assert!(err.source().is_some());
    }
}
