//! Error types for frame layout operations.

use std::fmt;

use bitstream::BitError;

/// Result type for frame decoding.
pub type WireResult<T> = Result<T, DecodeError>;

/// Errors raised while walking a received frame.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Frame is larger than the configured limit.
    FrameTooLarge { actual: usize, limit: usize },

    /// A record ended before its declared contents.
    Truncated(BitError),

    /// A serializer index is outside the registered range.
    SerializerIndexOutOfRange { index: u8, limit: usize },

    /// The same serializer index appeared twice in one frame.
    DuplicateRecord { index: u8 },
}

/// Errors raised while building a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Appending a record would exceed the frame size limit.
    FrameTooLarge { needed: usize, limit: usize },

    /// A parameter index collides with the value bit or the sentinel.
    ParamIndexOutOfRange { index: usize },

    /// A serializer index does not fit the configured limit.
    SerializerIndexOutOfRange { index: usize, limit: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameTooLarge { actual, limit } => {
                write!(f, "frame too large: {actual} bytes, limit {limit}")
            }
            Self::Truncated(e) => write!(f, "truncated record: {e}"),
            Self::SerializerIndexOutOfRange { index, limit } => {
                write!(f, "serializer index {index} out of range (limit {limit})")
            }
            Self::DuplicateRecord { index } => {
                write!(f, "duplicate record for serializer {index}")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Truncated(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BitError> for DecodeError {
    fn from(err: BitError) -> Self {
        Self::Truncated(err)
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameTooLarge { needed, limit } => {
                write!(f, "frame too large: need {needed} bytes, limit {limit}")
            }
            Self::ParamIndexOutOfRange { index } => {
                write!(f, "parameter index {index} does not fit in a tag byte")
            }
            Self::SerializerIndexOutOfRange { index, limit } => {
                write!(f, "serializer index {index} out of range (limit {limit})")
            }
        }
    }
}

impl std::error::Error for EncodeError {}
