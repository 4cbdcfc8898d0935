//! Error types for bitstream operations.

use std::fmt;

/// Result type for bitstream operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors that can occur during byte-level encoding/decoding and quantization.
#[derive(Debug, Clone, PartialEq)]
pub enum BitError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// More flags were supplied than the target integer has bits.
    TooManyFlags {
        /// Number of flags supplied.
        count: usize,
        /// Number of bits in the target integer.
        max: usize,
    },

    /// Quantization range is empty, inverted, or not finite.
    InvalidRange {
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },
}

impl fmt::Display for BitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfBuffer {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bytes but only {available} bytes available"
                )
            }
            Self::TooManyFlags { count, max } => {
                write!(f, "cannot pack {count} flags into {max} bits")
            }
            Self::InvalidRange { min, max } => {
                write!(f, "invalid quantization range [{min}, {max}]")
            }
        }
    }
}

impl std::error::Error for BitError {}
