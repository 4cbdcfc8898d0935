//! Layout validation errors.

use std::fmt;

/// Result type for layout operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when building or validating a layout.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A flag serializer declares no flags.
    EmptyFlags { serializer: usize },

    /// A flag serializer declares more flags than fit in its byte.
    TooManyFlags { serializer: usize, count: usize },

    /// Duplicate flag name within one serializer.
    DuplicateFlagName { serializer: usize, name: String },

    /// A parameter serializer declares more parameters than a tag can index.
    TooManyParams { serializer: usize, count: usize },

    /// Duplicate parameter name within one serializer.
    DuplicateParamName { serializer: usize, name: String },

    /// Numeric parameter range is empty, inverted, or not finite.
    InvalidFloatRange { min: f32, max: f32 },

    /// Change epsilon must be finite and non-negative.
    InvalidEpsilon { epsilon: f32 },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFlags { serializer } => {
                write!(f, "flag serializer {serializer} declares no flags")
            }
            Self::TooManyFlags { serializer, count } => {
                write!(
                    f,
                    "flag serializer {serializer} declares {count} flags, maximum is {}",
                    crate::MAX_FLAGS
                )
            }
            Self::DuplicateFlagName { serializer, name } => {
                write!(f, "duplicate flag {name:?} in serializer {serializer}")
            }
            Self::TooManyParams { serializer, count } => {
                write!(
                    f,
                    "parameter serializer {serializer} declares {count} parameters, maximum is {}",
                    crate::MAX_PARAMS
                )
            }
            Self::DuplicateParamName { serializer, name } => {
                write!(f, "duplicate parameter {name:?} in serializer {serializer}")
            }
            Self::InvalidFloatRange { min, max } => {
                write!(f, "invalid numeric parameter range [{min}, {max}]")
            }
            Self::InvalidEpsilon { epsilon } => {
                write!(f, "invalid change epsilon {epsilon}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}
