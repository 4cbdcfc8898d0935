//! Configurable limits for bounded frame encoding and decoding.

/// Frame-level limits.
///
/// Enforced on both the send path (a frame that would grow past
/// `max_frame_bytes` is an encode error) and the receive path (oversized
/// frames and out-of-range serializer indices are rejected before any record
/// is decoded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum frame size in bytes.
    pub max_frame_bytes: usize,

    /// Maximum number of serializers registered on one entity.
    pub max_serializers: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // One frame per entity per send; stays under a typical MTU payload
            max_frame_bytes: 1024,
            max_serializers: 32,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_frame_bytes: 256,
            max_serializers: 8,
        }
    }

    /// Creates limits with no restrictions beyond the index byte range.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_frame_bytes: usize::MAX,
            max_serializers: crate::MAX_SERIALIZERS,
        }
    }
}
