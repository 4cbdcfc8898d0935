//! Decoded frame records.
//!
//! Decoding never touches host state: a frame is decoded into these types in
//! full before any of it is applied.

use wire::SerializerIndex;

use crate::animator::AnimatorStateInfo;

/// One decoded animator parameter change.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ParamUpdate {
    Trigger { index: usize },
    Bool { index: usize, value: bool },
    /// Int and float parameters; ints are rounded on apply.
    Number { index: usize, value: f32 },
}

impl ParamUpdate {
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Trigger { index } | Self::Bool { index, .. } | Self::Number { index, .. } => {
                *index
            }
        }
    }
}

/// The payload of one serializer record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Record {
    /// Packed flag byte, bit `i` is flag `i`.
    Flags { bits: u8 },
    Params { updates: Vec<ParamUpdate> },
    State { state: AnimatorStateInfo },
}

/// A record together with the serializer slot it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub index: SerializerIndex,
    pub record: Record,
}

/// A fully decoded frame, records in wire order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedFrame {
    pub records: Vec<DecodedRecord>,
}

impl DecodedFrame {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` if any record reads or writes the host animator.
    #[must_use]
    pub fn touches_animator(&self) -> bool {
        self.records
            .iter()
            .any(|r| !matches!(r.record, Record::Flags { .. }))
    }
}
