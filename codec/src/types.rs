//! Core types for the codec.

use std::fmt;
use std::time::Duration;

/// A stable entity identifier.
///
/// Entity IDs are assigned by the game layer and must remain stable
/// for the lifetime of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw entity ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sender-side timestamp attached to a frame by the transport.
///
/// Only ordering matters: a receiver applies a frame only if its timestamp is
/// strictly greater than the last applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SendTimestamp(u64);

impl SendTimestamp {
    /// Creates a timestamp from a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Creates a timestamp from a sender clock reading, in microseconds.
    #[must_use]
    pub fn from_duration(now: Duration) -> Self {
        Self(u64::try_from(now.as_micros()).unwrap_or(u64::MAX))
    }

    /// Returns the raw timestamp value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for SendTimestamp {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Metadata delivered with an incoming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveInfo {
    pub timestamp: SendTimestamp,
}

impl ReceiveInfo {
    #[must_use]
    pub const fn new(timestamp: SendTimestamp) -> Self {
        Self { timestamp }
    }
}

/// Which side of the network owns an entity's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Authority {
    /// Local peer simulates the entity and sends frames.
    Owner,
    /// Another peer owns the entity; frames are received and applied.
    Remote,
}

impl Authority {
    #[must_use]
    pub const fn is_owner(self) -> bool {
        matches!(self, Self::Owner)
    }
}
