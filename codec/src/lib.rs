//! Per-entity delta replication for the statepack layer.
//!
//! This is the main crate that ties together bitstream, wire, and schema: it
//! turns an [`EntityLayout`](schema::EntityLayout) into a set of serializers,
//! multiplexes their deltas into one frame per send, and replays frames on
//! remote peers.
//!
//! # Features
//!
//! - Flag, animator parameter, and animator state serializers
//! - One frame per entity per send cycle, empty when nothing changed
//! - Periodic resends so lost frames heal without acknowledgements
//! - Ordering guard that drops frames older than the last applied one
//! - Host-free frame decoding for tools and fuzzing
//!
//! # Design Principles
//!
//! - **Validate before apply** - A frame is decoded in full before any of it
//!   touches host state; malformed frames are rejected whole.
//! - **Explicit lifecycle** - Replicators are created, ticked, and torn down
//!   by the caller; there is no global registry.
//! - **Deterministic** - Same host state and clock produce the same bytes.

mod animator;
mod error;
mod flags;
mod frame;
mod host;
mod params;
mod record;
mod registry;
mod replicator;
mod serializer;
mod state;
mod stats;
mod types;

pub use animator::{Animator, AnimatorParameter, AnimatorStateInfo, MemoryAnimator};
pub use error::{CodecError, CodecResult};
pub use flags::FlagStateSerializer;
pub use frame::decode_frame;
pub use host::{EntityHost, MemoryHost};
pub use params::AnimatorParamSerializer;
pub use record::{DecodedFrame, DecodedRecord, ParamUpdate, Record};
pub use registry::{Entity, EntityRegistry, OutgoingFrame};
pub use replicator::{ApplyOutcome, EntityReplicator};
pub use serializer::{build_serializer, StateSerializer};
pub use state::AnimatorStateSerializer;
pub use stats::ReplicationStats;
pub use types::{Authority, EntityId, ReceiveInfo, SendTimestamp};
pub use wire::Limits as WireLimits;
