//! Frame layout for the statepack replication layer.
//!
//! This crate handles the binary frame format: serializer index bytes,
//! parameter tags with their sentinel, and limit enforcement. It does not
//! know what a serializer's payload means, only where records start.
//!
//! # Frame format
//!
//! ```text
//! frame   := record*
//! record  := serializer_index:u8 payload
//! params  := (tag [u16 if number])* 0xFF
//! tag     := index:7 | value:1 (high bit)
//! ```
//!
//! All multi-byte integers are big-endian.
//!
//! # Design Principles
//!
//! - **Self-delimiting records** - No length prefixes; each payload is parsed by its serializer.
//! - **Bounded decoding** - Frame size and serializer indices are checked before any payload is read.
//! - **No domain knowledge** - This crate handles framing, not game logic.

mod error;
mod frame;
mod limits;
mod param;

pub use error::{DecodeError, EncodeError, WireResult};
pub use frame::{FrameReader, FrameWriter, SerializerIndex, MAX_SERIALIZERS};
pub use limits::Limits;
pub use param::{read_param_tag, ParamTag, MAX_PARAM_INDEX, PARAM_SENTINEL, PARAM_VALUE_BIT};
