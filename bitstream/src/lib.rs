//! Low-level packing primitives for the statepack replication layer.
//!
//! This crate provides [`ByteWriter`] and [`ByteReader`] for big-endian record
//! encoding, plus lossy float quantization and boolean bitfield packing.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked.
//! - **No domain knowledge** - This crate knows nothing about entities, animators, or game state.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{pack_to_short, unpack_from_short, ByteReader, ByteWriter, QuantRange};
//!
//! let range = QuantRange::new(-100.0, 100.0).unwrap();
//! let mut writer = ByteWriter::new();
//! writer.write_u8(1);
//! writer.write_u16(pack_to_short(12.5, range));
//!
//! let bytes = writer.finish();
//!
//! let mut reader = ByteReader::new(&bytes);
//! assert_eq!(reader.read_u8().unwrap(), 1);
//! let value = unpack_from_short(reader.read_u16().unwrap(), range);
//! assert!((value - 12.5).abs() < 0.01);
//! ```

mod error;
mod quantize;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use quantize::{
    pack_flags_u16, pack_flags_u8, pack_to_byte, pack_to_short, unpack_flags_u16,
    unpack_flags_u8, unpack_from_byte, unpack_from_short, QuantRange,
};
pub use reader::ByteReader;
pub use writer::ByteWriter;
