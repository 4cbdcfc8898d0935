//! Tag bytes for animator parameter records.
//!
//! A parameter payload is a run of tags closed by [`PARAM_SENTINEL`]. The low
//! seven bits of a tag carry the parameter index; the high bit carries the
//! value of a bool parameter. Number parameters follow their tag with a
//! big-endian `u16`.

use bitstream::ByteReader;

use crate::error::{EncodeError, WireResult};

/// Closes a parameter payload.
pub const PARAM_SENTINEL: u8 = 0xFF;

/// Bool value bit within a tag.
pub const PARAM_VALUE_BIT: u8 = 0x80;

/// Largest encodable parameter index.
///
/// Index `0x7F` with the value bit set would read back as the sentinel.
pub const MAX_PARAM_INDEX: u8 = 0x7E;

/// A decoded parameter tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamTag {
    pub index: u8,
    pub value: bool,
}

impl ParamTag {
    /// Creates a tag, rejecting indices that would collide with the sentinel.
    pub fn new(index: usize, value: bool) -> Result<Self, EncodeError> {
        match u8::try_from(index) {
            Ok(raw) if raw <= MAX_PARAM_INDEX => Ok(Self { index: raw, value }),
            _ => Err(EncodeError::ParamIndexOutOfRange { index }),
        }
    }

    /// Returns the tag byte.
    #[must_use]
    pub const fn encode(self) -> u8 {
        if self.value {
            self.index | PARAM_VALUE_BIT
        } else {
            self.index
        }
    }

    /// Splits a tag byte; `None` for the sentinel.
    #[must_use]
    pub const fn decode(byte: u8) -> Option<Self> {
        if byte == PARAM_SENTINEL {
            return None;
        }
        Some(Self {
            index: byte & !PARAM_VALUE_BIT,
            value: byte & PARAM_VALUE_BIT != 0,
        })
    }
}

/// Reads the next tag, or `None` once the sentinel is consumed.
pub fn read_param_tag(reader: &mut ByteReader<'_>) -> WireResult<Option<ParamTag>> {
    Ok(ParamTag::decode(reader.read_u8()?))
}
