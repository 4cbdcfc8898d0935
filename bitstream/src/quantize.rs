//! Float quantization and boolean bitfield packing.
//!
//! Quantization is lossy but bounded: a value packed into `N` bits over
//! `[min, max]` comes back within `(max - min) / (2^N - 1)` of the original.
//! Values outside the range are clamped, never rejected.

use crate::error::{BitError, BitResult};

/// A validated quantization range with `min < max`, both finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantRange {
    min: f32,
    max: f32,
}

impl QuantRange {
    /// The unit interval `[0, 1]`, used for normalized times.
    pub const UNIT: Self = Self { min: 0.0, max: 1.0 };

    /// Creates a range, rejecting empty, inverted, or non-finite bounds.
    pub fn new(min: f32, max: f32) -> BitResult<Self> {
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(BitError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(self) -> f32 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(self) -> f32 {
        self.max
    }

    /// Width of the range.
    #[must_use]
    pub fn span(self) -> f32 {
        self.max - self.min
    }

    fn normalize(self, value: f32) -> f64 {
        let min = f64::from(self.min);
        let span = f64::from(self.max) - min;
        ((f64::from(value) - min) / span).clamp(0.0, 1.0)
    }

    fn denormalize(self, t: f64) -> f32 {
        let min = f64::from(self.min);
        let span = f64::from(self.max) - min;
        (min + t * span) as f32
    }
}

/// Quantizes `value` into a byte over `range`.
#[must_use]
pub fn pack_to_byte(value: f32, range: QuantRange) -> u8 {
    (range.normalize(value) * f64::from(u8::MAX)).round() as u8
}

/// Reconstructs an approximation of a value packed with [`pack_to_byte`].
#[must_use]
pub fn unpack_from_byte(packed: u8, range: QuantRange) -> f32 {
    range.denormalize(f64::from(packed) / f64::from(u8::MAX))
}

/// Quantizes `value` into 16 bits over `range`.
#[must_use]
pub fn pack_to_short(value: f32, range: QuantRange) -> u16 {
    (range.normalize(value) * f64::from(u16::MAX)).round() as u16
}

/// Reconstructs an approximation of a value packed with [`pack_to_short`].
#[must_use]
pub fn unpack_from_short(packed: u16, range: QuantRange) -> f32 {
    range.denormalize(f64::from(packed) / f64::from(u16::MAX))
}

/// Packs up to 8 flags into a byte; flag `i` lands in bit `i`.
pub fn pack_flags_u8(flags: &[bool]) -> BitResult<u8> {
    if flags.len() > 8 {
        return Err(BitError::TooManyFlags {
            count: flags.len(),
            max: 8,
        });
    }
    Ok(flags
        .iter()
        .enumerate()
        .fold(0u8, |acc, (bit, &set)| acc | (u8::from(set) << bit)))
}

/// Unpacks the 8 flags of a byte, bit `i` to flag `i`.
#[must_use]
pub fn unpack_flags_u8(packed: u8) -> [bool; 8] {
    std::array::from_fn(|bit| packed & (1 << bit) != 0)
}

/// Packs up to 16 flags into a `u16`; flag `i` lands in bit `i`.
pub fn pack_flags_u16(flags: &[bool]) -> BitResult<u16> {
    if flags.len() > 16 {
        return Err(BitError::TooManyFlags {
            count: flags.len(),
            max: 16,
        });
    }
    Ok(flags
        .iter()
        .enumerate()
        .fold(0u16, |acc, (bit, &set)| acc | (u16::from(set) << bit)))
}

/// Unpacks the 16 flags of a `u16`, bit `i` to flag `i`.
#[must_use]
pub fn unpack_flags_u16(packed: u16) -> [bool; 16] {
    std::array::from_fn(|bit| packed & (1 << bit) != 0)
}
