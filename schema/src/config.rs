//! Resend timing and quantization settings shared by every serializer of a layout.

use std::time::Duration;

use bitstream::QuantRange;

use crate::error::{SchemaError, SchemaResult};

/// Sync timing and numeric range for one entity layout.
///
/// Both peers must agree on these values: the numeric range in particular
/// is part of the wire contract, so it lives in the layout and is covered by
/// the layout fingerprint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SyncConfig {
    /// Interval after which an unchanged flag byte is sent again.
    pub flag_resend_ms: u64,
    /// Interval after which an unchanged bool or number parameter is sent again.
    pub param_resend_ms: u64,
    /// Interval between coarse animator state resyncs.
    pub state_resync_ms: u64,
    /// Smallest change of a number parameter worth sending.
    pub float_epsilon: f32,
    /// Lower bound of the number parameter range.
    pub float_min: f32,
    /// Upper bound of the number parameter range.
    pub float_max: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            flag_resend_ms: 500,
            param_resend_ms: 500,
            state_resync_ms: 5_000,
            float_epsilon: 0.02,
            float_min: -100.0,
            float_max: 100.0,
        }
    }
}

impl SyncConfig {
    /// Flag resend interval.
    #[must_use]
    pub const fn flag_resend(&self) -> Duration {
        Duration::from_millis(self.flag_resend_ms)
    }

    /// Parameter resend interval.
    #[must_use]
    pub const fn param_resend(&self) -> Duration {
        Duration::from_millis(self.param_resend_ms)
    }

    /// Animator state resync interval.
    #[must_use]
    pub const fn state_resync(&self) -> Duration {
        Duration::from_millis(self.state_resync_ms)
    }

    /// Quantization range for number parameters.
    pub fn float_range(&self) -> SchemaResult<QuantRange> {
        QuantRange::new(self.float_min, self.float_max).map_err(|_| {
            SchemaError::InvalidFloatRange {
                min: self.float_min,
                max: self.float_max,
            }
        })
    }

    /// Validates ranges and thresholds.
    pub fn validate(&self) -> SchemaResult<()> {
        self.float_range()?;
        if !self.float_epsilon.is_finite() || self.float_epsilon < 0.0 {
            return Err(SchemaError::InvalidEpsilon {
                epsilon: self.float_epsilon,
            });
        }
        Ok(())
    }
}
