//! Capture timestamps.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nanosecond-precision capture timestamp.
///
/// Carried through the pipeline untouched so the output depth image can be
/// stamped with the time of the cloud it was built from.
///
/// # Example
///
/// ```
/// use depth_types::Timestamp;
///
/// let ts = Timestamp::from_secs_f64(1.5);
/// assert!((ts.as_secs_f64() - 1.5).abs() < 1e-9);
///
/// let ts_nanos = Timestamp::from_nanos(1_500_000_000);
/// assert_eq!(ts, ts_nanos);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamp {
    /// Nanoseconds since epoch.
    nanos: u64,
}

impl Timestamp {
    /// Creates a timestamp from nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Creates a timestamp from seconds (floating point).
    ///
    /// Negative inputs clamp to zero.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn from_secs_f64(secs: f64) -> Self {
        let nanos = (secs * 1e9).round().max(0.0) as u64;
        Self { nanos }
    }

    /// Creates a timestamp from the `sec`/`nanosec` pair used by ROS headers.
    #[must_use]
    pub const fn from_secs_nanos(secs: u64, nanos: u32) -> Self {
        Self {
            nanos: secs * 1_000_000_000 + nanos as u64,
        }
    }

    /// Returns the timestamp as nanoseconds.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos
    }

    /// Returns the timestamp as seconds (floating point).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(self) -> f64 {
        self.nanos as f64 / 1e9
    }

    /// Returns the whole seconds component.
    #[must_use]
    pub const fn secs(self) -> u64 {
        self.nanos / 1_000_000_000
    }

    /// Returns the subsecond nanoseconds component.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn subsec_nanos(self) -> u32 {
        (self.nanos % 1_000_000_000) as u32
    }

    /// Returns the zero timestamp.
    #[must_use]
    pub const fn zero() -> Self {
        Self { nanos: 0 }
    }

    /// Checks if this is the zero timestamp.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.nanos == 0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs(), self.subsec_nanos())
    }
}
