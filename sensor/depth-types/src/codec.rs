//! KITTI fixed-point depth encoding.
//!
//! A depth in meters is stored as `round(depth * 256)` in a `u16`, giving a
//! resolution of 1/256 m and a range of just under 256 m. The value 0 is
//! reserved for "no measurement".

/// Fixed-point scale: encoded units per meter.
pub const DEPTH_SCALE: f64 = 256.0;

/// Encoded value of a pixel without a measurement.
pub const INVALID_DEPTH: u16 = 0;

/// Largest encoded depth value.
pub const MAX_ENCODED_DEPTH: u16 = u16::MAX;

/// Largest representable depth in meters (`65535 / 256`).
#[must_use]
pub fn max_depth_m() -> f64 {
    f64::from(MAX_ENCODED_DEPTH) / DEPTH_SCALE
}

/// Encodes a metric depth as a KITTI `u16` pixel value.
///
/// The result is `round(depth * 256)` (half away from zero), saturated to
/// `[1, 65535]`. Depths that round to zero, including a depth of exactly
/// zero, encode as 1 so a real return never reads as [`INVALID_DEPTH`].
/// `NaN` has no meaningful depth and encodes as [`INVALID_DEPTH`].
///
/// # Example
///
/// ```
/// use depth_types::{encode_depth, INVALID_DEPTH};
///
/// assert_eq!(encode_depth(2.0), 512);
/// assert_eq!(encode_depth(0.0), 1);
/// assert_eq!(encode_depth(1_000.0), u16::MAX);
/// assert_eq!(encode_depth(f64::NAN), INVALID_DEPTH);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_depth(depth_m: f64) -> u16 {
    if depth_m.is_nan() {
        return INVALID_DEPTH;
    }
    let scaled = (depth_m * DEPTH_SCALE).round();
    // Clamped into u16 range first, so the cast is exact.
    scaled.clamp(1.0, f64::from(MAX_ENCODED_DEPTH)) as u16
}

/// Decodes a KITTI `u16` pixel value to meters.
///
/// [`INVALID_DEPTH`] decodes to `0.0`.
///
/// # Example
///
/// ```
/// use depth_types::decode_depth;
///
/// assert!((decode_depth(512) - 2.0).abs() < 1e-12);
/// assert_eq!(decode_depth(0), 0.0);
/// ```
#[must_use]
pub fn decode_depth(value: u16) -> f64 {
    if value == INVALID_DEPTH {
        0.0
    } else {
        f64::from(value) / DEPTH_SCALE
    }
}
