//! Reference frame identifiers and message headers.
//!
//! Every cloud and camera reading names the coordinate frame it lives in.
//! The projection pipeline compares these names to catch a transform that
//! was looked up for the wrong sensor.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Name of a coordinate frame (e.g. `"lidar"`, `"base_link"`, `"camera_optical"`).
///
/// Frames are compared by exact string equality, matching transform-tree
/// conventions.
///
/// # Example
///
/// ```
/// use depth_types::FrameId;
///
/// let frame = FrameId::new("lidar");
/// assert_eq!(frame.as_str(), "lidar");
/// assert_eq!(frame, "lidar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FrameId(String);

impl FrameId {
    /// Creates a frame identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the frame name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if no frame name was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FrameId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for FrameId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FrameId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Message metadata: capture time, frame and sequence number.
///
/// The pipeline never computes a header. It copies the input cloud's header
/// onto the output depth image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Header {
    /// Capture timestamp.
    pub stamp: Timestamp,
    /// Coordinate frame of the payload.
    pub frame_id: FrameId,
    /// Sequence number assigned by the publisher.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seq: u32,
}

impl Header {
    /// Creates a header with sequence number zero.
    #[must_use]
    pub fn new(stamp: Timestamp, frame_id: impl Into<FrameId>) -> Self {
        Self {
            stamp,
            frame_id: frame_id.into(),
            seq: 0,
        }
    }

    /// Sets the sequence number.
    #[must_use]
    pub const fn with_seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }
}
