//! Annotation Data Models
//!
//! Defines the surfer record, bounding box, quality scale and the
//! session snapshot that is persisted as JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{now_iso8601, CoreError, CoreResult, Size2D, SurferId, TimeRange, TimeSec};

// =============================================================================
// Quality Rating
// =============================================================================

/// Subjective ride quality applied to a surfer
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Poor,
    Average,
    Good,
    Excellent,
}

impl Quality {
    /// Returns all ratings, worst first
    pub fn all() -> [Quality; 4] {
        [
            Quality::Poor,
            Quality::Average,
            Quality::Good,
            Quality::Excellent,
        ]
    }

    /// Returns the persisted name of the rating
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Poor => "poor",
            Quality::Average => "average",
            Quality::Good => "good",
            Quality::Excellent => "excellent",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::all()
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| CoreError::InvalidQuality(s.to_string()))
    }
}

// =============================================================================
// Bounding Box
// =============================================================================

/// Axis-aligned rectangle in frame pixel coordinates.
///
/// Persisted as `[x, y, width, height]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Creates a bounding box, rejecting negative values and empty areas
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> CoreResult<Self> {
        let bbox = Self {
            x,
            y,
            width,
            height,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Checks that all values are finite and non-negative with a positive area
    pub fn validate(&self) -> CoreResult<()> {
        let values = [self.x, self.y, self.width, self.height];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(CoreError::InvalidBoundingBox(format!(
                "{:?}: values must be finite and non-negative",
                values
            )));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(CoreError::InvalidBoundingBox(format!(
                "{:?}: width and height must be positive",
                values
            )));
        }
        Ok(())
    }

    /// Returns the area in square pixels
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns the center point
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns true if the box lies entirely inside a frame of the given size
    pub fn fits_within(&self, frame: Size2D) -> bool {
        self.x + self.width <= frame.width as f64 && self.y + self.height <= frame.height as f64
    }

    /// Scales the box about its center; the origin is clamped at zero
    pub fn scaled(&self, factor: f64) -> CoreResult<Self> {
        let width = self.width * factor;
        let height = self.height * factor;
        let x = (self.x + (self.width - width) / 2.0).max(0.0);
        let y = (self.y + (self.height - height) / 2.0).max(0.0);
        Self::new(x, y, width, height)
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = CoreError;

    fn try_from(value: [f64; 4]) -> Result<Self, Self::Error> {
        let [x, y, width, height] = value;
        Self::new(x, y, width, height)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        bbox.to_array()
    }
}

// =============================================================================
// Surfer Record
// =============================================================================

/// One tracked subject's annotation entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surfer {
    /// Unique within the session, never reused
    pub id: SurferId,
    /// Time the surfer appears, in seconds
    #[serde(default)]
    pub start_time: Option<TimeSec>,
    /// Time the surfer leaves, in seconds
    #[serde(default)]
    pub end_time: Option<TimeSec>,
    /// `end_time - start_time` when both are set
    #[serde(default)]
    pub duration: Option<TimeSec>,
    /// Bounding box in frame coordinates
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    /// Ride quality rating
    #[serde(default)]
    pub quality: Option<Quality>,
    /// ISO 8601 creation timestamp
    #[serde(default = "now_iso8601")]
    pub created: String,
}

impl Surfer {
    /// Creates a new surfer record
    pub fn new(id: SurferId, start_time: Option<TimeSec>) -> Self {
        Self {
            id,
            start_time,
            end_time: None,
            duration: None,
            bbox: None,
            quality: None,
            created: now_iso8601(),
        }
    }

    /// Recomputes the derived duration from the start and end times
    pub fn recompute_duration(&mut self) {
        self.duration = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        };
    }

    /// Returns true when both start and end are set
    pub fn is_completed(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// Returns the closed presence interval when both ends are set
    pub fn interval(&self) -> Option<TimeRange> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(TimeRange::new(start, end)),
            _ => None,
        }
    }

    /// Returns true if the surfer is present at the given time.
    ///
    /// A surfer with only a start time is open-ended; one without a start
    /// time is never active.
    pub fn is_active_at(&self, time: TimeSec) -> bool {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => start <= time && time <= end,
            (Some(start), None) => time >= start,
            (None, _) => false,
        }
    }
}

// =============================================================================
// Session Snapshot
// =============================================================================

/// Frame rate assumed when a persisted session omits it
pub const DEFAULT_FPS: f64 = 30.0;

fn default_fps() -> f64 {
    DEFAULT_FPS
}

/// Complete serializable state of an annotation session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationData {
    /// Name of the annotated video file
    pub video_file: String,
    /// Video duration in seconds
    pub duration: TimeSec,
    /// Video frame rate
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// ISO 8601 timestamp when the session was created
    #[serde(default = "now_iso8601")]
    pub session_created: String,
    /// ISO 8601 timestamp of the last mutation
    #[serde(default = "now_iso8601")]
    pub session_modified: String,
    /// Number of surfers, informational only
    #[serde(default)]
    pub surfer_count: usize,
    /// Surfer records in insertion order
    pub surfers: Vec<Surfer>,
}

// =============================================================================
// Statistics
// =============================================================================

/// Aggregate figures over a session's surfers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub total_surfers: usize,
    /// Surfers with both start and end set
    pub completed_surfers: usize,
    /// `completed / total`, 0 for an empty session
    pub completion_rate: f64,
    pub avg_ride_duration: f64,
    pub max_ride_duration: f64,
    pub min_ride_duration: f64,
    /// Occurrences of each rating present
    pub quality_distribution: BTreeMap<Quality, usize>,
}

// =============================================================================
// Tests
// =============================================================================
