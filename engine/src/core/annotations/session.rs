//! Annotation Session
//!
//! Owns one video's surfer records and session metadata. Every mutation
//! keeps the record invariants (unique monotonic ids, derived durations,
//! valid boxes and ratings, `start < end`) and refreshes the modification
//! timestamp. Failed operations leave the session untouched.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::video::VideoMetadata;
use crate::core::{now_iso8601, CoreError, CoreResult, SurferId, TimeSec};

use super::store::write_atomic;
use super::{
    csv, validate_annotation_value, AnnotationData, BoundingBox, Quality, SessionStatistics,
    Surfer, DEFAULT_FPS,
};

/// In-memory annotation state for a single video
#[derive(Clone, Debug)]
pub struct AnnotationSession {
    video_file: String,
    duration: TimeSec,
    fps: f64,
    surfers: Vec<Surfer>,
    next_surfer_id: SurferId,
    session_created: String,
    session_modified: String,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationSession {
    /// Creates an empty session with no video attached
    pub fn new() -> Self {
        let now = now_iso8601();
        Self {
            video_file: String::new(),
            duration: 0.0,
            fps: DEFAULT_FPS,
            surfers: Vec::new(),
            next_surfer_id: 1,
            session_created: now.clone(),
            session_modified: now,
        }
    }

    /// Creates a session initialized from probed video metadata
    pub fn from_video(metadata: &VideoMetadata) -> Self {
        let mut session = Self::new();
        session.initialize_session(&metadata.file_name(), metadata.duration, metadata.fps);
        session
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resets the session to an empty state for the given video.
    ///
    /// A negative or non-finite duration becomes 0 and a non-positive or
    /// non-finite frame rate becomes [`DEFAULT_FPS`], so every initialized
    /// session exports a document that loads back.
    pub fn initialize_session(&mut self, video_file: &str, duration: TimeSec, fps: f64) {
        let duration = if duration.is_finite() && duration >= 0.0 {
            duration
        } else {
            warn!("Invalid video duration {}, using 0", duration);
            0.0
        };
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            warn!("Invalid frame rate {}, using {}", fps, DEFAULT_FPS);
            DEFAULT_FPS
        };

        let now = now_iso8601();
        self.video_file = video_file.to_string();
        self.duration = duration;
        self.fps = fps;
        self.surfers.clear();
        self.next_surfer_id = 1;
        self.session_created = now.clone();
        self.session_modified = now;

        info!(
            "Initialized annotation session for {} ({:.2}s @ {:.2} fps)",
            video_file, duration, fps
        );
    }

    pub fn video_file(&self) -> &str {
        &self.video_file
    }

    pub fn duration(&self) -> TimeSec {
        self.duration
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn session_created(&self) -> &str {
        &self.session_created
    }

    pub fn session_modified(&self) -> &str {
        &self.session_modified
    }

    /// Returns the id the next added surfer will receive
    pub fn next_surfer_id(&self) -> SurferId {
        self.next_surfer_id
    }

    pub fn surfer_count(&self) -> usize {
        self.surfers.len()
    }

    fn touch(&mut self) {
        self.session_modified = now_iso8601();
    }

    // =========================================================================
    // Surfer CRUD
    // =========================================================================

    /// Adds a surfer with the next id and returns that id
    pub fn add_surfer(&mut self, start_time: Option<TimeSec>) -> SurferId {
        let id = self.next_surfer_id;
        self.next_surfer_id = id.saturating_add(1);

        self.surfers.push(Surfer::new(id, start_time));
        self.touch();

        debug!("Added surfer {} (start: {:?})", id, start_time);
        id
    }

    /// Removes a surfer. Returns false if no surfer has this id.
    pub fn delete_surfer(&mut self, id: SurferId) -> bool {
        match self.surfers.iter().position(|s| s.id == id) {
            Some(index) => {
                self.surfers.remove(index);
                self.touch();
                debug!("Deleted surfer {}", id);
                true
            }
            None => {
                debug!("Delete ignored, surfer {} not found", id);
                false
            }
        }
    }

    /// Returns a copy of the surfer with this id
    pub fn get_surfer(&self, id: SurferId) -> Option<Surfer> {
        self.surfers.iter().find(|s| s.id == id).cloned()
    }

    /// Returns copies of all surfers in insertion order
    pub fn get_all_surfers(&self) -> Vec<Surfer> {
        self.surfers.clone()
    }

    fn surfer_mut(&mut self, id: SurferId) -> CoreResult<&mut Surfer> {
        self.surfers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(CoreError::SurferNotFound(id))
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Sets the start time and recomputes the duration.
    ///
    /// Rejected when the surfer already has an end time at or before `start_time`.
    pub fn set_surfer_start_time(&mut self, id: SurferId, start_time: TimeSec) -> CoreResult<()> {
        let surfer = self.surfer_mut(id)?;
        check_interval(Some(start_time), surfer.end_time).inspect_err(|e| {
            warn!("Rejected start time for surfer {}: {}", id, e);
        })?;

        surfer.start_time = Some(start_time);
        surfer.recompute_duration();
        self.touch();

        debug!("Surfer {} start time set to {}", id, start_time);
        Ok(())
    }

    /// Sets the end time and recomputes the duration.
    ///
    /// Rejected when the surfer already has a start time at or after `end_time`.
    pub fn set_surfer_end_time(&mut self, id: SurferId, end_time: TimeSec) -> CoreResult<()> {
        let surfer = self.surfer_mut(id)?;
        check_interval(surfer.start_time, Some(end_time)).inspect_err(|e| {
            warn!("Rejected end time for surfer {}: {}", id, e);
        })?;

        surfer.end_time = Some(end_time);
        surfer.recompute_duration();
        self.touch();

        debug!("Surfer {} end time set to {}", id, end_time);
        Ok(())
    }

    /// Clears the end time, making the surfer open-ended again
    pub fn clear_surfer_end_time(&mut self, id: SurferId) -> CoreResult<()> {
        let surfer = self.surfer_mut(id)?;
        surfer.end_time = None;
        surfer.recompute_duration();
        self.touch();
        Ok(())
    }

    /// Sets the bounding box `[x, y, width, height]`.
    ///
    /// The box is validated before the surfer is looked up; an invalid box
    /// never replaces the previous value.
    pub fn set_surfer_bbox(&mut self, id: SurferId, bbox: [f64; 4]) -> CoreResult<()> {
        let bbox = BoundingBox::try_from(bbox).inspect_err(|e| {
            warn!("Rejected bounding box for surfer {}: {}", id, e);
        })?;

        self.surfer_mut(id)?.bbox = Some(bbox);
        self.touch();

        debug!("Surfer {} bounding box set to {:?}", id, bbox.to_array());
        Ok(())
    }

    /// Sets the quality rating (`poor`, `average`, `good` or `excellent`)
    pub fn set_surfer_quality(&mut self, id: SurferId, quality: &str) -> CoreResult<()> {
        let quality: Quality = quality.parse().inspect_err(|e| {
            warn!("Rejected quality for surfer {}: {}", id, e);
        })?;

        self.surfer_mut(id)?.quality = Some(quality);
        self.touch();

        debug!("Surfer {} quality set to {}", id, quality);
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns copies of the surfers present at `timestamp`, in collection order
    pub fn get_active_surfers(&self, timestamp: TimeSec) -> Vec<Surfer> {
        self.surfers
            .iter()
            .filter(|s| s.is_active_at(timestamp))
            .cloned()
            .collect()
    }

    /// Returns a full serializable snapshot of the session
    pub fn get_annotation_data(&self) -> AnnotationData {
        AnnotationData {
            video_file: self.video_file.clone(),
            duration: self.duration,
            fps: self.fps,
            session_created: self.session_created.clone(),
            session_modified: self.session_modified.clone(),
            surfer_count: self.surfers.len(),
            surfers: self.surfers.clone(),
        }
    }

    /// Aggregates completion and ride-duration figures
    pub fn get_statistics(&self) -> SessionStatistics {
        let total = self.surfers.len();
        let completed = self.surfers.iter().filter(|s| s.is_completed()).count();
        let durations: Vec<f64> = self.surfers.iter().filter_map(|s| s.duration).collect();

        let mut stats = SessionStatistics {
            total_surfers: total,
            completed_surfers: completed,
            ..SessionStatistics::default()
        };

        if total > 0 {
            stats.completion_rate = completed as f64 / total as f64;
        }

        if !durations.is_empty() {
            stats.avg_ride_duration = durations.iter().sum::<f64>() / durations.len() as f64;
            stats.max_ride_duration = durations.iter().copied().fold(f64::MIN, f64::max);
            stats.min_ride_duration = durations.iter().copied().fold(f64::MAX, f64::min);
        }

        for quality in self.surfers.iter().filter_map(|s| s.quality) {
            *stats.quality_distribution.entry(quality).or_insert(0) += 1;
        }

        stats
    }

    // =========================================================================
    // Load / Import / Export
    // =========================================================================

    /// Replaces the whole session with a validated annotation document.
    ///
    /// The document is fully validated before anything is committed, so a
    /// rejected load leaves the current session exactly as it was.
    pub fn load_annotation_data(&mut self, data: &Value) -> CoreResult<()> {
        let parsed = validate_annotation_value(data).inspect_err(|e| {
            warn!("Error loading annotation data: {}", e);
        })?;
        self.commit(parsed);
        Ok(())
    }

    fn commit(&mut self, data: AnnotationData) {
        self.next_surfer_id = data
            .surfers
            .iter()
            .map(|s| s.id)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        self.video_file = data.video_file;
        self.duration = data.duration;
        self.fps = data.fps;
        self.session_created = data.session_created;
        self.surfers = data.surfers;
        self.touch();

        info!(
            "Loaded {} surfers for {}",
            self.surfers.len(),
            self.video_file
        );
    }

    /// Writes the snapshot as pretty-printed JSON
    pub fn export_to_json(&self, path: &Path) -> CoreResult<()> {
        let content = serde_json::to_string_pretty(&self.get_annotation_data())?;
        write_atomic(path, &content).inspect_err(|e| {
            warn!("Error exporting to JSON {}: {}", path.display(), e);
        })?;

        info!("Exported {} surfers to {}", self.surfers.len(), path.display());
        Ok(())
    }

    /// Loads a JSON annotation file.
    ///
    /// Returns [`CoreError::FileNotFound`] when the file does not exist; any
    /// parse or validation failure leaves the session unchanged.
    pub fn import_from_json(&mut self, path: &Path) -> CoreResult<()> {
        if !path.exists() {
            warn!("Annotation file not found: {}", path.display());
            return Err(CoreError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;
        let data: Value = serde_json::from_str(&content).inspect_err(|e| {
            warn!("Error importing from JSON {}: {}", path.display(), e);
        })?;

        self.load_annotation_data(&data)
    }

    /// Writes one CSV row per surfer, with a header row
    pub fn export_to_csv(&self, path: &Path) -> CoreResult<()> {
        let content = csv::export_csv(&self.get_annotation_data());
        write_atomic(path, &content).inspect_err(|e| {
            warn!("Error exporting to CSV {}: {}", path.display(), e);
        })?;

        info!("Exported CSV to {}", path.display());
        Ok(())
    }
}

/// Rejects non-finite times and intervals where start is not before end
fn check_interval(start: Option<TimeSec>, end: Option<TimeSec>) -> CoreResult<()> {
    for time in [start, end].into_iter().flatten() {
        if !time.is_finite() {
            return Err(CoreError::ValidationError(format!(
                "Time must be a finite number, got {}",
                time
            )));
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(CoreError::InvalidTimeRange(start, end));
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
