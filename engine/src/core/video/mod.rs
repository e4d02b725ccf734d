//! Video Metadata Module
//!
//! The annotation session only needs a video's duration, frame rate and
//! frame size. This module describes that metadata, converts between
//! timestamps and frame numbers, and probes files with FFprobe.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, Frame, Size2D, TimeSec};

use super::annotations::BoundingBox;

/// Video container extensions accepted for annotation
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mkv", "wmv"];

// =============================================================================
// Types
// =============================================================================

/// Metadata of a loaded video
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub path: PathBuf,
    pub fps: f64,
    pub frame_count: u64,
    /// Duration in seconds
    pub duration: TimeSec,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    /// Returns the file name used to label annotation sessions
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }

    /// Converts a timestamp to the frame shown at that time (0 if fps is unknown)
    pub fn timestamp_to_frame(&self, timestamp: TimeSec) -> Frame {
        if self.fps > 0.0 {
            (timestamp * self.fps).floor() as Frame
        } else {
            0
        }
    }

    /// Converts a frame number to its timestamp (0 if fps is unknown)
    pub fn frame_to_timestamp(&self, frame: Frame) -> TimeSec {
        if self.fps > 0.0 {
            frame as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Returns true if `0 <= timestamp <= duration`
    pub fn is_valid_timestamp(&self, timestamp: TimeSec) -> bool {
        (0.0..=self.duration).contains(&timestamp)
    }

    pub fn frame_dimensions(&self) -> Size2D {
        Size2D::new(self.width, self.height)
    }

    /// Returns true if the box is well-formed and inside the frame
    pub fn is_valid_bbox(&self, bbox: &BoundingBox) -> bool {
        bbox.validate().is_ok() && bbox.fits_within(self.frame_dimensions())
    }
}

/// Returns true if the path exists and has a supported video extension
pub fn is_supported_video_path(path: &Path) -> bool {
    path.exists() && has_supported_extension(path)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

// =============================================================================
// Metadata Provider
// =============================================================================

/// Source of video metadata for annotation sessions
pub trait VideoMetadataProvider {
    fn probe(&self, path: &Path) -> CoreResult<VideoMetadata>;
}

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

/// Metadata provider backed by the `ffprobe` binary
#[derive(Clone, Debug)]
pub struct FfprobeProvider {
    binary: PathBuf,
}

impl Default for FfprobeProvider {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
        }
    }
}

impl FfprobeProvider {
    /// Uses a specific ffprobe binary instead of the one on `PATH`
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Check if FFprobe is available on the system
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Parse FFprobe JSON output into VideoMetadata
    fn parse_output(path: &Path, json: &str) -> CoreResult<VideoMetadata> {
        let output: FFprobeOutput = serde_json::from_str(json).map_err(|e| {
            CoreError::FFprobeError(format!("Failed to parse ffprobe output: {}", e))
        })?;

        let stream = output
            .streams
            .unwrap_or_default()
            .into_iter()
            .find(|s| s.codec_type == "video")
            .ok_or_else(|| {
                CoreError::FFprobeError(format!("No video stream in {}", path.display()))
            })?;

        let fps = stream
            .r_frame_rate
            .as_deref()
            .map(parse_frame_rate)
            .unwrap_or(0.0);

        let duration = output
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let frame_count = stream
            .nb_frames
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or_else(|| (duration * fps).round().max(0.0) as u64);

        Ok(VideoMetadata {
            path: path.to_path_buf(),
            fps,
            frame_count,
            duration,
            width: stream.width.unwrap_or(0),
            height: stream.height.unwrap_or(0),
        })
    }
}

impl VideoMetadataProvider for FfprobeProvider {
    fn probe(&self, path: &Path) -> CoreResult<VideoMetadata> {
        if !path.exists() {
            return Err(CoreError::FileNotFound(path.display().to_string()));
        }
        if !has_supported_extension(path) {
            return Err(CoreError::UnsupportedVideoFormat(path.display().to_string()));
        }

        let output = Command::new(&self.binary)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| CoreError::FFprobeError(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::FFprobeError(format!(
                "Cannot open video file (corrupted or unsupported): {}",
                stderr
            )));
        }

        Self::parse_output(path, &String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse frame rate string (e.g., "30/1" or "24000/1001"); 0 when unparseable
fn parse_frame_rate(fps_str: &str) -> f64 {
    match fps_str.split_once('/') {
        Some((num, den)) => match (num.parse::<f64>(), den.parse::<f64>()) {
            (Ok(num), Ok(den)) if den > 0.0 => num / den,
            _ => 0.0,
        },
        None => fps_str.parse().unwrap_or(0.0),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            path: PathBuf::from("/videos/clip.mp4"),
            fps: 30.0,
            frame_count: 3600,
            duration: 120.0,
            width: 1920,
            height: 1080,
        }
    }

    #[test]
    fn test_frame_conversions() {
        let meta = metadata();
        assert_eq!(meta.timestamp_to_frame(0.0), 0);
        assert_eq!(meta.timestamp_to_frame(1.0), 30);
        assert_eq!(meta.timestamp_to_frame(2.5), 75);
        assert_eq!(meta.frame_to_timestamp(30), 1.0);
        assert_eq!(meta.frame_to_timestamp(75), 2.5);
    }

    #[test]
    fn test_frame_conversions_zero_fps() {
        let meta = VideoMetadata {
            fps: 0.0,
            ..metadata()
        };
        assert_eq!(meta.timestamp_to_frame(10.0), 0);
        assert_eq!(meta.frame_to_timestamp(10), 0.0);
    }

    #[test]
    fn test_valid_timestamp() {
        let meta = metadata();
        assert!(meta.is_valid_timestamp(0.0));
        assert!(meta.is_valid_timestamp(120.0));
        assert!(!meta.is_valid_timestamp(-0.1));
        assert!(!meta.is_valid_timestamp(120.1));
    }

    #[test]
    fn test_bbox_within_frame() {
        let meta = metadata();
        let inside = BoundingBox::new(100.0, 100.0, 200.0, 200.0).unwrap();
        let outside = BoundingBox::new(1800.0, 100.0, 200.0, 200.0).unwrap();
        assert!(meta.is_valid_bbox(&inside));
        assert!(!meta.is_valid_bbox(&outside));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(metadata().file_name(), "clip.mp4");
    }

    #[test]
    fn test_supported_video_path() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.mp4", "b.MOV", "c.avi", "d.mkv", "e.wmv"] {
            let path = temp_dir.path().join(name);
            std::fs::write(&path, b"").unwrap();
            assert!(is_supported_video_path(&path), "{}", name);
        }

        let text = temp_dir.path().join("notes.txt");
        std::fs::write(&text, b"").unwrap();
        assert!(!is_supported_video_path(&text));
        assert!(!is_supported_video_path(&temp_dir.path().join("missing.mp4")));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), 30.0);
        assert!((parse_frame_rate("30000/1001") - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("30/0"), 0.0);
        assert_eq!(parse_frame_rate("invalid"), 0.0);
        assert_eq!(parse_frame_rate("25"), 25.0);
    }

    #[test]
    fn test_parse_ffprobe_output() {
        let json = r#"{
            "streams": [
                { "codec_type": "audio" },
                {
                    "codec_type": "video",
                    "width": 1280,
                    "height": 720,
                    "r_frame_rate": "25/1",
                    "nb_frames": "250"
                }
            ],
            "format": { "duration": "10.0" }
        }"#;

        let meta = FfprobeProvider::parse_output(Path::new("surf.mp4"), json).unwrap();
        assert_eq!(meta.fps, 25.0);
        assert_eq!(meta.frame_count, 250);
        assert_eq!(meta.duration, 10.0);
        assert_eq!(meta.frame_dimensions(), Size2D::new(1280, 720));
    }

    #[test]
    fn test_parse_ffprobe_output_estimates_frames() {
        let json = r#"{
            "streams": [{ "codec_type": "video", "r_frame_rate": "30/1" }],
            "format": { "duration": "2.0" }
        }"#;
        let meta = FfprobeProvider::parse_output(Path::new("surf.mp4"), json).unwrap();
        assert_eq!(meta.frame_count, 60);
    }

    #[test]
    fn test_parse_ffprobe_output_without_video() {
        let json = r#"{ "streams": [{ "codec_type": "audio" }] }"#;
        assert!(matches!(
            FfprobeProvider::parse_output(Path::new("a.mp4"), json),
            Err(CoreError::FFprobeError(_))
        ));
    }

    #[test]
    fn test_probe_missing_file() {
        let provider = FfprobeProvider::default();
        assert!(matches!(
            provider.probe(Path::new("/definitely/not/here.mp4")),
            Err(CoreError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_probe_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.txt");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            FfprobeProvider::default().probe(&path),
            Err(CoreError::UnsupportedVideoFormat(_))
        ));
    }

    #[test]
    fn test_ffprobe_availability_check() {
        let _is_available = FfprobeProvider::default().is_available();
    }
}
