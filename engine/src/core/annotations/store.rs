//! Annotation Store
//!
//! File conventions for annotation documents.
//! Storage: `{annotations_dir}/{video_stem}_annotations.json`

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::core::{CoreError, CoreResult};

use super::AnnotationSession;

// =============================================================================
// Constants
// =============================================================================

/// Suffix appended to the video stem to name its annotation file
pub const ANNOTATION_FILE_SUFFIX: &str = "_annotations.json";

/// Timestamp layout used in backup file names
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// =============================================================================
// File Helpers
// =============================================================================

/// Returns the annotation file path for a video: the video path with its
/// extension replaced by `_annotations.json`.
pub fn annotation_filename(video_path: &Path) -> PathBuf {
    let mut stem = video_path.with_extension("").into_os_string();
    stem.push(ANNOTATION_FILE_SUFFIX);
    PathBuf::from(stem)
}

/// Copies an existing annotation file to a timestamped sibling
/// (`name_backup_YYYYmmdd_HHMMSS.json`).
///
/// Best effort: returns `None` when there is nothing to back up or the copy
/// fails; failures are logged, never raised.
pub fn backup_annotations(annotation_path: &Path) -> Option<PathBuf> {
    if !annotation_path.exists() {
        return None;
    }

    let stem = annotation_path.file_stem()?.to_string_lossy();
    let timestamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT);
    let backup_path = annotation_path.with_file_name(format!("{}_backup_{}.json", stem, timestamp));

    match fs::copy(annotation_path, &backup_path) {
        Ok(_) => {
            info!(
                "Backed up {} to {}",
                annotation_path.display(),
                backup_path.display()
            );
            Some(backup_path)
        }
        Err(e) => {
            warn!(
                "Error creating backup of {}: {}",
                annotation_path.display(),
                e
            );
            None
        }
    }
}

/// Writes content atomically via a temp file in the same directory + rename
pub fn write_atomic(path: &Path, content: &str) -> CoreResult<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CoreError::Internal(format!("Invalid output path: {}", path.display())))?;
    let temp_path = path.with_file_name(format!(
        ".{}.tmp.{}",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    fs::write(&temp_path, content)?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

// =============================================================================
// Annotation Store
// =============================================================================

/// Directory of annotation documents, one per video
pub struct AnnotationStore {
    annotations_dir: PathBuf,
}

impl AnnotationStore {
    /// Creates a store rooted at the given directory
    pub fn new(annotations_dir: PathBuf) -> Self {
        Self { annotations_dir }
    }

    /// Returns the annotations directory path
    pub fn annotations_dir(&self) -> &Path {
        &self.annotations_dir
    }

    /// Ensures the annotations directory exists
    pub fn ensure_dir(&self) -> CoreResult<()> {
        if !self.annotations_dir.exists() {
            fs::create_dir_all(&self.annotations_dir)?;
        }
        Ok(())
    }

    /// Returns the annotation file path for a video file name
    pub fn path_for(&self, video_file: &str) -> PathBuf {
        let name = Path::new(video_file)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(video_file));
        annotation_filename(&self.annotations_dir.join(name))
    }

    /// Saves a session, optionally backing up the previous file first
    pub fn save(&self, session: &AnnotationSession, backup_existing: bool) -> CoreResult<PathBuf> {
        self.ensure_dir()?;

        let path = self.path_for(session.video_file());
        if backup_existing {
            backup_annotations(&path);
        }

        session.export_to_json(&path)?;
        Ok(path)
    }

    /// Loads the session for a video, or `None` if it was never saved
    pub fn load(&self, video_file: &str) -> CoreResult<Option<AnnotationSession>> {
        let path = self.path_for(video_file);
        if !path.exists() {
            return Ok(None);
        }

        let mut session = AnnotationSession::new();
        session.import_from_json(&path)?;
        Ok(Some(session))
    }

    /// Returns true if a saved session exists for the video
    pub fn exists(&self, video_file: &str) -> bool {
        self.path_for(video_file).exists()
    }

    /// Lists annotation files (backups and temp files excluded), sorted
    pub fn list_annotated(&self) -> CoreResult<Vec<PathBuf>> {
        if !self.annotations_dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.annotations_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') || name.contains("_backup_") {
                continue;
            }
            if name.ends_with(ANNOTATION_FILE_SUFFIX) {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, AnnotationStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path().join("annotations"));
        (temp_dir, store)
    }

    fn session_for(video: &str) -> AnnotationSession {
        let mut session = AnnotationSession::new();
        session.initialize_session(video, 60.0, 30.0);
        session
    }

    #[test]
    fn test_annotation_filename() {
        assert_eq!(
            annotation_filename(Path::new("/videos/test_video.mp4")),
            PathBuf::from("/videos/test_video_annotations.json")
        );
        assert_eq!(
            annotation_filename(Path::new("clip.MOV")),
            PathBuf::from("clip_annotations.json")
        );
        assert_eq!(
            annotation_filename(Path::new("noext")),
            PathBuf::from("noext_annotations.json")
        );
    }

    #[test]
    fn test_backup_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip_annotations.json");
        fs::write(&path, "{\"test\": \"data\"}").unwrap();

        let backup = backup_annotations(&path).unwrap();
        assert!(backup.exists());
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("clip_annotations_backup_"));
        assert!(name.ends_with(".json"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "{\"test\": \"data\"}");
    }

    #[test]
    fn test_backup_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(backup_annotations(&temp_dir.path().join("absent.json")).is_none());
    }

    #[test]
    fn test_write_atomic_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.json");
        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        let leftovers = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_save_and_load() {
        let (_temp_dir, store) = create_test_store();
        let mut session = session_for("beach.mp4");
        session.add_surfer(Some(3.0));

        let path = store.save(&session, false).unwrap();
        assert!(path.ends_with("beach_annotations.json"));
        assert!(store.exists("beach.mp4"));

        let loaded = store.load("beach.mp4").unwrap().unwrap();
        assert_eq!(loaded.surfer_count(), 1);
        assert_eq!(loaded.video_file(), "beach.mp4");
    }

    #[test]
    fn test_load_nonexistent() {
        let (_temp_dir, store) = create_test_store();
        assert!(store.load("nothing.mp4").unwrap().is_none());
    }

    #[test]
    fn test_save_with_backup_and_list() {
        let (_temp_dir, store) = create_test_store();
        let session = session_for("a.mp4");
        store.save(&session, true).unwrap();
        store.save(&session, true).unwrap();
        store.save(&session_for("b.mp4"), false).unwrap();

        let listed = store.list_annotated().unwrap();
        let names: Vec<_> = listed
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a_annotations.json", "b_annotations.json"]);

        let backups = fs::read_dir(store.annotations_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("_backup_"))
            .count();
        assert!(backups >= 1);
    }

    #[test]
    fn test_list_annotated_no_directory() {
        let (_temp_dir, store) = create_test_store();
        assert!(store.list_annotated().unwrap().is_empty());
    }
}
