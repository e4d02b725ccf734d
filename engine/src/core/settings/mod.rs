//! Settings Persistence System
//!
//! Annotator preferences stored as JSON. Unknown or out-of-range values are
//! corrected on load and save; writes are atomic and serialized through an
//! advisory lock file.
//!
//! Storage location: {config_dir}/surfmark/settings.json

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::annotations::store::write_atomic;
use crate::core::CoreResult;

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "surfmark";

/// Annotator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatorSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub annotations: AnnotationSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AnnotatorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            annotations: AnnotationSettings::default(),
            playback: PlaybackSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AnnotatorSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected instead of rejected.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.playback.default_fps = clamp_f64(self.playback.default_fps, 1.0, 240.0);

        self.logging.level = normalize_enum(
            &self.logging.level,
            &["error", "warn", "info", "debug", "trace"],
            default_log_level(),
        );
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    let lowered = value.trim().to_ascii_lowercase();
    if allowed.contains(&lowered.as_str()) {
        lowered
    } else {
        fallback
    }
}

/// Where annotation files go and how they are protected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSettings {
    /// Directory for annotation files; `None` keeps them next to the video
    #[serde(default)]
    pub annotations_dir: Option<PathBuf>,

    /// Copy the previous annotation file aside before overwriting it
    #[serde(default = "default_true")]
    pub backup_on_save: bool,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            annotations_dir: None,
            backup_on_save: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Frame rate assumed when a video reports none
    #[serde(default = "default_fps")]
    pub default_fps: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_fps: default_fps(),
        }
    }
}

fn default_fps() -> f64 {
    30.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write a daily-rolling log file under the settings directory
    #[serde(default)]
    pub log_to_file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager with the given settings directory
    pub fn new(settings_dir: PathBuf) -> Self {
        Self {
            settings_path: settings_dir.join(SETTINGS_FILE),
        }
    }

    /// Returns the platform settings directory (`{config_dir}/surfmark`)
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_dir().join(SETTINGS_LOCK_FILE)
    }

    /// Runs `op` while holding the settings lock file
    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        fs::create_dir_all(self.settings_dir())?;

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            lock_file.lock_exclusive()?;
        } else {
            lock_file.lock_shared()?;
        }

        let result = op();

        if let Err(e) = FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Get the directory holding the settings file
    pub fn settings_dir(&self) -> &Path {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
    }

    /// Load settings from disk.
    ///
    /// A missing, unreadable or corrupt file yields defaults.
    pub fn load(&self) -> AnnotatorSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(AnnotatorSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings: AnnotatorSettings = serde_json::from_str(&content)?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = self.migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        });

        result.unwrap_or_else(|e| {
            warn!("Failed to load settings, using defaults: {}", e);
            AnnotatorSettings::default()
        })
    }

    /// Normalizes and writes settings, returning what was persisted
    pub fn save(&self, settings: &AnnotatorSettings) -> CoreResult<AnnotatorSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            let content = serde_json::to_string_pretty(&normalized)?;
            write_atomic(&self.settings_path, &content)?;

            info!("Settings saved to {}", self.settings_path.display());
            Ok(normalized)
        })
    }

    /// Deletes the settings file and returns the defaults
    pub fn reset(&self) -> CoreResult<AnnotatorSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(AnnotatorSettings::default())
        })
    }

    /// Migrate settings from older version
    fn migrate(&self, mut settings: AnnotatorSettings) -> AnnotatorSettings {
        settings.version = SETTINGS_VERSION;
        settings
    }
}
