//! SurfMark CLI
//!
//! Headless access to annotation files: create sessions, inspect statistics,
//! query active surfers, validate, back up and export to CSV. Results are
//! printed to stdout (JSON where structured); logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use surfmark_lib::core::annotations::{
    backup_annotations, AnnotationSession, AnnotationStore, Surfer,
};
use surfmark_lib::core::settings::{AnnotatorSettings, SettingsManager};
use surfmark_lib::core::video::{FfprobeProvider, VideoMetadataProvider};

#[derive(Parser, Debug)]
#[command(name = "surfmark-cli", version, about = "Surf video annotation tools")]
struct Cli {
    /// Settings directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty annotation file for a video
    Init {
        video: PathBuf,
        /// Duration in seconds; probes the video with ffprobe when omitted
        #[arg(long)]
        duration: Option<f64>,
        /// Frame rate used with --duration (defaults to the settings value)
        #[arg(long)]
        fps: Option<f64>,
        /// Overwrite an existing annotation file
        #[arg(long)]
        force: bool,
    },
    /// Print session statistics as JSON
    Stats { annotations: PathBuf },
    /// Print the surfers active at a timestamp as JSON
    Active {
        annotations: PathBuf,
        timestamp: f64,
    },
    /// Export an annotation file to CSV
    ExportCsv {
        annotations: PathBuf,
        /// Output path (defaults to the input with a .csv extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that an annotation file loads cleanly
    Validate { annotations: PathBuf },
    /// Copy an annotation file to a timestamped backup
    Backup { annotations: PathBuf },
    /// Print video metadata as JSON
    Probe { video: PathBuf },
    /// Show or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the current settings as JSON
    Show,
    /// Update settings; omitted options keep their current value
    Set {
        /// Directory for annotation files
        #[arg(long)]
        annotations_dir: Option<PathBuf>,
        /// Store annotation files next to their videos again
        #[arg(long, conflicts_with = "annotations_dir")]
        clear_annotations_dir: bool,
        #[arg(long)]
        backup_on_save: Option<bool>,
        /// Frame rate assumed by `init --duration` when --fps is omitted
        #[arg(long)]
        default_fps: Option<f64>,
        #[arg(long)]
        log_level: Option<String>,
        #[arg(long)]
        log_to_file: Option<bool>,
    },
    /// Delete the settings file and print the defaults
    Reset,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport {
    video_file: String,
    surfer_count: usize,
    next_surfer_id: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_dir = cli
        .settings_dir
        .clone()
        .unwrap_or_else(SettingsManager::default_dir);
    let manager = SettingsManager::new(settings_dir.clone());
    let settings = manager.load();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        surfmark_lib::parse_level(&settings.logging.level)
    };
    let log_dir = settings
        .logging
        .log_to_file
        .then(|| settings_dir.join("logs"));
    surfmark_lib::init_logging(level, log_dir.as_deref(), std::io::stderr);

    debug!("Using settings from {}", settings_dir.display());
    run(cli.command, &manager, &settings)
}

fn run(command: Command, manager: &SettingsManager, settings: &AnnotatorSettings) -> Result<()> {
    match command {
        Command::Init {
            video,
            duration,
            fps,
            force,
        } => {
            let path = init_session(&video, duration, fps, force, settings)?;
            println!("{}", path.display());
        }
        Command::Stats { annotations } => {
            let session = load_session(&annotations)?;
            print_json(&session.get_statistics())?;
        }
        Command::Active {
            annotations,
            timestamp,
        } => {
            let session = load_session(&annotations)?;
            let active: Vec<Surfer> = session.get_active_surfers(timestamp);
            print_json(&active)?;
        }
        Command::ExportCsv {
            annotations,
            output,
        } => {
            let session = load_session(&annotations)?;
            let output = output.unwrap_or_else(|| annotations.with_extension("csv"));
            session
                .export_to_csv(&output)
                .with_context(|| format!("Failed to export {}", output.display()))?;
            println!("{}", output.display());
        }
        Command::Validate { annotations } => {
            let session = load_session(&annotations)?;
            print_json(&ValidationReport {
                video_file: session.video_file().to_string(),
                surfer_count: session.surfer_count(),
                next_surfer_id: session.next_surfer_id(),
            })?;
        }
        Command::Backup { annotations } => {
            if !annotations.exists() {
                bail!("Annotation file not found: {}", annotations.display());
            }
            match backup_annotations(&annotations) {
                Some(path) => println!("{}", path.display()),
                None => bail!("Failed to back up {}", annotations.display()),
            }
        }
        Command::Probe { video } => {
            let metadata = FfprobeProvider::default()
                .probe(&video)
                .with_context(|| format!("Failed to probe {}", video.display()))?;
            print_json(&metadata)?;
        }
        Command::Config { action } => {
            let updated = configure(manager, settings, action)?;
            print_json(&updated)?;
        }
    }
    Ok(())
}

/// Applies a `config` action and returns the settings now in effect
fn configure(
    manager: &SettingsManager,
    settings: &AnnotatorSettings,
    action: ConfigAction,
) -> Result<AnnotatorSettings> {
    match action {
        ConfigAction::Show => Ok(settings.clone()),
        ConfigAction::Set {
            annotations_dir,
            clear_annotations_dir,
            backup_on_save,
            default_fps,
            log_level,
            log_to_file,
        } => {
            let mut updated = settings.clone();
            if clear_annotations_dir {
                updated.annotations.annotations_dir = None;
            } else if annotations_dir.is_some() {
                updated.annotations.annotations_dir = annotations_dir;
            }
            if let Some(backup_on_save) = backup_on_save {
                updated.annotations.backup_on_save = backup_on_save;
            }
            if let Some(fps) = default_fps {
                updated.playback.default_fps = fps;
            }
            if let Some(level) = log_level {
                updated.logging.level = level;
            }
            if let Some(log_to_file) = log_to_file {
                updated.logging.log_to_file = log_to_file;
            }

            let saved = manager
                .save(&updated)
                .with_context(|| format!("Failed to save {}", manager.settings_path().display()))?;
            info!("Settings updated");
            Ok(saved)
        }
        ConfigAction::Reset => Ok(manager.reset()?),
    }
}



/// Creates and saves an empty session for `video`, returning the file path
fn init_session(
    video: &Path,
    duration: Option<f64>,
    fps: Option<f64>,
    force: bool,
    settings: &AnnotatorSettings,
) -> Result<PathBuf> {
    let session = match duration {
        Some(duration) => {
            let name = video
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| video.display().to_string());
            let fps = fps.unwrap_or(settings.playback.default_fps);
            let mut session = AnnotationSession::new();
            session.initialize_session(&name, duration, fps);
            session
        }
        None => {
            let metadata = FfprobeProvider::default()
                .probe(video)
                .with_context(|| format!("Failed to probe {}", video.display()))?;
            AnnotationSession::from_video(&metadata)
        }
    };

    let store = store_for(video, settings);
    if store.exists(session.video_file()) && !force {
        bail!(
            "Annotations already exist at {} (use --force to overwrite)",
            store.path_for(session.video_file()).display()
        );
    }

    let path = store.save(&session, settings.annotations.backup_on_save)?;
    info!("Created annotation session at {}", path.display());
    Ok(path)
}

/// Annotation files live in the configured directory, or next to the video
fn store_for(video: &Path, settings: &AnnotatorSettings) -> AnnotationStore {
    let dir = settings
        .annotations
        .annotations_dir
        .clone()
        .or_else(|| video.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    AnnotationStore::new(dir)
}

fn load_session(path: &Path) -> Result<AnnotationSession> {
    let mut session = AnnotationSession::new();
    session
        .import_from_json(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(session)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
