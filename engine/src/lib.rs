//! Surfmark - Surf Video Annotation Engine
//!
//! Library behind the surfmark annotator: surfer session records, statistics,
//! JSON and CSV persistence, and the drawing/timeline helpers used by the UI.

pub mod core;

use std::path::Path;
use std::sync::OnceLock;

use tracing_subscriber::fmt::MakeWriter;

/// Keeps the non-blocking file writer alive for the life of the process.
static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Log file prefix inside the log directory
pub const LOG_FILE_NAME: &str = "surfmark.log";

/// Installs the global tracing subscriber.
///
/// Console output goes to `console` (e.g. `std::io::stdout`, or
/// `std::io::stderr` when stdout carries program output); with `log_dir`,
/// logs also go to a daily-rolling file. `RUST_LOG` directives are honored
/// and `default_level` applies otherwise. Calling this more than once is a
/// no-op.
pub fn init_logging<W>(default_level: tracing::Level, log_dir: Option<&Path>, console: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(console)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = log_dir.and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create log directory {}: {}", dir.display(), e);
            return None;
        }

        let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer);

    // Avoid panics if already initialized (tests, repeated CLI setup).
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Parses a level name from settings, falling back to INFO
pub fn parse_level(level: &str) -> tracing::Level {
    level.trim().parse().unwrap_or(tracing::Level::INFO)
}
