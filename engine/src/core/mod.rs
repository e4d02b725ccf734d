//! Surfmark Core Engine
//!
//! Annotation session model, persistence and the helpers the annotator UI
//! builds on (bounding box drawing, timeline geometry, video metadata).

pub mod annotations;
pub mod drawing;
pub mod settings;
pub mod timeline;
pub mod video;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_destructive;
