//! Surfer Annotation System
//!
//! Per-video annotation sessions: surfer time intervals, bounding boxes and
//! quality ratings, with validated JSON round trips and CSV export.
//!
//! Annotation documents live next to their video (or in an annotations
//! directory) as `{video_stem}_annotations.json`.

pub mod csv;
pub mod models;
pub mod session;
pub mod shared;
pub mod store;
pub mod validation;

pub use models::*;
pub use session::AnnotationSession;
pub use shared::SharedSession;
pub use store::{annotation_filename, backup_annotations, AnnotationStore};
pub use validation::{validate_annotation_value, MAX_SURFER_ID};
