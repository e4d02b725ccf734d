//! CSV Exporter
//!
//! Flattens a session snapshot into one row per surfer.
//!
//! ```text
//! video_file,surfer_id,start_time,end_time,duration,bbox_x,bbox_y,bbox_width,bbox_height,quality,created
//! clip.mp4,1,10.0,22.5,12.5,100.0,150.0,200.0,250.0,good,2024-01-01T00:00:00+00:00
//! ```

use super::{AnnotationData, Surfer};

/// Column order of the exported CSV
pub const CSV_COLUMNS: [&str; 11] = [
    "video_file",
    "surfer_id",
    "start_time",
    "end_time",
    "duration",
    "bbox_x",
    "bbox_y",
    "bbox_width",
    "bbox_height",
    "quality",
    "created",
];

/// Renders the snapshot as CSV. The header is written even when there are
/// no surfers.
pub fn export_csv(data: &AnnotationData) -> String {
    let mut output = String::new();
    output.push_str(&CSV_COLUMNS.join(","));
    output.push_str("\r\n");

    for surfer in &data.surfers {
        let row = surfer_row(&data.video_file, surfer);
        output.push_str(&row.join(","));
        output.push_str("\r\n");
    }

    output
}

fn surfer_row(video_file: &str, surfer: &Surfer) -> Vec<String> {
    let bbox = surfer.bbox.map(|b| b.to_array());
    let bbox_cell = |i: usize| bbox.map(|b| format_number(b[i])).unwrap_or_default();

    vec![
        escape_field(video_file),
        surfer.id.to_string(),
        optional_number(surfer.start_time),
        optional_number(surfer.end_time),
        optional_number(surfer.duration),
        bbox_cell(0),
        bbox_cell(1),
        bbox_cell(2),
        bbox_cell(3),
        surfer
            .quality
            .map(|q| q.as_str().to_string())
            .unwrap_or_default(),
        escape_field(&surfer.created),
    ]
}

fn optional_number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

/// Formats a number the way it appears in the JSON export (`10.0`, `12.5`)
fn format_number(value: f64) -> String {
    format!("{:?}", value)
}

/// Quotes a field when it contains a delimiter, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
