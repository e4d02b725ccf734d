//! Timeline Helpers
//!
//! Geometry shared by timeline widgets: time labels, click-to-seek and the
//! horizontal span each surfer occupies in its lane.

use serde::{Deserialize, Serialize};

use crate::core::annotations::Surfer;
use crate::core::{SurferId, TimeSec};

/// Formats seconds as `MM:SS`
pub fn format_time(seconds: TimeSec) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Converts a click position on a timeline of `width` pixels to a timestamp,
/// clamped to `[0, duration]`
pub fn click_to_time(click_x: f64, width: f64, duration: TimeSec) -> TimeSec {
    if click_x <= 0.0 || width <= 0.0 {
        return 0.0;
    }
    if click_x >= width {
        return duration;
    }
    click_x / width * duration
}

/// Horizontal extent of one surfer's lane segment, in pixels
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurferSpan {
    pub surfer_id: SurferId,
    /// Lane index, following the surfer order
    pub lane: usize,
    pub start_x: f64,
    pub end_x: f64,
    /// True when the surfer has no end time and the span runs to the edge
    pub open_ended: bool,
}

/// Lays out surfer spans for a timeline `width` pixels wide.
///
/// Surfers without a start time get a lane but no span.
pub fn surfer_spans(surfers: &[Surfer], duration: TimeSec, width: f64) -> Vec<SurferSpan> {
    if duration <= 0.0 || width <= 0.0 {
        return Vec::new();
    }

    let to_x = |t: TimeSec| (t / duration * width).clamp(0.0, width);

    surfers
        .iter()
        .enumerate()
        .filter_map(|(lane, surfer)| {
            let start = surfer.start_time?;
            let (end_x, open_ended) = match surfer.interval() {
                Some(range) => (to_x(range.end_sec), false),
                None => (width, true),
            };
            Some(SurferSpan {
                surfer_id: surfer.id,
                lane,
                start_x: to_x(start),
                end_x,
                open_ended,
            })
        })
        .collect()
}
