//! Destructive and Edge Case Tests for Core Models
//!
//! These tests verify the robustness of the session against invalid inputs,
//! malformed documents and degenerate numeric values.

use serde_json::json;

use crate::core::annotations::{AnnotationSession, BoundingBox, Quality};
use crate::core::timeline::{click_to_time, format_time};
use crate::core::{CoreError, TimeRange};

fn session_with_one_surfer() -> AnnotationSession {
    let mut session = AnnotationSession::new();
    session.initialize_session("clip.mp4", 120.0, 30.0);
    session.add_surfer(Some(10.0));
    session
}

#[test]
fn test_destructive_time_range_inversion() {
    let range = TimeRange::new(10.0, 5.0);
    assert_eq!(range.start_sec, 5.0);
    assert_eq!(range.end_sec, 10.0);
}

#[test]
fn test_destructive_bbox_non_finite() {
    assert!(BoundingBox::new(f64::NAN, 0.0, 10.0, 10.0).is_err());
    assert!(BoundingBox::new(0.0, 0.0, f64::INFINITY, 10.0).is_err());
    assert!(BoundingBox::try_from([0.0, 0.0, 0.0, 10.0]).is_err());
    assert!(BoundingBox::try_from([-1.0, 0.0, 5.0, 10.0]).is_err());
}

#[test]
fn test_destructive_non_finite_times() {
    let mut session = session_with_one_surfer();
    assert!(session.set_surfer_start_time(1, f64::NAN).is_err());
    assert!(session.set_surfer_end_time(1, f64::INFINITY).is_err());

    let surfer = session.get_surfer(1).unwrap();
    assert_eq!(surfer.start_time, Some(10.0));
    assert_eq!(surfer.end_time, None);
}

#[test]
fn test_destructive_quality_strings() {
    let mut session = session_with_one_surfer();
    for bad in ["", "GREAT", " good", "excellent!"] {
        assert!(matches!(
            session.set_surfer_quality(1, bad),
            Err(CoreError::InvalidQuality(_))
        ));
    }
    assert!("fair".parse::<Quality>().is_err());
    assert_eq!("good".parse::<Quality>().unwrap(), Quality::Good);
}

#[test]
fn test_destructive_malformed_documents() {
    let mut session = session_with_one_surfer();
    let before = session.get_annotation_data();

    let documents = [
        json!(null),
        json!([]),
        json!("clip.mp4"),
        json!({ "video_file": "a.mp4", "duration": 10.0 }),
        json!({ "video_file": "a.mp4", "duration": 10.0, "surfers": {} }),
        json!({ "video_file": "a.mp4", "duration": 10.0, "surfers": [42] }),
        json!({ "video_file": 7, "duration": 10.0, "surfers": [] }),
        json!({ "video_file": "a.mp4", "duration": -1.0, "surfers": [] }),
        json!({ "video_file": "a.mp4", "duration": 10.0, "fps": 0.0, "surfers": [] }),
        json!({
            "video_file": "a.mp4",
            "duration": 10.0,
            "surfers": [{ "id": 1, "start_time": 5.0, "end_time": 5.0 }]
        }),
        json!({
            "video_file": "a.mp4",
            "duration": 10.0,
            "surfers": [{ "id": 1, "bbox": [0.0, 0.0, -3.0, 4.0] }]
        }),
        json!({
            "video_file": "a.mp4",
            "duration": 10.0,
            "surfers": [{ "id": 1, "quality": "legendary" }]
        }),
        json!({
            "video_file": "a.mp4",
            "duration": 10.0,
            "surfers": [{ "id": 2 }, { "id": 2 }]
        }),
    ];

    for doc in documents {
        let result = session.load_annotation_data(&doc);
        assert!(
            matches!(result, Err(CoreError::ValidationError(_))),
            "document should be rejected: {}",
            doc
        );
    }

    assert_eq!(session.get_annotation_data(), before);
}

#[test]
fn test_destructive_statistics_empty_session() {
    let session = AnnotationSession::new();
    let stats = session.get_statistics();
    assert_eq!(stats.total_surfers, 0);
    assert_eq!(stats.completion_rate, 0.0);
    assert_eq!(stats.avg_ride_duration, 0.0);
    assert_eq!(stats.max_ride_duration, 0.0);
    assert_eq!(stats.min_ride_duration, 0.0);
    assert!(stats.quality_distribution.is_empty());
}

#[test]
fn test_destructive_timeline_degenerate_width() {
    assert_eq!(click_to_time(50.0, 0.0, 120.0), 0.0);
    assert_eq!(format_time(-30.0), "00:00");
}

#[test]
fn test_destructive_delete_unknown_ids() {
    let mut session = session_with_one_surfer();
    assert!(!session.delete_surfer(0));
    assert!(!session.delete_surfer(u64::MAX));
    assert_eq!(session.surfer_count(), 1);
}
