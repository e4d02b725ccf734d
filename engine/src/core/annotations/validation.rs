//! Annotation Data Validation
//!
//! Checks an untyped JSON document before it is allowed to replace a
//! session. Validation is all-or-nothing: the first violation rejects the
//! whole document and nothing is committed.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::core::{CoreError, CoreResult};

use super::AnnotationData;

/// Top-level fields every annotation document must carry
pub const REQUIRED_FIELDS: [&str; 3] = ["video_file", "duration", "surfers"];

/// Largest surfer id accepted on load (2^53 - 1, exact in every JSON reader).
/// Keeps the next-id counter far from integer overflow.
pub const MAX_SURFER_ID: u64 = (1 << 53) - 1;

/// Validates an annotation document and converts it to the typed snapshot.
///
/// Surfer durations are recomputed from their start and end times, so a
/// stale `duration` in the document never survives a load.
pub fn validate_annotation_value(data: &Value) -> CoreResult<AnnotationData> {
    check_structure(data)?;

    let mut parsed = AnnotationData::deserialize(data)
        .map_err(|e| CoreError::ValidationError(format!("Malformed annotation data: {}", e)))?;

    check_session_metadata(&parsed)?;
    check_unique_ids(&parsed)?;

    for surfer in &mut parsed.surfers {
        surfer.recompute_duration();
    }
    parsed.surfer_count = parsed.surfers.len();

    Ok(parsed)
}

/// Structural checks on the raw document: required fields, surfer shape
/// and time ranges.
fn check_structure(data: &Value) -> CoreResult<()> {
    let object = data.as_object().ok_or_else(|| {
        CoreError::ValidationError("Annotation data must be a JSON object".to_string())
    })?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(CoreError::ValidationError(format!(
                "Missing required field: {}",
                field
            )));
        }
    }

    let surfers = object["surfers"]
        .as_array()
        .ok_or_else(|| CoreError::ValidationError("Surfers must be a list".to_string()))?;

    for (index, surfer) in surfers.iter().enumerate() {
        let surfer = surfer.as_object().ok_or_else(|| {
            CoreError::ValidationError(format!("Surfer {} must be an object", index))
        })?;

        let id = surfer.get("id").ok_or_else(|| {
            CoreError::ValidationError(format!("Surfer {} missing required field: id", index))
        })?;
        let id = id.as_u64().ok_or_else(|| {
            CoreError::ValidationError(format!(
                "Surfer {}: id must be a non-negative integer, got {}",
                index, id
            ))
        })?;
        if id > MAX_SURFER_ID {
            return Err(CoreError::ValidationError(format!(
                "Surfer {}: id {} exceeds the maximum of {}",
                index, id, MAX_SURFER_ID
            )));
        }

        let start = surfer.get("start_time").and_then(Value::as_f64);
        let end = surfer.get("end_time").and_then(Value::as_f64);
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Err(CoreError::ValidationError(format!(
                    "Surfer {}: Invalid time range (start {} >= end {})",
                    index, start, end
                )));
            }
        }
    }

    Ok(())
}

fn check_session_metadata(data: &AnnotationData) -> CoreResult<()> {
    if !data.duration.is_finite() || data.duration < 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Duration must be a non-negative number, got {}",
            data.duration
        )));
    }
    if !data.fps.is_finite() || data.fps <= 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Frame rate must be positive, got {}",
            data.fps
        )));
    }
    Ok(())
}

fn check_unique_ids(data: &AnnotationData) -> CoreResult<()> {
    let mut seen = HashSet::with_capacity(data.surfers.len());
    for surfer in &data.surfers {
        if !seen.insert(surfer.id) {
            return Err(CoreError::ValidationError(format!(
                "Duplicate surfer id: {}",
                surfer.id
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
