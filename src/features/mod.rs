//! Fixed-schema feature vector derived from a raw session, and the boundary
//! validation applied to vectors arriving from outside.

mod behavioral;
mod pipeline;

pub use behavioral::{intervals, mean, round_to, std_dev, variance};
pub use pipeline::FeatureExtractor;

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classifier input. Field names are the wire contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    #[serde(rename = "user_id")]
    pub user_id: String,
    pub session_duration: f64,
    pub avg_typing_speed: f64,
    pub typing_variance: f64,
    pub mouse_move_count: u64,
    pub click_interval_avg: f64,
    pub mouse_path_length: f64,
    pub backspace_count: u64,
    pub focus_changes: u64,
    pub idle_time_ratio: f64,
    pub key_hold_time_mean: f64,
    pub key_flight_time_variance: f64,
    pub correction_delay_mean: f64,
    pub paste_usage_count: u64,
    pub mouse_acceleration_mean: f64,
    pub mouse_direction_changes: u64,
    pub click_randomness_score: f64,
    pub requests_per_minute: f64,
    pub session_request_count: u64,
    pub burst_score: f64,
    pub honeypot_triggered: u8,
}

#[derive(Clone, Copy)]
enum FieldKind {
    Text,
    Number,
    Count,
    Ratio,
    Flag,
}

const FIELDS: [(&str, FieldKind); 21] = [
    ("user_id", FieldKind::Text),
    ("sessionDuration", FieldKind::Number),
    ("avgTypingSpeed", FieldKind::Number),
    ("typingVariance", FieldKind::Number),
    ("mouseMoveCount", FieldKind::Count),
    ("clickIntervalAvg", FieldKind::Number),
    ("mousePathLength", FieldKind::Number),
    ("backspaceCount", FieldKind::Count),
    ("focusChanges", FieldKind::Count),
    ("idleTimeRatio", FieldKind::Ratio),
    ("keyHoldTimeMean", FieldKind::Number),
    ("keyFlightTimeVariance", FieldKind::Number),
    ("correctionDelayMean", FieldKind::Number),
    ("pasteUsageCount", FieldKind::Count),
    ("mouseAccelerationMean", FieldKind::Number),
    ("mouseDirectionChanges", FieldKind::Count),
    ("clickRandomnessScore", FieldKind::Ratio),
    ("requestsPerMinute", FieldKind::Number),
    ("sessionRequestCount", FieldKind::Count),
    ("burstScore", FieldKind::Ratio),
    ("honeypotTriggered", FieldKind::Flag),
];

impl FeatureVector {
    /// Wire names in contract order.
    pub fn field_names() -> impl Iterator<Item = &'static str> {
        FIELDS.iter().map(|(name, _)| *name)
    }

    /// Check presence and type of every field, then decode. Nothing is defaulted.
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;
        for (name, kind) in FIELDS {
            let v = obj.get(name).ok_or(ValidationError::MissingField(name))?;
            match kind {
                FieldKind::Text => {
                    if !v.is_string() {
                        return Err(ValidationError::WrongType {
                            field: name,
                            expected: "a string",
                        });
                    }
                }
                FieldKind::Number => {
                    if v.as_f64().is_none() {
                        return Err(ValidationError::WrongType {
                            field: name,
                            expected: "a number",
                        });
                    }
                }
                FieldKind::Count => {
                    if v.as_u64().is_none() {
                        return Err(ValidationError::WrongType {
                            field: name,
                            expected: "a non-negative integer",
                        });
                    }
                }
                FieldKind::Ratio => {
                    let x = v.as_f64().ok_or(ValidationError::WrongType {
                        field: name,
                        expected: "a number",
                    })?;
                    if !(0.0..=1.0).contains(&x) {
                        return Err(ValidationError::OutOfRange(name));
                    }
                }
                FieldKind::Flag => match v.as_u64() {
                    Some(0) | Some(1) => {}
                    _ => {
                        return Err(ValidationError::WrongType {
                            field: name,
                            expected: "0 or 1",
                        })
                    }
                },
            }
        }
        serde_json::from_value(payload.clone()).map_err(|e| ValidationError::Malformed(e.to_string()))
    }
}
