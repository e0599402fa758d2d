//! Raw interaction state accumulated for one form lifetime.

use super::{Octant, TargetHandle, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A completed key press (both down and up observed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub key: String,
    pub down_at: i64,
    pub up_at: i64,
    pub hold_time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub t: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickPosition {
    pub x: f64,
    pub y: f64,
}

/// Counters only ever grow; the only removal is a finished hold moving from
/// `keys_down` into `key_events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSession {
    pub started_at: i64,
    pub last_active_at: i64,
    pub idle_accumulated_ms: i64,
    /// Set while the page is hidden
    pub hidden_since: Option<i64>,
    pub viewport: Viewport,

    pub key_events: Vec<KeyRecord>,
    /// In-progress holds: key name -> press time
    pub keys_down: HashMap<String, i64>,
    pub printable_count: u64,
    pub backspace_count: u64,
    pub paste_count: u64,
    pub correction_intervals_ms: Vec<f64>,
    pub last_backspace_at: Option<i64>,

    pub pointer_move_count: u64,
    pub pointer_samples: Vec<PointerSample>,
    pub path_length_px: f64,
    pub direction_change_count: u64,
    pub last_direction: Option<Octant>,
    pub last_speed: Option<f64>,
    pub acceleration_samples: Vec<f64>,

    pub click_timestamps: Vec<i64>,
    pub click_positions: Vec<ClickPosition>,

    pub focus_change_count: u64,
    pub last_focus_target: Option<TargetHandle>,

    pub request_timestamps: Vec<i64>,
    pub request_count: u64,

    pub honeypot_triggered: bool,
}

impl RawSession {
    pub fn new(started_at: i64, viewport: Viewport) -> Self {
        Self {
            started_at,
            last_active_at: started_at,
            idle_accumulated_ms: 0,
            hidden_since: None,
            viewport,
            key_events: Vec::new(),
            keys_down: HashMap::new(),
            printable_count: 0,
            backspace_count: 0,
            paste_count: 0,
            correction_intervals_ms: Vec::new(),
            last_backspace_at: None,
            pointer_move_count: 0,
            pointer_samples: Vec::new(),
            path_length_px: 0.0,
            direction_change_count: 0,
            last_direction: None,
            last_speed: None,
            acceleration_samples: Vec::new(),
            click_timestamps: Vec::new(),
            click_positions: Vec::new(),
            focus_change_count: 0,
            last_focus_target: None,
            request_timestamps: Vec::new(),
            // the page load itself
            request_count: 1,
            honeypot_triggered: false,
        }
    }

    pub(crate) fn touch(&mut self, at: i64) {
        if at > self.last_active_at {
            self.last_active_at = at;
        }
    }

    pub fn trigger_honeypot(&mut self) {
        self.honeypot_triggered = true;
    }

    pub fn track_request(&mut self, at: i64) {
        self.request_timestamps.push(at);
        self.request_count += 1;
    }
}
