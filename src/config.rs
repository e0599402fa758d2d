//! Gate configuration. Loaded from JSON; every section has a working default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Raw interaction capture
    pub collector: CollectorConfig,
    /// Feature derivation windows and constants
    pub features: FeaturesConfig,
    /// Remote risk classifier
    pub risk: RiskConfig,
    /// Challenge attempt limits and confirmation delays
    pub challenge: ChallengeConfig,
    /// Escalation policy
    pub orchestrator: OrchestratorConfig,
    /// Session record sink
    pub store: StoreConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Pointer moves shorter than this (px) never count as a direction change
    pub direction_noise_floor_px: f64,
    /// Used when the event source reports an empty viewport
    pub fallback_viewport_width: f64,
    pub fallback_viewport_height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Inactivity longer than this at submit time counts as idle
    pub active_idle_threshold_ms: i64,
    /// Trailing window for requestsPerMinute
    pub request_window_ms: i64,
    /// Trailing window for the short side of burstScore
    pub burst_window_ms: i64,
    /// burstScore reported when no requests fall in the request window.
    /// Low-confidence sentinel; tunable.
    pub burst_fallback: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Classifier base URL
    pub endpoint: String,
    /// Path appended to `endpoint`
    pub path: String,
    /// Whole-request timeout; expiry falls back like any transport error
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub grid_max_attempts: u32,
    pub puzzle_max_attempts: u32,
    /// Pause between a solved challenge and the verified admission
    pub grid_confirm_delay_ms: u64,
    pub puzzle_confirm_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReopenPolicy {
    /// Reopening a dismissed challenge reuses the decision already obtained
    ReuseDecision,
    /// Reopening discards the decision and runs a fresh submission
    Requery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub reopen_policy: ReopenPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub enabled: bool,
    /// Directory holding `sessions.db`
    pub data_dir: PathBuf,
    /// Seed for the payload encryption key (in production: from a secret manager)
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            direction_noise_floor_px: 5.0,
            fallback_viewport_width: 1280.0,
            fallback_viewport_height: 720.0,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            active_idle_threshold_ms: 3_000,
            request_window_ms: 60_000,
            burst_window_ms: 10_000,
            burst_fallback: 0.1,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            path: "/calculate-risk".to_string(),
            timeout_ms: 3_000,
            connect_timeout_ms: 1_000,
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            grid_max_attempts: 3,
            puzzle_max_attempts: 5,
            grid_confirm_delay_ms: 700,
            puzzle_confirm_delay_ms: 800,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            reopen_policy: ReopenPolicy::ReuseDecision,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("behavior-gate"))
            .unwrap_or_else(|| PathBuf::from(".behavior-gate"));
        Self {
            enabled: true,
            data_dir,
            secret: "gate-secret-placeholder".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl AppConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<AppConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}
