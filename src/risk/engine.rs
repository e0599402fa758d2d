//! Classifier verdicts and the fixed fallback used when no verdict is available.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    SoftCaptcha,
    HardCaptcha,
    Block,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::SoftCaptcha => "SOFT_CAPTCHA",
            Decision::HardCaptcha => "HARD_CAPTCHA",
            Decision::Block => "BLOCK",
        }
    }

    pub fn requires_challenge(&self) -> bool {
        matches!(self, Decision::SoftCaptcha | Decision::HardCaptcha)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason attached to the fallback decision
pub const FALLBACK_REASON: &str = "ml_unavailable";

/// One verdict per analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDecision {
    /// 0..100
    pub final_risk_score: f64,
    pub attack_intensity: f64,
    /// -50..50
    pub user_trust: f64,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_bot_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remapped_prob: Option<f64>,
}

impl RiskDecision {
    /// Medium friction: never BLOCK, never ALLOW.
    pub fn fallback() -> Self {
        Self {
            final_risk_score: 50.0,
            attack_intensity: 0.0,
            user_trust: 0.0,
            decision: Decision::SoftCaptcha,
            reason: Some(FALLBACK_REASON.to_string()),
            raw_bot_prob: None,
            remapped_prob: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.reason.as_deref() == Some(FALLBACK_REASON)
    }

    /// Name of the first score outside its documented range, if any.
    pub fn out_of_range_field(&self) -> Option<&'static str> {
        if !(0.0..=100.0).contains(&self.final_risk_score) {
            Some("final_risk_score")
        } else if !self.attack_intensity.is_finite() {
            Some("attack_intensity")
        } else if !(-50.0..=50.0).contains(&self.user_trust) {
            Some("user_trust")
        } else {
            None
        }
    }
}
