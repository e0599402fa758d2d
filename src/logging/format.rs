//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use crate::orchestrator::{SessionOutcome, SessionState};
use crate::risk::Decision;
use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Final audit line for one login session.
#[derive(Debug, Serialize)]
pub struct AuditEvent<'a> {
    pub ts: String,
    pub user_id: &'a str,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_risk_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
    pub verified_via_challenge: bool,
}

impl<'a> AuditEvent<'a> {
    pub fn new(
        user_id: &'a str,
        state: SessionState,
        outcome: Option<&'a SessionOutcome>,
        record_id: Option<&'a str>,
    ) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            user_id,
            state,
            record_id,
            decision: outcome.map(|o| o.decision.decision),
            final_risk_score: outcome.map(|o| o.decision.final_risk_score),
            reason: outcome.and_then(|o| o.decision.reason.as_deref()),
            verified_via_challenge: outcome.map(|o| o.verified_via_challenge).unwrap_or(false),
        }
    }
}

/// Initialize tracing with JSON format (one JSON object per line)
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber: JSON lines to stdout, level from RUST_LOG or default.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let registry = tracing_subscriber::registry().with(filter);
        let result = if json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(FmtSpan::NONE)
                        .with_writer(std::io::stderr),
                )
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        };
        // a second init (tests, embedding hosts) keeps the existing subscriber
        let _ = result;
    }

    /// Emit a single structured line (e.g. the session audit) without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}
