//! Behavior Gate — behavioral bot detection for login forms.
//!
//! Modular structure:
//! - [`collectors`] — Keyboard, pointer, focus and request capture per session
//! - [`features`] — Fixed-schema behavioral feature vector and boundary validation
//! - [`risk`] — Remote risk classifier client with fail-safe fallback
//! - [`challenge`] — Symbol-grid and tile-puzzle challenges
//! - [`orchestrator`] — Decision routing, challenge supervision, login flow driver
//! - [`service`] — Validate, persist and classify feature payloads
//! - [`storage`] — Encrypted session records
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod collectors;
pub mod features;
pub mod risk;
pub mod challenge;
pub mod orchestrator;
pub mod service;
pub mod storage;
pub mod logging;

pub use config::AppConfig;
pub use error::{GateError, GateResult};
pub use collectors::{Collector, EventSource, InteractionEvent, ScriptedSource};
pub use features::{FeatureExtractor, FeatureVector};
pub use risk::{Classifier, Decision, RiskClient, RiskDecision};
pub use challenge::{Challenge, ChallengeInput, ChallengeKind, ChallengeMachine};
pub use orchestrator::{LoginFlow, Orchestrator, SessionState};
pub use service::{Analysis, AnalysisService};
pub use storage::SessionStore;
pub use logging::StructuredLogger;
