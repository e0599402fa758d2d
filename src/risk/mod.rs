//! Risk decisions: wire types, the remote classifier client and its seam.

mod client;
mod engine;

pub use client::RiskClient;
pub use engine::{Decision, RiskDecision, FALLBACK_REASON};

use crate::features::FeatureVector;
use async_trait::async_trait;

/// Anything that turns a feature vector into a verdict. Implementations must
/// not fail: unavailability maps to [`RiskDecision::fallback`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn evaluate(&self, features: &FeatureVector) -> RiskDecision;
}
