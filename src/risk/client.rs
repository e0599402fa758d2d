//! Risk client: posts the feature vector to the remote classifier and absorbs
//! every failure into the fixed fallback decision.

use super::{Classifier, RiskDecision};
use crate::config::RiskConfig;
use crate::error::{ClassifierError, GateError};
use crate::features::FeatureVector;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub struct RiskClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

fn transport(e: reqwest::Error) -> ClassifierError {
    if e.is_timeout() {
        ClassifierError::Timeout
    } else {
        ClassifierError::Transport(e)
    }
}

impl RiskClient {
    pub fn new(config: &RiskConfig) -> Result<Self, GateError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(|e| GateError::Client(e.to_string()))?;
        let url = format!("{}{}", config.endpoint.trim_end_matches('/'), config.path);
        Ok(Self { client, url, timeout })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, features: &FeatureVector) -> Result<RiskDecision, ClassifierError> {
        let res = self
            .client
            .post(&self.url)
            .json(features)
            .send()
            .await
            .map_err(transport)?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ClassifierError::Status { status, body });
        }
        let decision = res.json::<RiskDecision>().await.map_err(transport)?;
        match decision.out_of_range_field() {
            Some(field) => Err(ClassifierError::OutOfRange(field)),
            None => Ok(decision),
        }
    }

    /// Remote verdict, bounded by the configured timeout.
    pub async fn try_evaluate(&self, features: &FeatureVector) -> Result<RiskDecision, ClassifierError> {
        tokio::time::timeout(self.timeout, self.request(features))
            .await
            .map_err(|_| ClassifierError::Timeout)?
    }
}

#[async_trait]
impl Classifier for RiskClient {
    async fn evaluate(&self, features: &FeatureVector) -> RiskDecision {
        match self.try_evaluate(features).await {
            Ok(decision) => {
                debug!(
                    user_id = %features.user_id,
                    decision = %decision.decision,
                    score = decision.final_risk_score,
                    "classifier verdict"
                );
                decision
            }
            Err(e) => {
                warn!(user_id = %features.user_id, error = %e, "classifier unavailable, using fallback");
                RiskDecision::fallback()
            }
        }
    }
}
