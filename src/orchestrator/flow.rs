//! Login flow driver: capture, analyse, escalate, confirm.

use super::{Orchestrator, Reopen, SessionOutcome, SessionState};
use crate::challenge::{AttemptOutcome, Challenge, ChallengeInput};
use crate::collectors::Collector;
use crate::config::{AppConfig, ChallengeConfig};
use crate::error::{GateError, GateResult};
use crate::features::FeatureExtractor;
use crate::risk::Classifier;
use crate::service::AnalysisService;
use crate::storage::SessionStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// One login form lifetime. Owns the collector; not shared across tasks.
pub struct LoginFlow<C> {
    collector: Collector,
    extractor: FeatureExtractor,
    service: AnalysisService<C>,
    orchestrator: Orchestrator,
    challenge_config: ChallengeConfig,
    record_id: Option<String>,
    last_user_id: Option<String>,
}

impl<C: Classifier> LoginFlow<C> {
    pub fn new(config: &AppConfig, classifier: C, store: Option<Arc<SessionStore>>, started_at: i64) -> Self {
        Self {
            collector: Collector::new(config.collector.clone(), started_at),
            extractor: FeatureExtractor::new(config.features.clone()),
            service: AnalysisService::new(classifier, store),
            orchestrator: Orchestrator::new(&config.orchestrator, &config.challenge),
            challenge_config: config.challenge.clone(),
            record_id: None,
            last_user_id: None,
        }
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut Collector {
        &mut self.collector
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.orchestrator.challenge()
    }

    pub fn state(&self) -> SessionState {
        self.orchestrator.state()
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.orchestrator.outcome()
    }

    /// Id of the session record for the latest submission, if persisted.
    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub async fn submit(&mut self, user_id: &str) -> GateResult<SessionState> {
        self.submit_at(user_id, Utc::now().timestamp_millis()).await
    }

    /// Submit with an explicit clock (epoch ms).
    pub async fn submit_at(&mut self, user_id: &str, now: i64) -> GateResult<SessionState> {
        let ticket = self.orchestrator.begin_submission()?;
        self.collector.track_request(now);
        let features = self.collector.extract(&self.extractor, user_id, now);
        self.last_user_id = Some(user_id.to_string());

        let analysis = self.service.analyze(&features).await;
        self.record_id = analysis.record_id;
        self.orchestrator.resolve(ticket, analysis.decision);
        Ok(self.orchestrator.state())
    }

    /// Forward challenge input. A success is confirmed after the kind's delay
    /// and recorded as a verified admission.
    pub async fn attempt(&mut self, input: ChallengeInput) -> GateResult<AttemptOutcome> {
        let kind = self.orchestrator.challenge().map(|c| c.kind());
        let outcome = self.orchestrator.attempt(input)?;
        if outcome != AttemptOutcome::Succeeded {
            return Ok(outcome);
        }
        if let Some(kind) = kind {
            tokio::time::sleep(kind.confirm_delay(&self.challenge_config)).await;
        }
        if self.orchestrator.complete_verification()? {
            info!(record_id = self.record_id.as_deref().unwrap_or("-"), "verified admission");
            if let Some(id) = self.record_id.as_deref() {
                if let Err(e) = self.service.mark_verified(id) {
                    warn!(record_id = id, error = %e, "verified admission not persisted");
                }
            }
        }
        Ok(outcome)
    }

    pub fn dismiss(&mut self) -> GateResult<()> {
        self.orchestrator.dismiss()
    }

    /// Reopen a dismissed challenge; under the requery policy this runs a
    /// fresh submission for the last user.
    pub async fn reopen(&mut self) -> GateResult<SessionState> {
        match self.orchestrator.reopen()? {
            Reopen::Reused(_) => Ok(self.orchestrator.state()),
            Reopen::Requery => {
                let user_id = self.last_user_id.clone().ok_or(GateError::NothingToReopen)?;
                self.submit(&user_id).await
            }
        }
    }

    pub fn toggle_cell(&mut self, cell: usize) -> GateResult<bool> {
        self.orchestrator.toggle_cell(cell)
    }

    pub fn swap_tiles(&mut self, from: usize, to: usize) -> GateResult<bool> {
        self.orchestrator.swap_tiles(from, to)
    }

    /// Reshuffle the puzzle (or clear the grid selection). Attempts carry over.
    pub fn new_puzzle(&mut self) -> GateResult<()> {
        self.orchestrator.reset_challenge()
    }
}
