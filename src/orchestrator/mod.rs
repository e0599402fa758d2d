//! Decision orchestration: maps a risk verdict to the session outcome and
//! supervises the challenge it may require.
//!
//! ```text
//! Idle -> Submitting -> Allowed | Blocked | Challenging
//! Challenging -> Allowed (verified) | Exhausted | Dismissed
//! Dismissed -> Challenging (reopen) | Submitting (resubmit)
//! ```
//! `Allowed`, `Blocked` and `Exhausted` are terminal for the session.

mod flow;

pub use flow::LoginFlow;

use crate::challenge::{AttemptOutcome, Challenge, ChallengeInput, ChallengeKind, ChallengeMachine, Phase};
use crate::config::{ChallengeConfig, OrchestratorConfig, ReopenPolicy};
use crate::error::{GateError, GateResult};
use crate::risk::{Decision, RiskDecision};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Submitting,
    Allowed,
    Challenging,
    Dismissed,
    Blocked,
    Exhausted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Allowed | SessionState::Blocked | SessionState::Exhausted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Submitting => "SUBMITTING",
            SessionState::Allowed => "ALLOWED",
            SessionState::Challenging => "CHALLENGING",
            SessionState::Dismissed => "DISMISSED",
            SessionState::Blocked => "BLOCKED",
            SessionState::Exhausted => "EXHAUSTED",
        }
    }
}

/// Identifies one submission; responses carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket {
    seq: u64,
}

impl SubmissionTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied(SessionState),
    /// Superseded submission; discarded
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reopen {
    /// Same verdict, fresh challenge instance
    Reused(ChallengeKind),
    /// Verdict dropped; caller must submit again
    Requery,
}

/// Audit view of the session outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub state: SessionState,
    pub decision: RiskDecision,
    pub verified_via_challenge: bool,
}

pub struct Orchestrator {
    policy: ReopenPolicy,
    challenge_config: ChallengeConfig,
    rng: StdRng,
    state: SessionState,
    seq: u64,
    decision: Option<RiskDecision>,
    challenge: Option<Challenge>,
    verified_via_challenge: bool,
}

impl Orchestrator {
    pub fn new(config: &OrchestratorConfig, challenge_config: &ChallengeConfig) -> Self {
        Self::with_rng(config, challenge_config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &OrchestratorConfig, challenge_config: &ChallengeConfig, rng: StdRng) -> Self {
        Self {
            policy: config.reopen_policy,
            challenge_config: challenge_config.clone(),
            rng,
            state: SessionState::Idle,
            seq: 0,
            decision: None,
            challenge: None,
            verified_via_challenge: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while a submission awaits its verdict.
    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Submitting
    }

    pub fn decision(&self) -> Option<&RiskDecision> {
        self.decision.as_ref()
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    pub fn verified_via_challenge(&self) -> bool {
        self.verified_via_challenge
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.decision.as_ref().map(|d| SessionOutcome {
            state: self.state,
            decision: d.clone(),
            verified_via_challenge: self.verified_via_challenge,
        })
    }

    /// Start a fresh cycle. Any open challenge and previous verdict are discarded.
    pub fn begin_submission(&mut self) -> GateResult<SubmissionTicket> {
        match self.state {
            SessionState::Submitting => return Err(GateError::SubmissionInFlight),
            s if s.is_terminal() => return Err(GateError::SessionFinalized(s.as_str())),
            _ => {}
        }
        if let Some(mut c) = self.challenge.take() {
            c.dismiss();
        }
        self.seq += 1;
        self.decision = None;
        self.verified_via_challenge = false;
        self.state = SessionState::Submitting;
        debug!(seq = self.seq, "submission started");
        Ok(SubmissionTicket { seq: self.seq })
    }

    /// Apply a verdict. Only the latest in-flight ticket is honoured.
    pub fn resolve(&mut self, ticket: SubmissionTicket, decision: RiskDecision) -> Resolution {
        if ticket.seq != self.seq || self.state != SessionState::Submitting {
            debug!(ticket = ticket.seq, current = self.seq, "discarding stale verdict");
            return Resolution::Stale;
        }
        self.state = match ChallengeKind::for_decision(decision.decision) {
            Some(kind) => {
                self.challenge = Some(Challenge::spawn(kind, &mut self.rng, &self.challenge_config));
                SessionState::Challenging
            }
            None if decision.decision == Decision::Allow => SessionState::Allowed,
            None => SessionState::Blocked,
        };
        info!(
            seq = ticket.seq,
            decision = %decision.decision,
            score = decision.final_risk_score,
            state = self.state.as_str(),
            "verdict applied"
        );
        self.decision = Some(decision);
        Resolution::Applied(self.state)
    }

    fn active_challenge(&mut self) -> GateResult<&mut Challenge> {
        if self.state != SessionState::Challenging {
            return Err(GateError::NoActiveChallenge);
        }
        self.challenge.as_mut().ok_or(GateError::NoActiveChallenge)
    }

    /// Forward input to the open challenge. Exhaustion closes the session.
    pub fn attempt(&mut self, input: ChallengeInput) -> GateResult<AttemptOutcome> {
        let challenge = self.active_challenge()?;
        let outcome = challenge.attempt(input);
        let attempts = challenge.attempts();
        match outcome {
            AttemptOutcome::Exhausted => {
                info!(attempts, "challenge exhausted");
                self.challenge = None;
                self.state = SessionState::Exhausted;
            }
            AttemptOutcome::Failed { remaining } => {
                debug!(attempts, remaining, "challenge attempt failed");
            }
            _ => {}
        }
        Ok(outcome)
    }

    /// Finalize a solved challenge as a verified admission. Returns false if
    /// the admission was already recorded.
    pub fn complete_verification(&mut self) -> GateResult<bool> {
        if self.state == SessionState::Allowed && self.verified_via_challenge {
            return Ok(false);
        }
        let solved = self.active_challenge()?.phase() == Phase::Succeeded;
        if !solved {
            return Err(GateError::NoActiveChallenge);
        }
        self.challenge = None;
        if let Some(d) = self.decision.as_mut() {
            d.decision = Decision::Allow;
        }
        self.verified_via_challenge = true;
        self.state = SessionState::Allowed;
        info!(seq = self.seq, "admitted via challenge");
        Ok(true)
    }

    pub fn dismiss(&mut self) -> GateResult<()> {
        match self.state {
            SessionState::Challenging => {
                if let Some(mut c) = self.challenge.take() {
                    c.dismiss();
                }
                self.state = SessionState::Dismissed;
                debug!("challenge dismissed");
                Ok(())
            }
            // closes the exhausted screen; outcome unchanged
            SessionState::Exhausted => Ok(()),
            _ => Err(GateError::NoActiveChallenge),
        }
    }

    pub fn reopen(&mut self) -> GateResult<Reopen> {
        if self.state != SessionState::Dismissed {
            return Err(GateError::NothingToReopen);
        }
        let kind = self
            .decision
            .as_ref()
            .and_then(|d| ChallengeKind::for_decision(d.decision))
            .ok_or(GateError::NothingToReopen)?;
        match self.policy {
            ReopenPolicy::ReuseDecision => {
                self.challenge = Some(Challenge::spawn(kind, &mut self.rng, &self.challenge_config));
                self.state = SessionState::Challenging;
                Ok(Reopen::Reused(kind))
            }
            ReopenPolicy::Requery => {
                self.decision = None;
                self.state = SessionState::Idle;
                Ok(Reopen::Requery)
            }
        }
    }

    pub fn toggle_cell(&mut self, cell: usize) -> GateResult<bool> {
        match self.active_challenge()? {
            Challenge::Grid(g) => Ok(g.toggle(cell)),
            Challenge::Puzzle(_) => Ok(false),
        }
    }

    pub fn swap_tiles(&mut self, from: usize, to: usize) -> GateResult<bool> {
        match self.active_challenge()? {
            Challenge::Puzzle(p) => Ok(p.swap(from, to)),
            Challenge::Grid(_) => Ok(false),
        }
    }

    /// Clear the grid selection or reshuffle the puzzle; attempts carry over.
    pub fn reset_challenge(&mut self) -> GateResult<()> {
        if self.state != SessionState::Challenging {
            return Err(GateError::NoActiveChallenge);
        }
        if let Some(c) = self.challenge.as_mut() {
            c.reset(&mut self.rng);
        }
        Ok(())
    }
}
