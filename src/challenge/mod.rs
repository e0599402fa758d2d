//! Interactive proof-of-humanity challenges behind one state-machine contract.
//!
//! Every challenge counts failed attempts against a fixed limit and moves
//! through `Active -> {Succeeded, Exhausted}`. `Succeeded` is reported by
//! exactly one [`AttemptOutcome::Succeeded`]; `Exhausted` is terminal.

mod grid;
mod puzzle;

pub use grid::{GridChallenge, GridLayout, GridStep, Symbol, GRID_CELLS, LAYOUTS, TARGET_PHRASE};
pub use puzzle::{TileChallenge, TILE_COUNT};

use crate::config::ChallengeConfig;
use crate::risk::Decision;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Active,
    Succeeded,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeInput {
    /// Check the current state (grid selection, tile arrangement)
    Submit,
    /// Replace the grid selection, then check it
    Select(BTreeSet<usize>),
    /// Confirmation phrase for the grid's second step
    Phrase(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// First step passed, more input needed
    Advanced,
    Succeeded,
    Failed { remaining: u32 },
    Exhausted,
    /// Input not applicable in the current phase/step; nothing changed
    Ignored,
}

pub trait ChallengeMachine {
    fn phase(&self) -> Phase;
    fn attempts(&self) -> u32;
    fn max_attempts(&self) -> u32;
    fn attempt(&mut self, input: ChallengeInput) -> AttemptOutcome;
    /// Clear the grid selection / reshuffle the tiles. Never resets attempts.
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R);
    /// Returns false if already dismissed.
    fn dismiss(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    Grid,
    Puzzle,
}

impl ChallengeKind {
    pub fn for_decision(decision: Decision) -> Option<Self> {
        match decision {
            Decision::SoftCaptcha => Some(ChallengeKind::Grid),
            Decision::HardCaptcha => Some(ChallengeKind::Puzzle),
            Decision::Allow | Decision::Block => None,
        }
    }

    /// Pause between success and the verified admission.
    pub fn confirm_delay(&self, config: &ChallengeConfig) -> Duration {
        Duration::from_millis(match self {
            ChallengeKind::Grid => config.grid_confirm_delay_ms,
            ChallengeKind::Puzzle => config.puzzle_confirm_delay_ms,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Challenge {
    Grid(GridChallenge),
    Puzzle(TileChallenge),
}

impl Challenge {
    pub fn spawn<R: Rng + ?Sized>(kind: ChallengeKind, rng: &mut R, config: &ChallengeConfig) -> Self {
        match kind {
            ChallengeKind::Grid => Challenge::Grid(GridChallenge::new(rng, config.grid_max_attempts)),
            ChallengeKind::Puzzle => Challenge::Puzzle(TileChallenge::new(rng, config.puzzle_max_attempts)),
        }
    }

    pub fn kind(&self) -> ChallengeKind {
        match self {
            Challenge::Grid(_) => ChallengeKind::Grid,
            Challenge::Puzzle(_) => ChallengeKind::Puzzle,
        }
    }
}

impl ChallengeMachine for Challenge {
    fn phase(&self) -> Phase {
        match self {
            Challenge::Grid(g) => g.phase(),
            Challenge::Puzzle(p) => p.phase(),
        }
    }

    fn attempts(&self) -> u32 {
        match self {
            Challenge::Grid(g) => g.attempts(),
            Challenge::Puzzle(p) => p.attempts(),
        }
    }

    fn max_attempts(&self) -> u32 {
        match self {
            Challenge::Grid(g) => g.max_attempts(),
            Challenge::Puzzle(p) => p.max_attempts(),
        }
    }

    fn attempt(&mut self, input: ChallengeInput) -> AttemptOutcome {
        match self {
            Challenge::Grid(g) => g.attempt(input),
            Challenge::Puzzle(p) => p.attempt(input),
        }
    }

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self {
            Challenge::Grid(g) => g.reset(rng),
            Challenge::Puzzle(p) => p.reset(rng),
        }
    }

    fn dismiss(&mut self) -> bool {
        match self {
            Challenge::Grid(g) => g.dismiss(),
            Challenge::Puzzle(p) => p.dismiss(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn decisions_map_to_challenges() {
        assert_eq!(ChallengeKind::for_decision(Decision::SoftCaptcha), Some(ChallengeKind::Grid));
        assert_eq!(ChallengeKind::for_decision(Decision::HardCaptcha), Some(ChallengeKind::Puzzle));
        assert_eq!(ChallengeKind::for_decision(Decision::Block), None);
        assert_eq!(ChallengeKind::for_decision(Decision::Allow), None);
    }

    #[test]
    fn spawn_uses_configured_limits() {
        let mut rng = StdRng::seed_from_u64(1);
        let cfg = ChallengeConfig::default();
        let g = Challenge::spawn(ChallengeKind::Grid, &mut rng, &cfg);
        let p = Challenge::spawn(ChallengeKind::Puzzle, &mut rng, &cfg);
        assert_eq!((g.kind(), g.max_attempts(), g.phase()), (ChallengeKind::Grid, 3, Phase::Active));
        assert_eq!((p.kind(), p.max_attempts()), (ChallengeKind::Puzzle, 5));
        assert_eq!(ChallengeKind::Puzzle.confirm_delay(&cfg), Duration::from_millis(800));
    }
}
