//! 2x2 tile rearrangement puzzle.

use super::{AttemptOutcome, ChallengeInput, ChallengeMachine, Phase};
use rand::seq::SliceRandom;
use rand::Rng;

pub const TILE_COUNT: usize = 4;

/// `slots[i]` is the piece currently shown in slot `i`; solved when every
/// piece sits at its own index.
#[derive(Debug, Clone)]
pub struct TileChallenge {
    slots: [u8; TILE_COUNT],
    phase: Phase,
    attempts: u32,
    max_attempts: u32,
    dismissed: bool,
}

fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> [u8; TILE_COUNT] {
    let mut slots = [0, 1, 2, 3];
    // Fisher-Yates
    slots.shuffle(rng);
    slots
}

impl TileChallenge {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, max_attempts: u32) -> Self {
        Self::build(shuffled(rng), max_attempts)
    }

    /// `None` unless `slots` is a permutation of `0..4`.
    pub fn from_arrangement(slots: [u8; TILE_COUNT], max_attempts: u32) -> Option<Self> {
        let mut seen = [false; TILE_COUNT];
        for &p in &slots {
            let idx = p as usize;
            if idx >= TILE_COUNT || seen[idx] {
                return None;
            }
            seen[idx] = true;
        }
        Some(Self::build(slots, max_attempts))
    }

    fn build(slots: [u8; TILE_COUNT], max_attempts: u32) -> Self {
        Self {
            slots,
            phase: Phase::Active,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            dismissed: false,
        }
    }

    pub fn slots(&self) -> [u8; TILE_COUNT] {
        self.slots
    }

    pub fn is_solved(&self) -> bool {
        self.slots.iter().enumerate().all(|(i, p)| *p as usize == i)
    }

    fn open(&self) -> bool {
        self.phase == Phase::Active && !self.dismissed
    }

    /// Drag or touch move between two slots.
    pub fn swap(&mut self, from: usize, to: usize) -> bool {
        if !self.open() || from == to || from >= TILE_COUNT || to >= TILE_COUNT {
            return false;
        }
        self.slots.swap(from, to);
        true
    }

    /// Reshuffle. The attempt counter carries over.
    pub fn new_puzzle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.open() {
            return false;
        }
        self.slots = shuffled(rng);
        true
    }

    fn verify(&mut self) -> AttemptOutcome {
        if self.is_solved() {
            self.phase = Phase::Succeeded;
            return AttemptOutcome::Succeeded;
        }
        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            self.phase = Phase::Exhausted;
            AttemptOutcome::Exhausted
        } else {
            AttemptOutcome::Failed {
                remaining: self.max_attempts - self.attempts,
            }
        }
    }
}

impl ChallengeMachine for TileChallenge {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn attempt(&mut self, input: ChallengeInput) -> AttemptOutcome {
        if !self.open() {
            return AttemptOutcome::Ignored;
        }
        match input {
            ChallengeInput::Submit => self.verify(),
            _ => AttemptOutcome::Ignored,
        }
    }

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.new_puzzle(rng);
    }

    fn dismiss(&mut self) -> bool {
        !std::mem::replace(&mut self.dismissed, true)
    }
}
