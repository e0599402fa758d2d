//! Grid selection followed by phrase confirmation.

use super::{AttemptOutcome, ChallengeInput, ChallengeMachine, Phase};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const GRID_CELLS: usize = 9;
pub const TARGET_PHRASE: &str = "I am human";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Shield,
    Lock,
    Key,
}

impl Symbol {
    pub fn name(&self) -> &'static str {
        match self {
            Symbol::Shield => "SHIELD",
            Symbol::Lock => "LOCK",
            Symbol::Key => "KEY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub target: Symbol,
    pub cells: [Symbol; GRID_CELLS],
}

use Symbol::{Key as K, Lock as L, Shield as S};

pub const LAYOUTS: [GridLayout; 3] = [
    GridLayout {
        target: Symbol::Shield,
        cells: [S, K, S, L, K, S, L, K, S],
    },
    GridLayout {
        target: Symbol::Lock,
        cells: [K, L, S, L, S, K, L, S, K],
    },
    GridLayout {
        target: Symbol::Key,
        cells: [S, K, L, K, S, K, L, S, K],
    },
];

impl GridLayout {
    pub fn instruction(&self) -> String {
        format!("Select all squares with a {}", self.target.name())
    }

    pub fn target_cells(&self) -> BTreeSet<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == self.target)
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridStep {
    Selection,
    Phrase,
}

#[derive(Debug, Clone)]
pub struct GridChallenge {
    layout: GridLayout,
    selected: BTreeSet<usize>,
    step: GridStep,
    phase: Phase,
    attempts: u32,
    max_attempts: u32,
    dismissed: bool,
}

impl GridChallenge {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, max_attempts: u32) -> Self {
        let layout = LAYOUTS[rng.gen_range(0..LAYOUTS.len())];
        Self::with_layout(layout, max_attempts)
    }

    pub fn with_layout(layout: GridLayout, max_attempts: u32) -> Self {
        Self {
            layout,
            selected: BTreeSet::new(),
            step: GridStep::Selection,
            phase: Phase::Active,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            dismissed: false,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn step(&self) -> GridStep {
        self.step
    }

    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    fn open(&self) -> bool {
        self.phase == Phase::Active && !self.dismissed
    }

    /// Flip one cell. Out-of-range cells and closed challenges are ignored.
    pub fn toggle(&mut self, cell: usize) -> bool {
        if !self.open() || self.step != GridStep::Selection || cell >= GRID_CELLS {
            return false;
        }
        if !self.selected.remove(&cell) {
            self.selected.insert(cell);
        }
        true
    }

    fn submit_selection(&mut self) -> AttemptOutcome {
        if self.selected.is_empty() {
            return AttemptOutcome::Ignored;
        }
        if self.selected == self.layout.target_cells() {
            self.step = GridStep::Phrase;
            return AttemptOutcome::Advanced;
        }
        self.attempts += 1;
        self.selected.clear();
        if self.attempts >= self.max_attempts {
            self.phase = Phase::Exhausted;
            AttemptOutcome::Exhausted
        } else {
            AttemptOutcome::Failed {
                remaining: self.max_attempts - self.attempts,
            }
        }
    }

    /// Phrase mistakes do not consume attempts.
    fn submit_phrase(&mut self, phrase: &str) -> AttemptOutcome {
        let typed = phrase.trim();
        if typed.is_empty() {
            return AttemptOutcome::Ignored;
        }
        if typed.to_lowercase() == TARGET_PHRASE.to_lowercase() {
            self.phase = Phase::Succeeded;
            AttemptOutcome::Succeeded
        } else {
            AttemptOutcome::Failed {
                remaining: self.max_attempts - self.attempts,
            }
        }
    }
}

impl ChallengeMachine for GridChallenge {
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
        match (self.step, input) {
            (GridStep::Selection, ChallengeInput::Submit) => self.submit_selection(),
            (GridStep::Selection, ChallengeInput::Select(cells)) => {
                self.selected = cells.into_iter().filter(|c| *c < GRID_CELLS).collect();
                self.submit_selection()
            }
            (GridStep::Phrase, ChallengeInput::Phrase(p)) => self.submit_phrase(&p),
            _ => AttemptOutcome::Ignored,
        }
    }

    fn reset<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
        if self.open() {
            self.selected.clear();
        }
    }

    fn dismiss(&mut self) -> bool {
        !std::mem::replace(&mut self.dismissed, true)
    }
}
