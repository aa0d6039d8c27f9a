//! Turn routing — who speaks next, or whether the judge takes over.

use serde::{Deserialize, Serialize};

use super::state::Persona;

/// Rounds after which the judge is invoked.
pub const DEFAULT_ROUND_THRESHOLD: u32 = 8;

/// Routing decision made after each rounds-controller step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Scientist,
    Philosopher,
    Judge,
}

impl From<Persona> for Route {
    fn from(persona: Persona) -> Self {
        match persona {
            Persona::Scientist => Self::Scientist,
            Persona::Philosopher => Self::Philosopher,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scientist => write!(f, "Scientist"),
            Self::Philosopher => write!(f, "Philosopher"),
            Self::Judge => write!(f, "Judge"),
        }
    }
}

/// Pure routing function over the round count and last speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRouter {
    round_threshold: u32,
}

impl Default for TurnRouter {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_THRESHOLD)
    }
}

impl TurnRouter {
    pub fn new(round_threshold: u32) -> Self {
        Self { round_threshold }
    }

    pub fn round_threshold(&self) -> u32 {
        self.round_threshold
    }

    /// Decide the next node.
    ///
    /// Exhausted rounds always win; otherwise the personas alternate, and a
    /// debate with no speaker yet opens with the Scientist.
    pub fn route(&self, round_count: u32, current_speaker: Option<Persona>) -> Route {
        if round_count >= self.round_threshold {
            return Route::Judge;
        }
        match current_speaker {
            Some(Persona::Scientist) => Route::Philosopher,
            Some(Persona::Philosopher) | None => Route::Scientist,
        }
    }
}
