//! Rounds controller — repetition check and round increment.
//!
//! Runs once after every persona turn. Repetition findings are advisory: they
//! are logged and returned to the caller, but the round always advances and
//! the utterance is kept.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::state::{DebateState, StateDelta};
use crate::similarity::sequence_ratio;

/// Similarity above which the newest entry counts as a repetition.
pub const DEFAULT_REPETITION_THRESHOLD: f64 = 0.85;

/// The newest entry closely matched an earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionFinding {
    /// Index of the earlier transcript entry.
    pub entry_index: usize,
    /// Overlap ratio with that entry (0.0–1.0).
    pub similarity: f64,
}

/// Result of one controller pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceReport {
    /// Round count after this pass.
    pub round_count: u32,
    /// Earlier entries the newest one repeats.
    pub findings: Vec<RepetitionFinding>,
}

impl CoherenceReport {
    pub fn has_repetition(&self) -> bool {
        !self.findings.is_empty()
    }

    /// The delta to merge into the debate state.
    pub fn delta(&self) -> StateDelta {
        StateDelta::round(self.round_count)
    }
}

/// Compares the newest utterance with everything said before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoherenceController {
    repetition_threshold: f64,
}

impl Default for CoherenceController {
    fn default() -> Self {
        Self::new(DEFAULT_REPETITION_THRESHOLD)
    }
}

impl CoherenceController {
    pub fn new(repetition_threshold: f64) -> Self {
        Self {
            repetition_threshold: repetition_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn repetition_threshold(&self) -> f64 {
        self.repetition_threshold
    }

    /// Check the latest entry and advance the round by exactly one.
    pub fn check(&self, state: &DebateState) -> CoherenceReport {
        let transcript = state.transcript();
        let mut findings = Vec::new();

        if let Some((latest, earlier)) = transcript.split_last() {
            for (entry_index, entry) in earlier.iter().enumerate() {
                let similarity = sequence_ratio(latest.content(), entry.content());
                if similarity > self.repetition_threshold {
                    warn!(
                        entry_index,
                        similarity = format!("{:.2}", similarity),
                        "High similarity detected, possible repetition"
                    );
                    findings.push(RepetitionFinding {
                        entry_index,
                        similarity,
                    });
                }
            }
        }

        CoherenceReport {
            round_count: state.round_count() + 1,
            findings,
        }
    }
}
