//! Event types for the debate log.
//!
//! Each event becomes one JSON line: `{"timestamp", "event_type", "data"}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::debate::{DebateNode, Persona, StateDelta};

/// Everything worth recording about a debate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event_type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum DebateEvent {
    /// Run accepted a topic and is about to start.
    SystemStart {
        topic: String,
        seed: Option<u64>,
        model: String,
        rounds: u32,
        /// Version of the prompt templates used for every model call.
        prompt_version: String,
    },

    /// A graph node finished; carries the delta it produced.
    NodeTransition { node: DebateNode, delta: StateDelta },

    /// One completion attempt failed and was absorbed.
    RetryAttemptFailed {
        stage: String,
        attempt: u32,
        max_attempts: u32,
        error: String,
    },

    /// Retries ran out and the fixed fallback utterance was used.
    FallbackUsed { persona: Persona, attempts: u32 },

    /// A persona brief could not be loaded.
    PersonaMissing { persona: Persona, detail: String },

    /// Newest utterance closely matches an earlier one.
    RepetitionWarning {
        round: u32,
        entry_index: usize,
        similarity: f64,
    },

    /// Judge output.
    FinalVerdict { verdict: String },

    /// The run aborted.
    RunError { message: String },
}

impl DebateEvent {
    /// The `event_type` tag as written to the log.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SystemStart { .. } => "SYSTEM_START",
            Self::NodeTransition { .. } => "NODE_TRANSITION",
            Self::RetryAttemptFailed { .. } => "RETRY_ATTEMPT_FAILED",
            Self::FallbackUsed { .. } => "FALLBACK_USED",
            Self::PersonaMissing { .. } => "PERSONA_MISSING",
            Self::RepetitionWarning { .. } => "REPETITION_WARNING",
            Self::FinalVerdict { .. } => "FINAL_VERDICT",
            Self::RunError { .. } => "RUN_ERROR",
        }
    }
}

/// A timestamped event as stored in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DebateEvent,
}

impl LogRecord {
    pub fn now(event: DebateEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_shape() {
        let record = LogRecord::now(DebateEvent::FinalVerdict {
            verdict: "Winner: Scientist".to_string(),
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event_type"], "FINAL_VERDICT");
        assert_eq!(json["data"]["verdict"], "Winner: Scientist");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_event_type_matches_tag() {
        let events = vec![
            DebateEvent::SystemStart {
                topic: "Free will".to_string(),
                seed: Some(42),
                model: "m".to_string(),
                rounds: 8,
                prompt_version: "1.0.0".to_string(),
            },
            DebateEvent::NodeTransition {
                node: DebateNode::RoundsController,
                delta: StateDelta::round(1),
            },
            DebateEvent::RetryAttemptFailed {
                stage: "Scientist".to_string(),
                attempt: 1,
                max_attempts: 3,
                error: "timeout".to_string(),
            },
            DebateEvent::FallbackUsed {
                persona: Persona::Philosopher,
                attempts: 3,
            },
            DebateEvent::PersonaMissing {
                persona: Persona::Scientist,
                detail: "not found".to_string(),
            },
            DebateEvent::RepetitionWarning {
                round: 3,
                entry_index: 1,
                similarity: 0.9,
            },
            DebateEvent::RunError {
                message: "judge failed".to_string(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event_type"], event.event_type());
        }
    }

    #[test]
    fn test_node_transition_payload() {
        let json = serde_json::to_value(DebateEvent::NodeTransition {
            node: DebateNode::Judge,
            delta: StateDelta::verdict("Winner: Philosopher"),
        })
        .unwrap();
        assert_eq!(json["data"]["node"], "Judge");
        assert_eq!(
            json["data"]["delta"]["final_verdict"],
            "Winner: Philosopher"
        );
    }
}
