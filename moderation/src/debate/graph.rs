//! Debate graph — nodes, legal transitions, and transition history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::router::Route;
use super::state::Persona;

/// A node of the debate graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebateNode {
    /// Scientist persona produces one utterance.
    Scientist,
    /// Philosopher persona produces one utterance.
    Philosopher,
    /// Repetition check, round increment, and routing.
    RoundsController,
    /// Verdict over the full transcript.
    Judge,
    /// Run finished.
    Terminated,
}

impl DebateNode {
    /// Where every run starts.
    pub const ENTRY: DebateNode = DebateNode::Scientist;

    /// Whether this is a terminal node.
    pub fn is_terminal(self) -> bool {
        self == Self::Terminated
    }

    /// The persona that speaks at this node, if any.
    pub fn persona(self) -> Option<Persona> {
        match self {
            Self::Scientist => Some(Persona::Scientist),
            Self::Philosopher => Some(Persona::Philosopher),
            _ => None,
        }
    }

    /// Valid transitions from this node.
    pub fn valid_transitions(self) -> &'static [DebateNode] {
        match self {
            Self::Scientist | Self::Philosopher => &[Self::RoundsController],
            Self::RoundsController => &[Self::Scientist, Self::Philosopher, Self::Judge],
            Self::Judge => &[Self::Terminated],
            Self::Terminated => &[],
        }
    }

    /// Mermaid flowchart of the whole graph.
    pub fn mermaid() -> String {
        let mut out = String::from("graph TD;\n");
        out.push_str("\t__start__([start]) --> Scientist;\n");
        out.push_str("\tScientist --> RoundsController;\n");
        out.push_str("\tPhilosopher --> RoundsController;\n");
        out.push_str("\tRoundsController -.-> Scientist;\n");
        out.push_str("\tRoundsController -.-> Philosopher;\n");
        out.push_str("\tRoundsController -.-> Judge;\n");
        out.push_str("\tJudge --> __end__([end]);\n");
        out
    }
}

impl From<Persona> for DebateNode {
    fn from(persona: Persona) -> Self {
        match persona {
            Persona::Scientist => Self::Scientist,
            Persona::Philosopher => Self::Philosopher,
        }
    }
}

impl From<Route> for DebateNode {
    fn from(route: Route) -> Self {
        match route {
            Route::Scientist => Self::Scientist,
            Route::Philosopher => Self::Philosopher,
            Route::Judge => Self::Judge,
        }
    }
}

impl std::fmt::Display for DebateNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scientist => write!(f, "Scientist"),
            Self::Philosopher => write!(f, "Philosopher"),
            Self::RoundsController => write!(f, "RoundsController"),
            Self::Judge => write!(f, "Judge"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// A node transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateTransition {
    /// Previous node.
    pub from: DebateNode,
    /// New node.
    pub to: DebateNode,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
    /// Reason for the transition.
    pub reason: String,
}

impl DebateTransition {
    /// Check `from → to` against the graph and record it.
    pub fn checked(
        from: DebateNode,
        to: DebateNode,
        reason: &str,
    ) -> Result<Self, TransitionError> {
        if !from.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from,
                to,
                reason: format!(
                    "not a valid transition (allowed: {:?})",
                    from.valid_transitions()
                ),
            });
        }
        Ok(Self {
            from,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        })
    }
}

/// Error for invalid node transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition {from} → {to}: {reason}")]
pub struct TransitionError {
    pub from: DebateNode,
    pub to: DebateNode,
    pub reason: String,
}
