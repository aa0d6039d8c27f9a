//! Debate Moderation Library
//!
//! Deterministic core of a two-persona debate. Nothing in this crate talks to
//! a model service or a terminal; the agent runtime (`debate-agents`) drives
//! these types and feeds them model output.
//!
//! This library provides:
//! - Debate state with delta merging that enforces the transcript invariants
//! - The debate graph (nodes, legal transitions, Mermaid rendering)
//! - Turn routing and the rounds/coherence controller
//! - Topic validation
//! - Structured event records and best-effort event sinks
//!
//! # Usage
//!
//! ```rust
//! use moderation::{validate_topic, DebateState, Route, TurnRouter};
//!
//! let topic = validate_topic("Is free will an illusion?").unwrap();
//! let state = DebateState::new(topic);
//! let router = TurnRouter::default();
//! assert_eq!(router.route(state.round_count(), state.current_speaker()), Route::Scientist);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod debate;
pub mod events;
pub mod similarity;
pub mod topic;

pub use debate::{
    CoherenceController, CoherenceReport, DebateNode, DebateState, DebateTransition, Origin,
    Persona, RepetitionFinding, Route, StateDelta, StateError, TranscriptEntry, TransitionError,
    TurnRouter, DEFAULT_REPETITION_THRESHOLD, DEFAULT_ROUND_THRESHOLD,
};
pub use events::{DebateEvent, EventSink, JsonlEventLog, MemorySink, NullSink};
pub use similarity::sequence_ratio;
pub use topic::{validate_topic, Topic, TopicError};
