//! Debate Moderation — Scientist/Philosopher Turn Loop
//!
//! State machine for a fixed-length debate between two personas, closed by a
//! judge. Persona turns and the judge are driven from outside this crate; the
//! modules here decide who speaks next and fold each step's delta into the
//! shared state.
//!
//! # Debate Flow
//!
//! ```text
//! Scientist ──┐
//!             ├─→ RoundsController ─→ [round_count >= threshold?]
//! Philosopher ┘         ▲                 │
//!                       │                 ├─ No, last = Scientist   → Philosopher
//!                       │                 ├─ No, last = Philosopher → Scientist
//!                       └─────────────────┘
//!                                         └─ Yes → Judge → Terminated
//! ```

pub mod coherence;
pub mod graph;
pub mod router;
pub mod state;

pub use coherence::{
    CoherenceController, CoherenceReport, RepetitionFinding, DEFAULT_REPETITION_THRESHOLD,
};
pub use graph::{DebateNode, DebateTransition, TransitionError};
pub use router::{Route, TurnRouter, DEFAULT_ROUND_THRESHOLD};
pub use state::{DebateState, Origin, Persona, StateDelta, StateError, TranscriptEntry};
