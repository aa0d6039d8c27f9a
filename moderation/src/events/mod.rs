//! Structured debate events and the sinks that receive them.
//!
//! # Event Flow
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌────────────────────────┐
//! │ Orchestrator │────▶│  EventSink   │────▶│ debate_log_<ts>.json   │
//! │  (record)    │     │ (best effort)│     │ (one event per line)   │
//! └──────────────┘     └──────────────┘     └────────────────────────┘
//! ```

pub mod sink;
pub mod types;

pub use sink::{EventSink, JsonlEventLog, MemorySink, NullSink};
pub use types::{DebateEvent, LogRecord};
