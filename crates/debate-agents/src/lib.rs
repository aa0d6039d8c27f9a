//! Debate agents — the model-facing half of the debate.
//!
//! The deterministic pieces (state, router, coherence check, event log) live
//! in the `moderation` crate. This crate adds the completion client, the
//! retry wrapper, the two persona agents, the judge, and the orchestrator
//! that drives them through the debate graph.
//!
//! ```no_run
//! use std::sync::Arc;
//! use debate_agents::{
//!     DebateOrchestrator, EndpointConfig, FilePersonaStore, OpenAiCompatibleClient, RunConfig,
//! };
//! use moderation::{validate_topic, NullSink};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let endpoint = EndpointConfig::from_env()?;
//! let client = Arc::new(OpenAiCompatibleClient::new(&endpoint)?);
//! let orchestrator = DebateOrchestrator::new(
//!     client,
//!     Arc::new(FilePersonaStore::new("personas")),
//!     Arc::new(NullSink),
//!     RunConfig::default().with_seed(Some(42)),
//! )?;
//! let outcome = orchestrator.run(validate_topic("Is free will an illusion?")?).await?;
//! println!("{}", outcome.verdict.text);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod client;
pub mod config;
pub mod console;
pub mod orchestrator;
pub mod personas;
pub mod prompts;
pub mod retry;

pub use agents::{AgentSet, AgentTurn, Judge, JudgeError, PersonaAgent, TurnSource, Verdict};
pub use client::{
    ChatMessage, CompletionClient, CompletionError, CompletionRequest, OpenAiCompatibleClient, Role,
};
pub use config::{ConfigError, EndpointConfig, FileConfig, RunConfig};
pub use console::ConsoleRenderer;
pub use orchestrator::{
    DebateError, DebateObserver, DebateOrchestrator, DebateOutcome, SilentObserver,
};
pub use personas::{FilePersonaStore, PersonaError, PersonaStore, StaticPersonaStore};
pub use retry::{
    complete_or_fallback, complete_with_retry, AttemptFailure, RetryOutcome, RetryPolicy,
    FALLBACK_UTTERANCE,
};
