//! Persona agent — one utterance per turn.

use std::sync::Arc;

use moderation::{DebateState, Origin, Persona, StateDelta, TranscriptEntry};
use tracing::{info, warn};

use crate::client::{ChatMessage, CompletionClient, CompletionRequest};
use crate::config::RunConfig;
use crate::personas::PersonaStore;
use crate::prompts;
use crate::retry::{complete_or_fallback, AttemptFailure};

/// How the turn's text was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnSource {
    /// The model produced usable text.
    Model {
        attempts: u32,
        failures: Vec<AttemptFailure>,
    },
    /// Every attempt failed; the fixed fallback utterance was used.
    Fallback { failures: Vec<AttemptFailure> },
    /// The role brief could not be loaded; the model was not called.
    PersonaMissing { detail: String },
}

/// Result of one persona turn. Nothing has been merged yet.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTurn {
    pub persona: Persona,
    /// Raw utterance text (or the system-error text).
    pub text: String,
    pub delta: StateDelta,
    pub source: TurnSource,
}

impl AgentTurn {
    /// Failed completion attempts absorbed during this turn.
    pub fn failures(&self) -> &[AttemptFailure] {
        match &self.source {
            TurnSource::Model { failures, .. } | TurnSource::Fallback { failures } => failures,
            TurnSource::PersonaMissing { .. } => &[],
        }
    }
}

/// A debating persona bound to a completion client and a brief store.
pub struct PersonaAgent {
    persona: Persona,
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn PersonaStore>,
}

impl PersonaAgent {
    pub fn new(
        persona: Persona,
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn PersonaStore>,
    ) -> Self {
        Self {
            persona,
            client,
            store,
        }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    /// Brief, trailing context window, then the turn directive.
    pub fn build_conversation(
        &self,
        brief: &str,
        state: &DebateState,
        config: &RunConfig,
    ) -> Vec<ChatMessage> {
        let context = state.recent(config.context_window);
        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(ChatMessage::system(brief));
        messages.extend(context.iter().map(context_message));
        messages.push(ChatMessage::human(prompts::turn_directive(self.persona)));
        messages
    }

    /// Produce this persona's next utterance as a state delta.
    ///
    /// Never fails: service errors end in the fallback utterance and a
    /// missing brief ends in a system-error entry.
    pub async fn take_turn(&self, state: &DebateState, config: &RunConfig) -> AgentTurn {
        let brief = match self.store.load(self.persona) {
            Ok(brief) => brief,
            Err(e) => {
                warn!(persona = %self.persona, error = %e, "Persona brief unavailable");
                let text = format!("[System Error: {}]", e);
                return AgentTurn {
                    persona: self.persona,
                    delta: StateDelta::turn(
                        self.persona,
                        TranscriptEntry::system_error(text.clone()),
                    ),
                    text,
                    source: TurnSource::PersonaMissing {
                        detail: e.to_string(),
                    },
                };
            }
        };

        let request = CompletionRequest {
            model: config.model.clone(),
            messages: self.build_conversation(&brief, state, config),
            temperature: config.agent_temperature(),
            seed: config.seed,
        };

        let stage = self.persona.to_string();
        let outcome =
            complete_or_fallback(self.client.as_ref(), &request, &config.retry, &stage).await;

        let source = if outcome.used_fallback {
            warn!(persona = %self.persona, attempts = outcome.attempts, "Using fallback utterance");
            TurnSource::Fallback {
                failures: outcome.failures,
            }
        } else {
            info!(persona = %self.persona, attempts = outcome.attempts, "Turn generated");
            TurnSource::Model {
                attempts: outcome.attempts,
                failures: outcome.failures,
            }
        };

        AgentTurn {
            persona: self.persona,
            delta: StateDelta::turn(
                self.persona,
                TranscriptEntry::utterance(self.persona, outcome.text.clone()),
            ),
            text: outcome.text,
            source,
        }
    }
}

/// Seed and system entries read as the human side; persona utterances as
/// model output.
fn context_message(entry: &TranscriptEntry) -> ChatMessage {
    match entry.origin() {
        Origin::Human | Origin::SystemError => ChatMessage::human(entry.content()),
        Origin::Scientist | Origin::Philosopher => ChatMessage::ai(entry.content()),
    }
}
