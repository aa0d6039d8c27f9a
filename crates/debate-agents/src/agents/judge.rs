//! Judge — one deterministic verdict over the full transcript.

use std::sync::Arc;

use moderation::{DebateState, Persona};
use thiserror::Error;
use tracing::info;

use crate::client::{ChatMessage, CompletionClient, CompletionRequest};
use crate::config::RunConfig;
use crate::prompts;
use crate::retry::{complete_with_retry, AttemptFailure};

/// The judge could not produce a verdict. There is no fallback verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("judge failed after {} attempt(s): {}", .failures.len(), last_error(.failures))]
pub struct JudgeError {
    pub failures: Vec<AttemptFailure>,
}

fn last_error(failures: &[AttemptFailure]) -> &str {
    failures
        .last()
        .map(|f| f.error.as_str())
        .unwrap_or("no attempts made")
}

/// Verdict text plus how many attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub text: String,
    pub attempts: u32,
    pub failures: Vec<AttemptFailure>,
}

impl Verdict {
    /// Persona named on the `Winner:` line, if the model followed the format.
    pub fn winner(&self) -> Option<Persona> {
        let line = self.field("Winner")?.to_ascii_lowercase();
        let scientist = line.contains("scientist");
        let philosopher = line.contains("philosopher");
        match (scientist, philosopher) {
            (true, false) => Some(Persona::Scientist),
            (false, true) => Some(Persona::Philosopher),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.field("Reason")
    }

    pub fn summary(&self) -> Option<&str> {
        self.field("Summary")
    }

    /// Value after `<label>:` on the first line that starts with it.
    /// Markdown emphasis around the label is tolerated.
    fn field(&self, label: &str) -> Option<&str> {
        self.text.lines().find_map(|line| {
            let line = line.trim().trim_start_matches(['*', '#', ' ']);
            let rest = line.strip_prefix(label)?;
            let rest = rest.trim_start_matches('*').strip_prefix(':')?;
            let value = rest.trim().trim_start_matches('*').trim();
            (!value.is_empty()).then_some(value)
        })
    }
}

pub struct Judge {
    client: Arc<dyn CompletionClient>,
}

impl Judge {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Single human message at the judge temperature.
    pub fn build_request(&self, state: &DebateState, config: &RunConfig) -> CompletionRequest {
        CompletionRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage::human(prompts::judge_prompt(state))],
            temperature: config.judge_temperature(),
            seed: config.seed,
        }
    }

    pub async fn deliberate(
        &self,
        state: &DebateState,
        config: &RunConfig,
    ) -> Result<Verdict, JudgeError> {
        let request = self.build_request(state, config);
        let outcome = complete_with_retry(
            self.client.as_ref(),
            &request,
            &config.judge_retry(),
            "Judge",
        )
        .await
        .map_err(|failures| JudgeError { failures })?;

        let verdict = Verdict {
            text: outcome.text,
            attempts: outcome.attempts,
            failures: outcome.failures,
        };
        info!(
            attempts = verdict.attempts,
            winner = ?verdict.winner(),
            "Verdict produced"
        );
        Ok(verdict)
    }
}
