//! Retry wrapper — bounded attempts with a deterministic fallback utterance.
//!
//! Every completion failure inside the wrapper is absorbed: it is logged,
//! recorded on the outcome, and retried after a fixed backoff. Callers always
//! get text back.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{CompletionClient, CompletionError, CompletionRequest};

/// Substituted when no attempt yields usable text.
pub const FALLBACK_UTTERANCE: &str =
    "I must consider the previous point carefully, but I maintain my stance.";

/// Attempts per utterance.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Wait between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Retry limits and fallback text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub fallback: String,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
            fallback: FALLBACK_UTTERANCE.to_string(),
        }
    }
}

/// Why an attempt produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptFailure {
    /// 1-indexed.
    pub attempt: u32,
    pub error: String,
}

/// Text from the wrapper plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    pub text: String,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    pub used_fallback: bool,
    pub failures: Vec<AttemptFailure>,
}

/// Try the request up to `policy.max_attempts` times.
///
/// Transport errors and blank completions both count as failed attempts.
/// `stage` names the caller in logs.
pub async fn complete_or_fallback(
    client: &dyn CompletionClient,
    request: &CompletionRequest,
    policy: &RetryPolicy,
    stage: &str,
) -> RetryOutcome {
    match complete_with_retry(client, request, policy, stage).await {
        Ok(outcome) => outcome,
        Err(failures) => RetryOutcome {
            text: policy.fallback.clone(),
            attempts: failures.len() as u32,
            used_fallback: true,
            failures,
        },
    }
}

/// Like [`complete_or_fallback`] but hands back the failures instead of
/// substituting fallback text once attempts run out.
pub async fn complete_with_retry(
    client: &dyn CompletionClient,
    request: &CompletionRequest,
    policy: &RetryPolicy,
    stage: &str,
) -> Result<RetryOutcome, Vec<AttemptFailure>> {
    let max_attempts = policy.max_attempts.max(1);
    let mut failures = Vec::new();

    for attempt in 1..=max_attempts {
        let error = match client.complete(request).await {
            Ok(text) if !text.trim().is_empty() => {
                return Ok(RetryOutcome {
                    text,
                    attempts: attempt,
                    used_fallback: false,
                    failures,
                });
            }
            Ok(_) => CompletionError::EmptyCompletion,
            Err(e) => e,
        };

        warn!(
            stage,
            attempt,
            max_attempts,
            error = %error,
            "Completion attempt failed"
        );
        failures.push(AttemptFailure {
            attempt,
            error: error.to_string(),
        });

        if attempt < max_attempts {
            tokio::time::sleep(policy.backoff).await;
        }
    }

    Err(failures)
}
