//! Topic validation — sanitize user input before it reaches any prompt.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Minimum sanitized topic length, in characters.
pub const MIN_TOPIC_CHARS: usize = 5;
/// Maximum sanitized topic length, in characters.
pub const MAX_TOPIC_CHARS: usize = 100;

/// Anything outside word characters, whitespace, and `? . , -`.
static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s?.,\-]").expect("DISALLOWED_CHARS regex should compile"));

/// Topic validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("Topic is too short (min {min} characters, got {len}).")]
    TooShort { len: usize, min: usize },
    #[error("Topic is too long (max {max} characters, got {len}).")]
    TooLong { len: usize, max: usize },
}

/// A sanitized, length-checked debate topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strip disallowed characters, trim, and enforce the length bounds.
pub fn validate_topic(raw: &str) -> Result<Topic, TopicError> {
    let sanitized = DISALLOWED_CHARS.replace_all(raw, "");
    let sanitized = sanitized.trim();
    let len = sanitized.chars().count();

    if len < MIN_TOPIC_CHARS {
        return Err(TopicError::TooShort {
            len,
            min: MIN_TOPIC_CHARS,
        });
    }
    if len > MAX_TOPIC_CHARS {
        return Err(TopicError::TooLong {
            len,
            max: MAX_TOPIC_CHARS,
        });
    }

    Ok(Topic(sanitized.to_string()))
}
