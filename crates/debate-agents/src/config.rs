//! Run configuration — endpoint settings from the environment, an immutable
//! [`RunConfig`] per run, and optional TOML overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Groq's OpenAI-compatible base URL.
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Agent temperature when the run is not seeded.
pub const EXPLORATORY_TEMPERATURE: f32 = 0.7;
/// The judge always samples at this temperature.
pub const JUDGE_TEMPERATURE: f32 = 0.0;

/// Transcript entries shown to a persona on each turn.
pub const DEFAULT_CONTEXT_WINDOW: usize = 3;

/// Cosmetic pause between rendered turns in unseeded runs.
pub const DEFAULT_TURN_DELAY: Duration = Duration::from_millis(500);

/// Configuration problems found before a debate starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set (add it to the environment or a .env file)")]
    MissingApiKey(&'static str),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Completion service endpoint.
#[derive(Clone, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl EndpointConfig {
    /// Read `GROQ_API_KEY`, `DEBATE_API_URL` and `DEBATE_MODEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey("GROQ_API_KEY"))?;
        Ok(Self {
            url: std::env::var("DEBATE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            model: std::env::var("DEBATE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            api_key,
        })
    }
}

/// Immutable settings for one debate run, passed to every component.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub model: String,
    /// Agent temperature for unseeded runs.
    pub temperature: f32,
    pub round_threshold: u32,
    pub context_window: usize,
    pub repetition_threshold: f64,
    /// Policy for persona turns (fallback on exhaustion).
    pub retry: RetryPolicy,
    /// Attempts for the judge; it has no fallback.
    pub judge_attempts: u32,
    pub seed: Option<u64>,
    pub turn_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: EXPLORATORY_TEMPERATURE,
            round_threshold: moderation::DEFAULT_ROUND_THRESHOLD,
            context_window: DEFAULT_CONTEXT_WINDOW,
            repetition_threshold: moderation::DEFAULT_REPETITION_THRESHOLD,
            retry: RetryPolicy::default(),
            judge_attempts: RetryPolicy::default().max_attempts,
            seed: None,
            turn_delay: DEFAULT_TURN_DELAY,
        }
    }
}

impl RunConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rounds(mut self, round_threshold: u32) -> Self {
        self.round_threshold = round_threshold;
        self
    }

    /// Seeded runs are reproducible.
    pub fn is_deterministic(&self) -> bool {
        self.seed.is_some()
    }

    /// Temperature for persona turns: 0.0 whenever the run is seeded.
    pub fn agent_temperature(&self) -> f32 {
        if self.is_deterministic() {
            0.0
        } else {
            self.temperature
        }
    }

    pub fn judge_temperature(&self) -> f32 {
        JUDGE_TEMPERATURE
    }

    /// Delay between rendered turns; skipped for seeded runs.
    pub fn effective_turn_delay(&self) -> Duration {
        if self.is_deterministic() {
            Duration::ZERO
        } else {
            self.turn_delay
        }
    }

    /// Retry policy for the judge stage.
    pub fn judge_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.judge_attempts,
            ..self.retry.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        if self.round_threshold == 0 {
            return Err(ConfigError::Invalid("rounds must be at least 1".into()));
        }
        if self.context_window == 0 {
            return Err(ConfigError::Invalid(
                "context window must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} outside 0.0-1.0",
                self.temperature
            )));
        }
        if self.retry.max_attempts == 0 || self.judge_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Optional TOML overrides, e.g. `debate.toml`:
///
/// ```toml
/// model = "llama-3.1-8b-instant"
/// rounds = 6
/// persona_dir = "personas"
/// log_dir = "logs"
///
/// [retry]
/// attempts = 3
/// backoff_ms = 1000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub rounds: Option<u32>,
    pub temperature: Option<f32>,
    pub context_window: Option<usize>,
    pub persona_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub retry: RetryFileConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryFileConfig {
    pub attempts: Option<u32>,
    pub backoff_ms: Option<u64>,
    pub judge_attempts: Option<u32>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay the file's settings onto a run configuration.
    pub fn apply(&self, mut config: RunConfig) -> RunConfig {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(rounds) = self.rounds {
            config.round_threshold = rounds;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(window) = self.context_window {
            config.context_window = window;
        }
        if let Some(attempts) = self.retry.attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(ms) = self.retry.backoff_ms {
            config.retry.backoff = Duration::from_millis(ms);
        }
        if let Some(attempts) = self.retry.judge_attempts {
            config.judge_attempts = attempts;
        }
        config
    }
}
