//! Debate state — personas, transcript entries, and delta merging.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topic::Topic;

/// One of the two debating personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Scientist,
    Philosopher,
}

impl Persona {
    /// Lookup key for the persona store.
    pub fn key(self) -> &'static str {
        match self {
            Self::Scientist => "scientist",
            Self::Philosopher => "philosopher",
        }
    }

    /// The other persona.
    pub fn opponent(self) -> Persona {
        match self {
            Self::Scientist => Self::Philosopher,
            Self::Philosopher => Self::Scientist,
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scientist => write!(f, "Scientist"),
            Self::Philosopher => write!(f, "Philosopher"),
        }
    }
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The seed entry carrying the topic.
    Human,
    Scientist,
    Philosopher,
    /// Substituted when a persona could not be configured.
    SystemError,
}

impl From<Persona> for Origin {
    fn from(persona: Persona) -> Self {
        match persona {
            Persona::Scientist => Self::Scientist,
            Persona::Philosopher => Self::Philosopher,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "Human"),
            Self::Scientist => write!(f, "Scientist"),
            Self::Philosopher => write!(f, "Philosopher"),
            Self::SystemError => write!(f, "System"),
        }
    }
}

/// A single utterance in the transcript. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    origin: Origin,
    content: String,
}

impl TranscriptEntry {
    /// The opening entry that states the topic.
    pub fn seed(topic: &Topic) -> Self {
        Self {
            origin: Origin::Human,
            content: format!("Topic: {}", topic),
        }
    }

    /// An utterance produced by a persona (including fallback text).
    pub fn utterance(persona: Persona, content: impl Into<String>) -> Self {
        Self {
            origin: persona.into(),
            content: content.into(),
        }
    }

    /// A configuration fault standing in for a persona's turn.
    pub fn system_error(content: impl Into<String>) -> Self {
        Self {
            origin: Origin::SystemError,
            content: content.into(),
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Changes produced by one step of the debate graph.
///
/// Steps never touch [`DebateState`] directly; they return a delta and the
/// orchestrator folds it in with [`DebateState::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_speaker: Option<Persona>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<TranscriptEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_verdict: Option<String>,
}

impl StateDelta {
    /// Delta for a completed persona turn.
    pub fn turn(persona: Persona, entry: TranscriptEntry) -> Self {
        Self {
            current_speaker: Some(persona),
            entries: vec![entry],
            ..Default::default()
        }
    }

    /// Delta for the rounds controller.
    pub fn round(round_count: u32) -> Self {
        Self {
            round_count: Some(round_count),
            ..Default::default()
        }
    }

    /// Delta for the judge.
    pub fn verdict(verdict: impl Into<String>) -> Self {
        Self {
            final_verdict: Some(verdict.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current_speaker.is_none()
            && self.entries.is_empty()
            && self.round_count.is_none()
            && self.final_verdict.is_none()
    }
}

/// A delta that would break a debate state invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("a persona turn must append exactly one entry, got {0}")]
    TurnEntryCount(usize),
    #[error("transcript entries can only be appended by a persona turn")]
    UnattributedEntries,
    #[error("{0} cannot speak twice in a row")]
    ConsecutiveSpeaker(Persona),
    #[error("round count must advance by one: {current} -> {proposed}")]
    RoundSkew { current: u32, proposed: u32 },
    #[error("final verdict has already been written")]
    VerdictAlreadyWritten,
    #[error("final verdict is empty")]
    EmptyVerdict,
    #[error("debate is closed: a verdict has been written")]
    DebateClosed,
}

/// The shared record of one debate run.
///
/// Fields are private: the transcript only grows and the scalar fields only
/// move through [`DebateState::apply`]. Serialization is one-way, so a state
/// cannot be rebuilt from JSON around those checks:
///
/// ```compile_fail
/// let state: moderation::DebateState = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebateState {
    topic: Topic,
    transcript: Vec<TranscriptEntry>,
    round_count: u32,
    current_speaker: Option<Persona>,
    final_verdict: String,
}

impl DebateState {
    /// Fresh state seeded with the topic entry.
    pub fn new(topic: Topic) -> Self {
        let seed = TranscriptEntry::seed(&topic);
        Self {
            topic,
            transcript: vec![seed],
            round_count: 0,
            current_speaker: None,
            final_verdict: String::new(),
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// The most recently appended entry.
    pub fn latest(&self) -> Option<&TranscriptEntry> {
        self.transcript.last()
    }

    /// Up to `n` trailing entries, oldest first.
    pub fn recent(&self, n: usize) -> &[TranscriptEntry] {
        let start = self.transcript.len().saturating_sub(n);
        &self.transcript[start..]
    }

    pub fn round_count(&self) -> u32 {
        self.round_count
    }

    pub fn current_speaker(&self) -> Option<Persona> {
        self.current_speaker
    }

    pub fn final_verdict(&self) -> &str {
        &self.final_verdict
    }

    pub fn has_verdict(&self) -> bool {
        !self.final_verdict.is_empty()
    }

    /// Merge a step's delta. Validates the whole delta before changing anything.
    pub fn apply(&mut self, delta: StateDelta) -> Result<(), StateError> {
        self.check(&delta)?;

        if let Some(speaker) = delta.current_speaker {
            self.current_speaker = Some(speaker);
        }
        self.transcript.extend(delta.entries);
        if let Some(round_count) = delta.round_count {
            self.round_count = round_count;
        }
        if let Some(verdict) = delta.final_verdict {
            self.final_verdict = verdict;
        }
        Ok(())
    }

    fn check(&self, delta: &StateDelta) -> Result<(), StateError> {
        match delta.current_speaker {
            Some(speaker) => {
                if self.has_verdict() {
                    return Err(StateError::DebateClosed);
                }
                if delta.entries.len() != 1 {
                    return Err(StateError::TurnEntryCount(delta.entries.len()));
                }
                if self.current_speaker == Some(speaker) {
                    return Err(StateError::ConsecutiveSpeaker(speaker));
                }
            }
            None if !delta.entries.is_empty() => return Err(StateError::UnattributedEntries),
            None => {}
        }

        if let Some(proposed) = delta.round_count {
            if proposed != self.round_count + 1 {
                return Err(StateError::RoundSkew {
                    current: self.round_count,
                    proposed,
                });
            }
        }

        if let Some(verdict) = &delta.final_verdict {
            if self.has_verdict() {
                return Err(StateError::VerdictAlreadyWritten);
            }
            if verdict.trim().is_empty() {
                return Err(StateError::EmptyVerdict);
            }
        }

        Ok(())
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        let speaker = self
            .current_speaker
            .map(|p| p.to_string())
            .unwrap_or_else(|| "None".to_string());
        format!(
            "round {} | {} entries | last speaker={} | verdict={}",
            self.round_count,
            self.transcript.len(),
            speaker,
            if self.has_verdict() { "yes" } else { "pending" }
        )
    }
}
