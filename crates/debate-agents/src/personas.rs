//! Persona store — role briefs looked up by persona.
//!
//! Briefs are read on every turn so edits to the files take effect without
//! restarting a long debate.

use std::collections::HashMap;
use std::path::PathBuf;

use moderation::Persona;
use thiserror::Error;

/// Failure to produce a persona brief.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("{file} not found")]
    NotFound { persona: Persona, file: String },

    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        persona: Persona,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersonaError {
    pub fn persona(&self) -> Persona {
        match self {
            Self::NotFound { persona, .. } | Self::Unreadable { persona, .. } => *persona,
        }
    }
}

/// Source of persona role briefs.
pub trait PersonaStore: Send + Sync {
    fn load(&self, persona: Persona) -> Result<String, PersonaError>;
}

/// Reads `<dir>/<persona key>.txt`, e.g. `personas/scientist.txt`.
#[derive(Debug, Clone)]
pub struct FilePersonaStore {
    dir: PathBuf,
}

impl FilePersonaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_name(persona: Persona) -> String {
        format!("{}.txt", persona.key())
    }
}

impl PersonaStore for FilePersonaStore {
    fn load(&self, persona: Persona) -> Result<String, PersonaError> {
        let file = Self::file_name(persona);
        let path = self.dir.join(&file);
        match std::fs::read_to_string(&path) {
            Ok(brief) => Ok(brief.trim().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersonaError::NotFound { persona, file })
            }
            Err(source) => Err(PersonaError::Unreadable {
                persona,
                path,
                source,
            }),
        }
    }
}

/// Briefs held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticPersonaStore {
    briefs: HashMap<Persona, String>,
}

impl StaticPersonaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, persona: Persona, brief: impl Into<String>) -> Self {
        self.briefs.insert(persona, brief.into());
        self
    }
}

impl PersonaStore for StaticPersonaStore {
    fn load(&self, persona: Persona) -> Result<String, PersonaError> {
        self.briefs
            .get(&persona)
            .cloned()
            .ok_or_else(|| PersonaError::NotFound {
                persona,
                file: FilePersonaStore::file_name(persona),
            })
    }
}
