//! Debate participants.
//!
//! `AgentSet` builds both personas and the judge from one completion client
//! and one persona store so every participant shares the same service.

pub mod judge;
pub mod persona;

use std::sync::Arc;

use moderation::Persona;

use crate::client::CompletionClient;
use crate::personas::PersonaStore;

pub use judge::{Judge, JudgeError, Verdict};
pub use persona::{AgentTurn, PersonaAgent, TurnSource};

pub struct AgentSet {
    scientist: PersonaAgent,
    philosopher: PersonaAgent,
    judge: Judge,
}

impl AgentSet {
    pub fn new(client: Arc<dyn CompletionClient>, store: Arc<dyn PersonaStore>) -> Self {
        Self {
            scientist: PersonaAgent::new(Persona::Scientist, client.clone(), store.clone()),
            philosopher: PersonaAgent::new(Persona::Philosopher, client.clone(), store),
            judge: Judge::new(client),
        }
    }

    pub fn persona(&self, persona: Persona) -> &PersonaAgent {
        match persona {
            Persona::Scientist => &self.scientist,
            Persona::Philosopher => &self.philosopher,
        }
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }
}
