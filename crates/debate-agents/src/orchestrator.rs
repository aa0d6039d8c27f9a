//! Debate orchestrator — drives the persona → controller → judge graph.
//!
//! Each node returns a delta; the orchestrator merges it into the single
//! `DebateState`, records the node in the event log, and asks the router
//! where to go next. Only a judge failure or a rejected state update ends
//! a run early.

use std::sync::Arc;

use moderation::{
    CoherenceController, DebateEvent, DebateNode, DebateState, DebateTransition, EventSink,
    Persona, RepetitionFinding, StateDelta, StateError, Topic, TransitionError, TurnRouter,
};
use thiserror::Error;
use tracing::{error, info};

use crate::agents::{AgentSet, AgentTurn, JudgeError, TurnSource, Verdict};
use crate::client::CompletionClient;
use crate::config::{ConfigError, RunConfig};
use crate::personas::PersonaStore;
use crate::prompts::PROMPT_VERSION;
use crate::retry::AttemptFailure;

/// Fatal run errors.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error(transparent)]
    Judge(#[from] JudgeError),

    #[error("state update rejected: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Hooks for presenting a debate as it happens.
///
/// All methods default to no-ops.
pub trait DebateObserver: Send + Sync {
    fn on_start(&self, _topic: &Topic, _config: &RunConfig) {}
    fn on_turn(&self, _turn: &AgentTurn, _state: &DebateState) {}
    fn on_repetition(&self, _finding: &RepetitionFinding, _state: &DebateState) {}
    fn on_judging(&self, _state: &DebateState) {}
    fn on_verdict(&self, _verdict: &Verdict) {}
}

/// Observer that shows nothing.
pub struct SilentObserver;

impl DebateObserver for SilentObserver {}

/// A finished debate.
#[derive(Debug, Clone)]
pub struct DebateOutcome {
    pub state: DebateState,
    pub verdict: Verdict,
    /// Every node-to-node hop, in order.
    pub transitions: Vec<DebateTransition>,
    pub fallbacks: u32,
    pub missing_personas: u32,
    pub repetition_warnings: u32,
}

impl DebateOutcome {
    /// Persona turns taken.
    pub fn turns(&self) -> usize {
        self.transitions
            .iter()
            .filter(|t| t.from.persona().is_some())
            .count()
    }

    pub fn winner(&self) -> Option<Persona> {
        self.verdict.winner()
    }

    /// Compact summary line.
    pub fn summary_line(&self) -> String {
        let winner = self
            .winner()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unparsed".to_string());
        format!(
            "[VERDICT] {} rounds | {} turns | winner={} | fallbacks={} | repetition warnings={}",
            self.state.round_count(),
            self.turns(),
            winner,
            self.fallbacks,
            self.repetition_warnings
        )
    }
}

#[derive(Default)]
struct RunCounters {
    fallbacks: u32,
    missing_personas: u32,
    repetition_warnings: u32,
}

pub struct DebateOrchestrator {
    agents: AgentSet,
    router: TurnRouter,
    coherence: CoherenceController,
    sink: Arc<dyn EventSink>,
    observer: Arc<dyn DebateObserver>,
    config: RunConfig,
}

impl DebateOrchestrator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn PersonaStore>,
        sink: Arc<dyn EventSink>,
        config: RunConfig,
    ) -> Result<Self, DebateError> {
        config.validate()?;
        Ok(Self {
            agents: AgentSet::new(client, store),
            router: TurnRouter::new(config.round_threshold),
            coherence: CoherenceController::new(config.repetition_threshold),
            sink,
            observer: Arc::new(SilentObserver),
            config,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn DebateObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run one debate to a verdict. Fatal errors are also written to the
    /// event log as `RUN_ERROR`.
    pub async fn run(&self, topic: Topic) -> Result<DebateOutcome, DebateError> {
        self.sink.record(DebateEvent::SystemStart {
            topic: topic.to_string(),
            seed: self.config.seed,
            model: self.config.model.clone(),
            rounds: self.config.round_threshold,
            prompt_version: PROMPT_VERSION.to_string(),
        });
        self.observer.on_start(&topic, &self.config);

        match self.drive(topic).await {
            Ok(outcome) => {
                info!(summary = %outcome.summary_line(), "Debate complete");
                Ok(outcome)
            }
            Err(e) => {
                error!(error = %e, "Debate aborted");
                self.sink.record(DebateEvent::RunError {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn drive(&self, topic: Topic) -> Result<DebateOutcome, DebateError> {
        let mut state = DebateState::new(topic);
        let mut transitions = Vec::new();
        let mut counters = RunCounters::default();
        let mut node = DebateNode::ENTRY;

        loop {
            let (next, reason) = match node {
                DebateNode::Scientist => {
                    self.persona_node(Persona::Scientist, &mut state, &mut counters)
                        .await?;
                    (DebateNode::RoundsController, "turn taken".to_string())
                }
                DebateNode::Philosopher => {
                    self.persona_node(Persona::Philosopher, &mut state, &mut counters)
                        .await?;
                    (DebateNode::RoundsController, "turn taken".to_string())
                }
                DebateNode::RoundsController => {
                    self.controller_node(&mut state, &mut counters)?;
                    let round = state.round_count();
                    let route = self.router.route(round, state.current_speaker());
                    (
                        DebateNode::from(route),
                        format!("round {} of {}", round, self.config.round_threshold),
                    )
                }
                DebateNode::Judge => {
                    let verdict = self.judge_node(&mut state).await?;
                    transitions.push(DebateTransition::checked(
                        DebateNode::Judge,
                        DebateNode::Terminated,
                        "verdict recorded",
                    )?);
                    return Ok(DebateOutcome {
                        state,
                        verdict,
                        transitions,
                        fallbacks: counters.fallbacks,
                        missing_personas: counters.missing_personas,
                        repetition_warnings: counters.repetition_warnings,
                    });
                }
                DebateNode::Terminated => {
                    return Err(TransitionError {
                        from: node,
                        to: node,
                        reason: "debate already terminated".to_string(),
                    }
                    .into());
                }
            };

            transitions.push(DebateTransition::checked(node, next, &reason)?);
            node = next;
        }
    }

    async fn persona_node(
        &self,
        persona: Persona,
        state: &mut DebateState,
        counters: &mut RunCounters,
    ) -> Result<(), DebateError> {
        let turn = self
            .agents
            .persona(persona)
            .take_turn(state, &self.config)
            .await;

        let stage = persona.to_string();
        self.record_failures(&stage, self.config.retry.max_attempts, turn.failures());
        match &turn.source {
            TurnSource::Fallback { failures } => {
                counters.fallbacks += 1;
                self.sink.record(DebateEvent::FallbackUsed {
                    persona,
                    attempts: failures.len() as u32,
                });
            }
            TurnSource::PersonaMissing { detail } => {
                counters.missing_personas += 1;
                self.sink.record(DebateEvent::PersonaMissing {
                    persona,
                    detail: detail.clone(),
                });
            }
            TurnSource::Model { .. } => {}
        }

        state.apply(turn.delta.clone())?;
        self.sink.record(DebateEvent::NodeTransition {
            node: DebateNode::from(persona),
            delta: turn.delta.clone(),
        });
        self.observer.on_turn(&turn, state);

        let delay = self.config.effective_turn_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn controller_node(
        &self,
        state: &mut DebateState,
        counters: &mut RunCounters,
    ) -> Result<(), DebateError> {
        let report = self.coherence.check(state);
        for finding in &report.findings {
            counters.repetition_warnings += 1;
            self.sink.record(DebateEvent::RepetitionWarning {
                round: report.round_count,
                entry_index: finding.entry_index,
                similarity: finding.similarity,
            });
            self.observer.on_repetition(finding, state);
        }

        let delta = report.delta();
        state.apply(delta.clone())?;
        self.sink.record(DebateEvent::NodeTransition {
            node: DebateNode::RoundsController,
            delta,
        });
        info!(status = %state.status_line(), "Round complete");
        Ok(())
    }

    async fn judge_node(&self, state: &mut DebateState) -> Result<Verdict, DebateError> {
        self.observer.on_judging(state);
        let verdict = match self.agents.judge().deliberate(state, &self.config).await {
            Ok(verdict) => verdict,
            Err(e) => {
                self.record_failures("Judge", self.config.judge_attempts, &e.failures);
                return Err(e.into());
            }
        };
        self.record_failures("Judge", self.config.judge_attempts, &verdict.failures);

        let delta = StateDelta::verdict(verdict.text.clone());
        state.apply(delta.clone())?;
        self.sink.record(DebateEvent::NodeTransition {
            node: DebateNode::Judge,
            delta,
        });
        self.sink.record(DebateEvent::FinalVerdict {
            verdict: verdict.text.clone(),
        });
        self.observer.on_verdict(&verdict);
        Ok(verdict)
    }

    fn record_failures(&self, stage: &str, max_attempts: u32, failures: &[AttemptFailure]) {
        for failure in failures {
            self.sink.record(DebateEvent::RetryAttemptFailed {
                stage: stage.to_string(),
                attempt: failure.attempt,
                max_attempts,
                error: failure.error.clone(),
            });
        }
    }
}
