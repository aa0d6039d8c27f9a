//! Terminal rendering of a live debate.

use std::io::IsTerminal;

use moderation::{DebateState, Persona, RepetitionFinding, Topic};

use crate::agents::{AgentTurn, TurnSource, Verdict};
use crate::config::RunConfig;
use crate::orchestrator::DebateObserver;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";

const RULE_WIDTH: usize = 60;

/// Prints turns, warnings and the verdict to stdout.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleRenderer {
    color: bool,
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleRenderer {
    /// Colors only when stdout is a terminal and `NO_COLOR` is unset.
    pub fn new() -> Self {
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", style, text, RESET)
        } else {
            text.to_string()
        }
    }

    fn persona_style(persona: Persona) -> &'static str {
        match persona {
            Persona::Scientist => CYAN,
            Persona::Philosopher => YELLOW,
        }
    }

    pub fn header(&self, topic: &Topic, config: &RunConfig) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mode = match config.seed {
            Some(seed) => format!("deterministic, seed {}", seed),
            None => format!("temperature {}", config.agent_temperature()),
        };
        let title = format!("DEBATE: {}", topic);
        let details = format!(
            "{} rounds | model {} | {}",
            config.round_threshold, config.model, mode
        );
        format!(
            "{}\n{}\n{}\n{}",
            self.paint(MAGENTA, &rule),
            self.paint(&format!("{}{}", BOLD, MAGENTA), &title),
            self.paint(DIM, &details),
            self.paint(MAGENTA, &rule),
        )
    }

    pub fn turn_line(&self, turn: &AgentTurn, round: u32) -> String {
        let label = format!("[Round {}] {}:", round, turn.persona);
        let note = match &turn.source {
            TurnSource::Fallback { .. } => self.paint(DIM, " (fallback)"),
            TurnSource::PersonaMissing { .. } => self.paint(RED, " (persona missing)"),
            TurnSource::Model { .. } => String::new(),
        };
        format!(
            "{} {}{}",
            self.paint(Self::persona_style(turn.persona), &label),
            turn.text.trim(),
            note
        )
    }

    pub fn repetition_line(&self, finding: &RepetitionFinding) -> String {
        self.paint(
            DIM,
            &format!(
                "  ! repeats entry {} (similarity {:.2})",
                finding.entry_index, finding.similarity
            ),
        )
    }

    pub fn verdict_banner(&self, verdict: &Verdict) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "{}\n{}\n{}\n{}",
            self.paint(RED, &rule),
            self.paint(&format!("{}{}", BOLD, RED), "FINAL VERDICT"),
            verdict.text.trim(),
            self.paint(RED, &rule),
        )
    }
}

impl DebateObserver for ConsoleRenderer {
    fn on_start(&self, topic: &Topic, config: &RunConfig) {
        println!("{}\n", self.header(topic, config));
    }

    fn on_turn(&self, turn: &AgentTurn, state: &DebateState) {
        // The controller has not counted this turn yet.
        println!("{}\n", self.turn_line(turn, state.round_count() + 1));
    }

    fn on_repetition(&self, finding: &RepetitionFinding, _state: &DebateState) {
        println!("{}", self.repetition_line(finding));
    }

    fn on_judging(&self, _state: &DebateState) {
        println!("{}", self.paint(MAGENTA, "The Judge is deliberating..."));
    }

    fn on_verdict(&self, verdict: &Verdict) {
        println!("\n{}", self.verdict_banner(verdict));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moderation::{validate_topic, StateDelta, TranscriptEntry};

    fn turn(source: TurnSource, text: &str) -> AgentTurn {
        AgentTurn {
            persona: Persona::Philosopher,
            text: text.to_string(),
            delta: StateDelta::turn(
                Persona::Philosopher,
                TranscriptEntry::utterance(Persona::Philosopher, text),
            ),
            source,
        }
    }

    #[test]
    fn test_plain_turn_line() {
        let line = ConsoleRenderer::plain().turn_line(
            &turn(
                TurnSource::Model {
                    attempts: 1,
                    failures: Vec::new(),
                },
                "Meaning precedes measurement.\n",
            ),
            2,
        );
        assert_eq!(line, "[Round 2] Philosopher: Meaning precedes measurement.");
    }

    #[test]
    fn test_fallback_is_marked() {
        let fallback = TurnSource::Fallback { failures: vec![] };
        let renderer = ConsoleRenderer::plain();
        let line = renderer.turn_line(&turn(fallback, "I maintain my stance."), 5);
        assert!(line.ends_with("(fallback)"));
    }

    #[test]
    fn test_colored_output_uses_persona_color() {
        let renderer = ConsoleRenderer { color: true };
        let line = renderer.turn_line(
            &turn(
                TurnSource::Model {
                    attempts: 1,
                    failures: Vec::new(),
                },
                "x",
            ),
            1,
        );
        assert!(line.starts_with(YELLOW));
        assert!(line.contains(RESET));
    }

    #[test]
    fn test_header_mentions_seed() {
        let topic = validate_topic("Is free will an illusion?").unwrap();
        let header =
            ConsoleRenderer::plain().header(&topic, &RunConfig::default().with_seed(Some(42)));
        assert!(header.contains("DEBATE: Is free will an illusion?"));
        assert!(header.contains("deterministic, seed 42"));
        assert!(!header.contains('\x1b'));
    }

    #[test]
    fn test_verdict_banner() {
        let banner = ConsoleRenderer::plain().verdict_banner(&Verdict {
            text: "Winner: Scientist".to_string(),
            attempts: 1,
            failures: Vec::new(),
        });
        assert!(banner.contains("FINAL VERDICT"));
        assert!(banner.contains("Winner: Scientist"));
    }
}
