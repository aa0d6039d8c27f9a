//! Prompt text for persona turns and the judge.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever any template changes.
//! Every run records it in its `SYSTEM_START` event.

use moderation::{DebateState, Persona, TranscriptEntry};

/// Prompt version. Bump on any template change.
pub const PROMPT_VERSION: &str = "1.1.0";

/// Closing instruction for a persona turn. Always the last message.
pub fn turn_directive(persona: Persona) -> String {
    format!(
        "You are the {persona}.\n\
         Review the context above. The last argument was made by your opponent, the {opponent}.\n\
         Provide a short, sharp counter-argument that directly answers it (max 2 sentences).\n\
         Do not repeat previous points.",
        persona = persona,
        opponent = persona.opponent(),
    )
}

/// One line per entry: `[Scientist] text`.
pub fn render_transcript(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("[{}] {}", e.origin(), e.content().trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The single prompt handed to the judge: topic plus the whole transcript.
pub fn judge_prompt(state: &DebateState) -> String {
    format!(
        "You are an impartial Judge. Review the following debate on the topic: \"{topic}\".\n\
         \n\
         Transcript:\n\
         {transcript}\n\
         \n\
         Task:\n\
         1. Summarize the debate.\n\
         2. Declare a winner ({scientist} or {philosopher}).\n\
         3. Provide a logical justification.\n\
         \n\
         Output Format:\n\
         Winner: [Name]\n\
         Reason: [Reasoning]\n\
         Summary: [Summary]",
        topic = state.topic(),
        transcript = render_transcript(state.transcript()),
        scientist = Persona::Scientist,
        philosopher = Persona::Philosopher,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use moderation::{validate_topic, StateDelta};

    #[test]
    fn test_directive_names_persona_and_limits() {
        let text = turn_directive(Persona::Philosopher);
        assert!(text.starts_with("You are the Philosopher."));
        assert!(text.contains("the Scientist"));
        assert!(text.contains("max 2 sentences"));
        assert!(text.contains("Do not repeat previous points."));
    }

    #[test]
    fn test_judge_prompt_embeds_topic_and_transcript() {
        let topic = validate_topic("Is free will an illusion?").unwrap();
        let mut state = DebateState::new(topic);
        state
            .apply(StateDelta::turn(
                Persona::Scientist,
                TranscriptEntry::utterance(Persona::Scientist, "Libet says yes."),
            ))
            .unwrap();

        let prompt = judge_prompt(&state);
        assert!(prompt.contains("\"Is free will an illusion?\""));
        assert!(prompt.contains("[Human] Topic: Is free will an illusion?"));
        assert!(prompt.contains("[Scientist] Libet says yes."));
        assert!(prompt.contains("Winner: [Name]"));
        assert!(prompt.contains("Reason: [Reasoning]"));
        assert!(prompt.contains("Summary: [Summary]"));
    }

    #[test]
    fn test_render_transcript_marks_system_errors() {
        let entries = vec![TranscriptEntry::system_error(
            "[System Error: scientist.txt not found]",
        )];
        assert_eq!(
            render_transcript(&entries),
            "[System] [System Error: scientist.txt not found]"
        );
    }
}
