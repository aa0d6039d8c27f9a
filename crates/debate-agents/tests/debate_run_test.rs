//! End-to-end debate runs against a scripted completion client (no network).
//!
//! Covers: persona agents ↔ retry wrapper ↔ coherence controller ↔ router ↔
//! judge ↔ event log running together through the orchestrator.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use debate_agents::prompts::PROMPT_VERSION;
use debate_agents::{
    AgentTurn, CompletionClient, CompletionError, CompletionRequest, DebateError, DebateObserver,
    DebateOrchestrator, FilePersonaStore, PersonaStore, RunConfig, StaticPersonaStore, Verdict,
    FALLBACK_UTTERANCE,
};
use moderation::events::LogRecord;
use moderation::{
    validate_topic, DebateEvent, DebateNode, DebateState, JsonlEventLog, MemorySink, Origin,
    Persona, Topic,
};

const ARGUMENTS: &[&str] = &[
    "Controlled trials show regulation lowers incident rates.",
    "Lower incident rates say nothing about whose values the rules encode.",
    "Audits of deployed models reveal measurable bias that rules can target.",
    "Targeting bias presumes we agree on fairness, which we do not.",
    "Disagreement on fairness has not stopped aviation safety standards.",
    "Aircraft do not make moral choices; these systems shape them.",
    "Benchmarks now quantify that influence with reproducible metrics.",
    "A metric is a definition of the good wearing a lab coat.",
];

const VERDICT: &str = "Winner: Scientist\nReason: Consistent evidence.\nSummary: A close exchange.";

type Reply = Result<String, CompletionError>;

/// Serves queued replies; persona turns fall back to a rotating set of
/// distinct arguments once their queue is empty.
#[derive(Default)]
struct ScriptedClient {
    turns: Mutex<VecDeque<Reply>>,
    verdicts: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    fn new() -> Self {
        Self::default()
    }

    fn with_turns(self, replies: Vec<Reply>) -> Self {
        self.turns.lock().unwrap().extend(replies);
        self
    }

    fn with_verdicts(self, replies: Vec<Reply>) -> Self {
        self.verdicts.lock().unwrap().extend(replies);
        self
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn judge_requests(&self) -> Vec<CompletionRequest> {
        self.requests().into_iter().filter(is_judge).collect()
    }

    fn turn_requests(&self) -> Vec<CompletionRequest> {
        self.requests().into_iter().filter(is_turn).collect()
    }
}

fn is_judge(request: &CompletionRequest) -> bool {
    request.messages.len() == 1 && request.messages[0].content.contains("impartial Judge")
}

fn is_turn(request: &CompletionRequest) -> bool {
    !is_judge(request)
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let judge = is_judge(request);
        let served = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.iter().filter(|r| is_judge(r) == judge).count()
        };
        if judge {
            self.verdicts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(VERDICT.to_string()))
        } else {
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ARGUMENTS[(served - 1) % ARGUMENTS.len()].to_string()))
        }
    }
}

#[derive(Default)]
struct RecordingObserver {
    turns: Mutex<Vec<(Persona, u32, String)>>,
    verdicts: Mutex<Vec<String>>,
    judging: Mutex<u32>,
}

impl DebateObserver for RecordingObserver {
    fn on_turn(&self, turn: &AgentTurn, state: &DebateState) {
        self.turns
            .lock()
            .unwrap()
            .push((turn.persona, state.round_count() + 1, turn.text.clone()));
    }

    fn on_judging(&self, _state: &DebateState) {
        *self.judging.lock().unwrap() += 1;
    }

    fn on_verdict(&self, verdict: &Verdict) {
        self.verdicts.lock().unwrap().push(verdict.text.clone());
    }
}

fn topic() -> Topic {
    validate_topic("Should AI be regulated?").unwrap()
}

fn briefs() -> Arc<dyn PersonaStore> {
    Arc::new(
        StaticPersonaStore::new()
            .with(Persona::Scientist, "You are an empirical scientist.")
            .with(Persona::Philosopher, "You are a careful philosopher."),
    )
}

fn seeded() -> RunConfig {
    RunConfig::default().with_seed(Some(42))
}

fn read_log(path: &std::path::Path) -> Vec<LogRecord> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// ── Full seeded run ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_seeded_run_alternates_eight_turns_then_judges() {
    let client = Arc::new(ScriptedClient::new());
    let sink = Arc::new(MemorySink::new());
    let orchestrator =
        DebateOrchestrator::new(client.clone(), briefs(), sink.clone(), seeded()).unwrap();

    let topic = validate_topic("Is free will an illusion?").unwrap();
    let outcome = orchestrator.run(topic).await.unwrap();

    let transcript = outcome.state.transcript();
    assert_eq!(transcript.len(), 9);
    assert_eq!(transcript[0].origin(), Origin::Human);
    assert_eq!(transcript[0].content(), "Topic: Is free will an illusion?");
    for (i, entry) in transcript[1..].iter().enumerate() {
        let expected = if i % 2 == 0 {
            Origin::Scientist
        } else {
            Origin::Philosopher
        };
        assert_eq!(entry.origin(), expected, "entry {}", i + 1);
        assert_eq!(entry.content(), ARGUMENTS[i]);
    }

    assert_eq!(outcome.state.round_count(), 8);
    assert_eq!(outcome.state.current_speaker(), Some(Persona::Philosopher));
    assert!(outcome.state.final_verdict().contains("Winner:"));
    assert_eq!(outcome.winner(), Some(Persona::Scientist));
    assert_eq!(outcome.turns(), 8);
    assert_eq!(outcome.fallbacks, 0);

    assert_eq!(client.judge_requests().len(), 1);
    assert_eq!(client.turn_requests().len(), 8);
    for request in client.requests() {
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.seed, Some(42));
    }

    assert_eq!(sink.count("SYSTEM_START"), 1);
    // 8 persona nodes, 8 controller passes, 1 judge.
    assert_eq!(sink.count("NODE_TRANSITION"), 17);
    assert_eq!(sink.count("FINAL_VERDICT"), 1);
    assert_eq!(sink.count("RETRY_ATTEMPT_FAILED"), 0);
    assert_eq!(sink.count("REPETITION_WARNING"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transition_history_ends_at_terminated() {
    let client = Arc::new(ScriptedClient::new());
    let orchestrator = DebateOrchestrator::new(
        client,
        briefs(),
        Arc::new(MemorySink::new()),
        seeded().with_rounds(3),
    )
    .unwrap();

    let outcome = orchestrator.run(topic()).await.unwrap();
    let nodes: Vec<DebateNode> = std::iter::once(outcome.transitions[0].from)
        .chain(outcome.transitions.iter().map(|t| t.to))
        .collect();
    assert_eq!(
        nodes,
        vec![
            DebateNode::Scientist,
            DebateNode::RoundsController,
            DebateNode::Philosopher,
            DebateNode::RoundsController,
            DebateNode::Scientist,
            DebateNode::RoundsController,
            DebateNode::Judge,
            DebateNode::Terminated,
        ]
    );
    let summary = outcome.summary_line();
    assert!(summary.starts_with("[VERDICT] 3 rounds | 3 turns"));
}

#[tokio::test(start_paused = true)]
async fn test_context_window_is_capped_at_three_entries() {
    let client = Arc::new(ScriptedClient::new());
    let orchestrator = DebateOrchestrator::new(
        client.clone(),
        briefs(),
        Arc::new(MemorySink::new()),
        seeded(),
    )
    .unwrap();
    orchestrator.run(topic()).await.unwrap();

    let turns = client.turn_requests();
    // brief + min(entries, 3) + directive
    let sizes: Vec<usize> = turns.iter().map(|r| r.messages.len()).collect();
    assert_eq!(sizes, vec![3, 4, 5, 5, 5, 5, 5, 5]);
    let last = turns.last().unwrap();
    assert_eq!(last.messages[1].content, ARGUMENTS[4]);
    assert_eq!(last.messages[3].content, ARGUMENTS[6]);
}

// ── Retry and fallback ────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_exhausted_turn_uses_fallback_and_continues() {
    let transport = || Err(CompletionError::Transport("connection refused".into()));
    let failures = vec![transport(), transport(), transport()];
    let client = Arc::new(ScriptedClient::new().with_turns(failures));
    let sink = Arc::new(MemorySink::new());
    let orchestrator = DebateOrchestrator::new(
        client.clone(),
        briefs(),
        sink.clone(),
        seeded().with_rounds(2),
    )
    .unwrap();

    let start = tokio::time::Instant::now();
    let outcome = orchestrator.run(topic()).await.unwrap();

    let transcript = outcome.state.transcript();
    assert_eq!(transcript[1].origin(), Origin::Scientist);
    assert_eq!(transcript[1].content(), FALLBACK_UTTERANCE);
    assert_eq!(transcript[2].origin(), Origin::Philosopher);
    assert_eq!(outcome.fallbacks, 1);

    assert_eq!(sink.count("RETRY_ATTEMPT_FAILED"), 3);
    assert_eq!(sink.count("FALLBACK_USED"), 1);
    let fallback = DebateEvent::FallbackUsed {
        persona: Persona::Scientist,
        attempts: 3,
    };
    assert!(sink.events().contains(&fallback));
    // Two 1s backoffs; seeded runs skip the turn delay.
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_recovers_without_fallback() {
    let replies = vec![
        Err(CompletionError::RateLimited { retry_after: None }),
        Ok("Recovered argument.".to_string()),
    ];
    let client = Arc::new(ScriptedClient::new().with_turns(replies));
    let sink = Arc::new(MemorySink::new());
    let config = seeded().with_rounds(1);
    let orchestrator = DebateOrchestrator::new(client, briefs(), sink.clone(), config).unwrap();

    let outcome = orchestrator.run(topic()).await.unwrap();
    let transcript = outcome.state.transcript();
    assert_eq!(transcript[1].content(), "Recovered argument.");
    assert_eq!(sink.count("RETRY_ATTEMPT_FAILED"), 1);
    assert_eq!(sink.count("FALLBACK_USED"), 0);
}

// ── Missing persona brief ─────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_missing_scientist_brief_records_system_errors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("philosopher.txt"),
        "You are a careful philosopher.\n",
    )
    .unwrap();

    let client = Arc::new(ScriptedClient::new());
    let sink = Arc::new(MemorySink::new());
    let orchestrator = DebateOrchestrator::new(
        client.clone(),
        Arc::new(FilePersonaStore::new(dir.path())),
        sink.clone(),
        seeded().with_rounds(4),
    )
    .unwrap();

    let outcome = orchestrator.run(topic()).await.unwrap();
    let transcript = outcome.state.transcript();
    assert_eq!(transcript.len(), 5);
    for i in [1, 3] {
        assert_eq!(transcript[i].origin(), Origin::SystemError);
        assert_eq!(
            transcript[i].content(),
            "[System Error: scientist.txt not found]"
        );
    }
    for i in [2, 4] {
        assert_eq!(transcript[i].origin(), Origin::Philosopher);
    }

    // Only the Philosopher and the judge reached the model.
    assert_eq!(client.turn_requests().len(), 2);
    assert_eq!(client.judge_requests().len(), 1);
    assert_eq!(outcome.missing_personas, 2);
    assert_eq!(sink.count("PERSONA_MISSING"), 2);

    // System errors reach the philosopher as human messages.
    let second = &client.turn_requests()[1];
    let system_error = second
        .messages
        .iter()
        .find(|m| m.content == "[System Error: scientist.txt not found]")
        .unwrap();
    assert_eq!(system_error.role, debate_agents::Role::Human);
}

// ── Judge failure ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_judge_exhaustion_aborts_and_logs_run_error() {
    let unavailable = || {
        Err(CompletionError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    };
    let failures = vec![unavailable(), unavailable(), unavailable()];
    let client = Arc::new(ScriptedClient::new().with_verdicts(failures));
    let dir = tempfile::tempdir().unwrap();
    let log = JsonlEventLog::create(dir.path()).unwrap();
    let log_path = log.path().to_path_buf();

    let orchestrator = DebateOrchestrator::new(
        client.clone(),
        briefs(),
        Arc::new(log),
        seeded().with_rounds(2),
    )
    .unwrap();

    let err = orchestrator.run(topic()).await.unwrap_err();
    assert!(matches!(err, DebateError::Judge(_)));
    assert!(err.to_string().contains("503"));
    assert_eq!(client.judge_requests().len(), 3);

    let records = read_log(&log_path);
    let last = records.last().unwrap();
    assert_eq!(last.event.event_type(), "RUN_ERROR");
    let kinds: Vec<&str> = records.iter().map(|r| r.event.event_type()).collect();
    assert!(!kinds.contains(&"FINAL_VERDICT"));
    let failed = "RETRY_ATTEMPT_FAILED";
    assert_eq!(kinds.iter().filter(|k| **k == failed).count(), 3);
}

// ── Event log ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_event_log_is_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log = JsonlEventLog::create(&dir.path().join("logs")).unwrap();
    let log_path = log.path().to_path_buf();
    let file_name = log_path.file_name().unwrap().to_string_lossy();
    assert!(file_name.starts_with("debate_log_"));
    assert!(file_name.ends_with(".json"));

    let orchestrator = DebateOrchestrator::new(
        Arc::new(ScriptedClient::new()),
        briefs(),
        Arc::new(log),
        seeded().with_rounds(2),
    )
    .unwrap();
    orchestrator.run(topic()).await.unwrap();

    let raw = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<serde_json::Value> = raw
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    for line in &lines {
        assert!(line["timestamp"].is_string());
        assert!(line["event_type"].is_string());
    }

    assert_eq!(lines[0]["event_type"], "SYSTEM_START");
    assert_eq!(lines[0]["data"]["topic"], "Should AI be regulated?");
    assert_eq!(lines[0]["data"]["seed"], 42);
    assert_eq!(lines[0]["data"]["rounds"], 2);
    assert_eq!(lines[0]["data"]["prompt_version"], PROMPT_VERSION);

    assert_eq!(lines[1]["event_type"], "NODE_TRANSITION");
    assert_eq!(lines[1]["data"]["node"], "Scientist");
    assert_eq!(lines[1]["data"]["delta"]["current_speaker"], "scientist");

    let last = lines.last().unwrap();
    assert_eq!(last["event_type"], "FINAL_VERDICT");
    assert_eq!(last["data"]["verdict"], VERDICT);
}

// ── Observer and pacing ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_observer_sees_every_turn_and_one_verdict() {
    let observer = Arc::new(RecordingObserver::default());
    let orchestrator = DebateOrchestrator::new(
        Arc::new(ScriptedClient::new()),
        briefs(),
        Arc::new(MemorySink::new()),
        seeded(),
    )
    .unwrap()
    .with_observer(observer.clone());

    orchestrator.run(topic()).await.unwrap();

    let turns = observer.turns.lock().unwrap().clone();
    assert_eq!(turns.len(), 8);
    let rounds: Vec<u32> = turns.iter().map(|(_, round, _)| *round).collect();
    assert_eq!(rounds, (1..=8).collect::<Vec<_>>());
    assert_eq!(turns[0].0, Persona::Scientist);
    assert_eq!(turns[7].0, Persona::Philosopher);
    assert_eq!(*observer.judging.lock().unwrap(), 1);
    assert_eq!(observer.verdicts.lock().unwrap().as_slice(), [VERDICT]);
}

#[tokio::test(start_paused = true)]
async fn test_unseeded_run_is_exploratory_and_paced() {
    let client = Arc::new(ScriptedClient::new());
    let orchestrator = DebateOrchestrator::new(
        client.clone(),
        briefs(),
        Arc::new(MemorySink::new()),
        RunConfig::default().with_rounds(4),
    )
    .unwrap();

    let start = tokio::time::Instant::now();
    orchestrator.run(topic()).await.unwrap();

    for request in client.turn_requests() {
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.seed, None);
    }
    // Judge stays deterministic in exploratory runs.
    assert_eq!(client.judge_requests()[0].temperature, 0.0);
    // 500ms after each of the 4 turns.
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}
