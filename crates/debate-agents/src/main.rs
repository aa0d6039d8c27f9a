//! `debate` — run a moderated Scientist vs Philosopher debate.
//!
//! ```bash
//! # Prompt for a topic, 8 rounds, exploratory sampling
//! debate
//!
//! # Reproducible run
//! debate --topic "Is free will an illusion?" --seed 42
//!
//! # Write the state machine as Mermaid
//! debate --graph debate.mmd --topic "Should AI be regulated?"
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use debate_agents::{
    ConsoleRenderer, DebateOrchestrator, EndpointConfig, FileConfig, FilePersonaStore,
    OpenAiCompatibleClient, RunConfig,
};
use moderation::{validate_topic, DebateNode, EventSink, JsonlEventLog, NullSink};
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "debate", author, version, about, long_about = None)]
struct Args {
    /// Debate topic (prompted on stdin when omitted)
    #[arg(long)]
    topic: Option<String>,

    /// Seed for a reproducible run (forces temperature 0.0)
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the JSON-lines event log [default: logs]
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Directory holding scientist.txt and philosopher.txt [default: personas]
    #[arg(long)]
    persona_dir: Option<PathBuf>,

    /// Rounds before the judge is called (overrides the config file)
    #[arg(long)]
    rounds: Option<u32>,

    /// Model id (overrides DEBATE_MODEL and the config file)
    #[arg(long)]
    model: Option<String>,

    /// TOML file with run settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the debate state machine as a Mermaid graph to this file
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Log progress at info level (RUST_LOG still wins)
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    if let Some(path) = &args.graph {
        std::fs::write(path, DebateNode::mermaid())
            .with_context(|| format!("failed to write graph to {}", path.display()))?;
        info!(path = %path.display(), "Debate graph written");
    }

    let raw_topic = match &args.topic {
        Some(topic) => topic.clone(),
        None => prompt_topic()?,
    };
    // Nothing is created on disk until the topic is accepted.
    let topic = match validate_topic(&raw_topic) {
        Ok(topic) => topic,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let file = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let endpoint = EndpointConfig::from_env()?;

    let mut config = file.apply(RunConfig::default().with_model(endpoint.model.clone()));
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(rounds) = args.rounds {
        config.round_threshold = rounds;
    }
    let config = config.with_seed(args.seed);

    let persona_dir = args
        .persona_dir
        .or(file.persona_dir)
        .unwrap_or_else(|| PathBuf::from("personas"));
    let log_dir = args
        .log_path
        .or(file.log_dir)
        .unwrap_or_else(|| PathBuf::from("logs"));

    let client = Arc::new(
        OpenAiCompatibleClient::new(&endpoint).context("failed to build completion client")?,
    );
    let store = Arc::new(FilePersonaStore::new(persona_dir));

    let (sink, log_file) = open_event_log(&log_dir);

    let orchestrator = DebateOrchestrator::new(client, store, sink, config)?
        .with_observer(Arc::new(ConsoleRenderer::new()));

    match orchestrator.run(topic).await {
        Ok(outcome) => {
            println!("\n{}", outcome.summary_line());
            if let Some(path) = log_file {
                println!("Log saved to {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(path) = log_file {
                eprintln!("Log saved to {}", path.display());
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Best effort: without a writable log directory the run goes on unlogged.
fn open_event_log(log_dir: &Path) -> (Arc<dyn EventSink>, Option<PathBuf>) {
    match JsonlEventLog::create(log_dir) {
        Ok(log) => {
            let path = log.path().to_path_buf();
            (Arc::new(log), Some(path))
        }
        Err(e) => {
            warn!(dir = %log_dir.display(), error = %e, "Event log unavailable");
            (Arc::new(NullSink), None)
        }
    }
}

fn prompt_topic() -> Result<String> {
    print!("Enter debate topic: ");
    let mut stdout = std::io::stdout();
    stdout.flush().context("failed to flush stdout")?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read topic from stdin")?;
    Ok(line)
}
