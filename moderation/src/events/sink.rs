//! Event sinks — where debate events go.
//!
//! All sinks are best effort. A sink that cannot write reports the problem
//! through `tracing` and carries on; it never fails the debate.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, warn};

use super::types::{DebateEvent, LogRecord};

/// Append-only receiver of debate events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: DebateEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: DebateEvent) {}
}

/// Keeps records in memory; used by tests and by callers that want the log
/// after the run.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Recorded events in order, without timestamps.
    pub fn events(&self) -> Vec<DebateEvent> {
        self.records().into_iter().map(|r| r.event).collect()
    }

    /// How many events of one type were recorded.
    pub fn count(&self, event_type: &str) -> usize {
        self.records()
            .iter()
            .filter(|r| r.event.event_type() == event_type)
            .count()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: DebateEvent) {
        let record = LogRecord::now(event);
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

/// One JSON object per line in `<log_dir>/debate_log_<unix_seconds>.json`.
#[derive(Debug, Clone)]
pub struct JsonlEventLog {
    path: PathBuf,
}

impl JsonlEventLog {
    /// Create the log directory if needed and pick a fresh file name.
    ///
    /// The file itself is created on the first write.
    pub fn create(log_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("debate_log_{}.json", Utc::now().timestamp()));
        debug!(path = %path.display(), "Debate log initialized");
        Ok(Self { path })
    }

    /// Log to an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl EventSink for JsonlEventLog {
    fn record(&self, event: DebateEvent) {
        let event_type = event.event_type();
        match serde_json::to_string(&LogRecord::now(event)) {
            Ok(json) => {
                if let Err(e) = self.append(&json) {
                    warn!(path = %self.path.display(), event_type, "Failed to append debate log: {e}");
                }
            }
            Err(e) => warn!(event_type, "Failed to serialize debate event: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(text: &str) -> DebateEvent {
        DebateEvent::FinalVerdict {
            verdict: text.to_string(),
        }
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.record(DebateEvent::RunError {
            message: "first".to_string(),
        });
        sink.record(verdict("second"));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "RUN_ERROR");
        assert_eq!(sink.count("FINAL_VERDICT"), 1);
    }

    #[test]
    fn test_jsonl_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlEventLog::create(&dir.path().join("logs")).unwrap();
        let name = log.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("debate_log_"));
        assert!(name.ends_with(".json"));

        log.record(verdict("Winner: Scientist"));
        log.record(verdict("again"));

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event_type"], "FINAL_VERDICT");
        assert_eq!(first["data"]["verdict"], "Winner: Scientist");
    }

    #[test]
    fn test_jsonl_log_no_file_until_first_event() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlEventLog::create(dir.path()).unwrap();
        assert!(!log.path().exists());
    }

    #[test]
    fn test_unwritable_log_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every append fail.
        let path = dir.path().join("blocked");
        std::fs::create_dir(&path).unwrap();
        let log = JsonlEventLog::at(&path);
        log.record(verdict("dropped"));
        assert!(path.is_dir());
    }
}
