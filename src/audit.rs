//! Audit log of completions and spoken text
//!
//! Appends one JSON object per line to `log.jsonl`. Every record carries
//! `text`, `keystrokes` and an RFC3339 UTC `timestamp`, plus event
//! annotations. Keys are written in sorted order. Logging is best-effort:
//! failures are reported through `tracing` and never reach the caller.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A single audit event before it is timestamped
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub text: String,
    pub keystrokes: String,
    pub annotations: Map<String, Value>,
}

impl AuditEntry {
    /// Outcome of a completion session
    #[must_use]
    pub fn completion(
        text: &str,
        completion_text: &str,
        completions: &[String],
        accepted: bool,
    ) -> Self {
        let mut annotations = Map::new();
        annotations.insert("completeAccepted".to_string(), Value::Bool(accepted));
        annotations.insert(
            "completionText".to_string(),
            Value::String(completion_text.to_string()),
        );
        annotations.insert(
            "completions".to_string(),
            Value::Array(completions.iter().cloned().map(Value::String).collect()),
        );

        Self {
            text: text.to_string(),
            keystrokes: String::new(),
            annotations,
        }
    }

    /// Text that was spoken, either on request or automatically
    #[must_use]
    pub fn spoken(text: &str, automatic: bool) -> Self {
        let mut annotations = Map::new();
        annotations.insert("automatic".to_string(), Value::Bool(automatic));

        Self {
            text: text.to_string(),
            keystrokes: String::new(),
            annotations,
        }
    }

    /// Whether this is a completion record with `completeAccepted == accepted`
    #[must_use]
    pub fn is_completion(&self, accepted: bool) -> bool {
        self.annotations.get("completeAccepted") == Some(&Value::Bool(accepted))
    }

    /// Full record stamped with `at`, keys in sorted order
    #[must_use]
    pub fn to_record(&self, at: DateTime<Utc>) -> BTreeMap<String, Value> {
        let mut record: BTreeMap<String, Value> = self
            .annotations
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        record.insert("text".to_string(), Value::String(self.text.clone()));
        record.insert(
            "keystrokes".to_string(),
            Value::String(self.keystrokes.clone()),
        );
        record.insert(
            "timestamp".to_string(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        record
    }
}

/// Receiver of audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// JSONL audit log file
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    enabled: bool,
}

impl AuditLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")
    }
}

impl AuditSink for AuditLog {
    fn record(&self, entry: AuditEntry) {
        if !self.enabled {
            return;
        }

        let line = match serde_json::to_string(&entry.to_record(Utc::now())) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize audit record");
                return;
            }
        };

        if let Err(e) = self.append(&line) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write audit record");
        }
    }
}

/// In-memory audit sink
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    /// Copy of every recorded entry, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_record_keys_sorted_and_timestamped() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        let entry = AuditEntry::completion(
            "I am here",
            "i am heer",
            &["I am here".to_string()],
            true,
        );
        let line = serde_json::to_string(&entry.to_record(at)).unwrap();
        assert_eq!(
            line,
            r#"{"completeAccepted":true,"completionText":"i am heer","completions":["I am here"],"keystrokes":"","text":"I am here","timestamp":"2024-03-01T12:30:05Z"}"#
        );
    }

    #[test]
    fn test_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("log.jsonl"), true);
        log.record(AuditEntry::spoken("hello", false));
        log.record(AuditEntry::spoken("bye", true));

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["text"], "bye");
        assert_eq!(second["automatic"], true);
        assert!(second["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("log.jsonl"), false);
        log.record(AuditEntry::spoken("hello", false));
        assert!(!log.path().exists());
    }
}
