//! Recently spoken messages
//!
//! Kept as a JSON array in the private data directory so the user can
//! re-speak a recent phrase.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Maximum number of messages retained
pub const MAX_HISTORY: usize = 10;

/// A spoken message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Creation time in nanoseconds since the Unix epoch
    pub id: i64,
    pub message: String,
}

/// Persistent message history
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    messages: Vec<Message>,
}

impl HistoryStore {
    /// Empty history backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            messages: Vec::new(),
        }
    }

    /// Load history from `path`; a missing file is an empty history
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but is not valid history JSON
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let messages = match std::fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, messages })
    }

    /// Write the history back to disk
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(&self.messages)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }

    /// Append `text` as the newest message
    ///
    /// Any existing identical message is removed first and the oldest
    /// messages are dropped beyond [`MAX_HISTORY`].
    pub fn record(&mut self, text: &str) {
        self.messages.retain(|m| m.message != text);
        while self.messages.len() >= MAX_HISTORY {
            self.messages.remove(0);
        }
        let id = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_micros().saturating_mul(1000));
        self.messages.push(Message {
            id,
            message: text.to_string(),
        });
    }

    /// Messages, oldest first
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
