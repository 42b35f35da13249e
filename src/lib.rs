//! Mavis - phrase engine for assisted speech
//!
//! This library provides the text side of an AAC (augmentative and
//! alternative communication) app:
//! - Phrase completion from the user's phrase list and soundbite names
//! - Sentence correction through a network corrector service
//! - Soundbite matching and speech planning
//! - Audit log and recent message history
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Caller (UI / CLI)                │
//! │        Event ──────────────▶  SessionView / edit     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                      Engine                          │
//! │  Corpus cache │ Session │ Speech plan │ Audit/History│
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │        Corrector service (HTTP, found via mDNS)      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod cache;
pub mod completion;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod files;
pub mod history;
pub mod soundbite;
pub mod speech;
pub mod text;

pub use audit::{AuditEntry, AuditLog, AuditSink, MemoryAuditLog};
pub use completion::{
    CompletionSession, CorrectionClient, CorrectorMode, Corpus, Event, Outcome, SessionView,
    TextBuffer, score,
};
pub use config::Config;
pub use discovery::{CorrectorLocator, MdnsBrowser, StaticLocator};
pub use engine::{Engine, SpeakOptions};
pub use error::{Error, Result};
pub use files::{FileLocations, UserFile};
pub use history::{HistoryStore, Message};
pub use soundbite::SoundbiteIndex;
pub use speech::{Pronunciations, Utterance};
