//! Completion session state machine
//!
//! A session captures a span of the caller's buffer, fills a ranked
//! candidate list (locally or through the corrector), lets the caller move
//! through and narrow that list, and finally commits a replacement or
//! restores the original text.
//!
//! ```text
//! Idle ──start──▶ Active(Local | AwaitingNetwork) ──reply──▶ Active(Corrected)
//!   ▲                          │
//!   └──────── accept / cancel ─┘
//! ```
//!
//! The session never performs I/O. Starting against an available corrector
//! yields a [`CorrectionRequest`]; the owner runs it and hands the
//! [`CorrectionReply`] back through [`CompletionSession::install_reply`].
//! Replies tagged with an older session id are dropped.

use std::ops::Range;

use tokio::task::AbortHandle;

use super::buffer::{TextBuffer, char_slice, replace_chars};
use super::highlight::{HighlightedWord, highlight, unhighlighted};
use super::score::score;
use crate::audit::{AuditEntry, AuditSink};
use crate::text::tokenize_words;

/// Span text that offers the whole corpus for refinement
pub const REFINE_TRIGGER: &str = "z";

/// How the corrector may be used when a session starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectorMode {
    /// Corrections disabled; rank the corpus locally
    Disabled,
    /// Corrections enabled but no service address is known
    Unresolved,
    /// Corrections enabled and the service is at this `host:port`
    Available(String),
}

/// Where the active session's candidates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// Installed synchronously from the corpus or the context
    Local,
    /// Waiting on a corrector reply
    AwaitingNetwork,
    /// Installed from a corrector reply
    Corrected,
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active(Acquisition),
}

/// Corrector round trip the owner must perform for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionRequest {
    pub session_id: u64,
    pub addr: String,
    pub context: String,
}

/// Candidates produced by a corrector round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionReply {
    pub session_id: u64,
    pub candidates: Vec<String>,
}

/// Caller input to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(TextBuffer),
    Accept,
    Cancel,
    Refine(char),
    SelectNext,
    SelectPrevious,
}

/// Snapshot of what the caller should display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    /// Candidates, best first
    pub candidates: Vec<String>,
    /// Per-candidate words, with corrected words flagged
    pub highlights: Vec<Vec<HighlightedWord>>,
    pub selected_index: Option<usize>,
    pub is_active: bool,
    pub awaiting_network: bool,
    pub refining: bool,
}

impl SessionView {
    /// Text of the selected candidate
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected_index
            .and_then(|i| self.candidates.get(i))
            .map(String::as_str)
    }
}

/// Result of handling an [`Event`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub view: SessionView,
    /// Buffer contents the caller must install, after accept or cancel
    pub edit: Option<TextBuffer>,
}

/// An in-progress completion interaction
#[derive(Debug)]
pub struct CompletionSession {
    id: u64,
    state: SessionState,
    original_text: String,
    original_selection: Range<usize>,
    original_span: Range<usize>,
    candidates: Vec<String>,
    selected: Option<usize>,
    refinement: String,
    allow_refinement: bool,
    in_flight: Option<AbortHandle>,
}

impl Default for CompletionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSession {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            id: 0,
            state: SessionState::Idle,
            original_text: String::new(),
            original_selection: 0..0,
            original_span: 0..0,
            candidates: Vec::new(),
            selected: None,
            refinement: String::new(),
            allow_refinement: false,
            in_flight: None,
        }
    }

    /// Identity of the current (or most recent) session
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Candidates, best first
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Text of the span under completion
    #[must_use]
    pub fn span_text(&self) -> String {
        char_slice(&self.original_text, &self.original_span)
    }

    /// Begin a session over `buffer`
    ///
    /// Supersedes any active session: its in-flight request is aborted and
    /// its late reply will no longer match. The span is the selection, or
    /// the whole buffer when the selection is empty. Returns the corrector
    /// request to run when candidates must come from the network.
    pub fn start(
        &mut self,
        buffer: &TextBuffer,
        corpus: &[String],
        mode: &CorrectorMode,
    ) -> Option<CorrectionRequest> {
        self.reset();
        self.id += 1;

        let selection = buffer.clamped_selection();
        self.original_span = if selection.is_empty() {
            0..buffer.char_len()
        } else {
            selection.clone()
        };
        self.original_selection = selection;
        self.original_text.clone_from(&buffer.text);
        self.state = SessionState::Active(Acquisition::Local);

        let span = self.span_text();
        let context = buffer.text.as_str();
        let words = tokenize_words(&span);

        tracing::debug!(session = self.id, span, ?mode, "completion session started");

        if words.is_empty() {
            return None;
        }

        if words.len() == 1 && words[0] == REFINE_TRIGGER {
            self.allow_refinement = true;
            self.install(corpus.to_vec());
            return None;
        }

        match mode {
            CorrectorMode::Available(addr) => {
                self.state = SessionState::Active(Acquisition::AwaitingNetwork);
                Some(CorrectionRequest {
                    session_id: self.id,
                    addr: addr.clone(),
                    context: context.to_string(),
                })
            }
            CorrectorMode::Unresolved => {
                self.install(vec![context.to_string()]);
                None
            }
            CorrectorMode::Disabled => {
                self.install(score(corpus, &span));
                None
            }
        }
    }

    /// Track the task running this session's corrector request
    ///
    /// A handle for a session that is no longer waiting is aborted at once.
    pub fn attach_request(&mut self, session_id: u64, handle: AbortHandle) {
        if session_id == self.id && self.state == SessionState::Active(Acquisition::AwaitingNetwork)
        {
            self.in_flight = Some(handle);
        } else {
            handle.abort();
        }
    }

    /// Install corrector candidates if `reply` belongs to this session
    ///
    /// Returns whether the reply was installed.
    pub fn install_reply(&mut self, reply: CorrectionReply) -> bool {
        if reply.session_id != self.id
            || self.state != SessionState::Active(Acquisition::AwaitingNetwork)
        {
            tracing::debug!(
                reply_session = reply.session_id,
                session = self.id,
                "dropping stale corrector reply"
            );
            return false;
        }

        self.in_flight = None;
        self.state = SessionState::Active(Acquisition::Corrected);
        let candidates = if reply.candidates.is_empty() {
            vec![self.original_text.clone()]
        } else {
            reply.candidates
        };
        self.install(candidates);
        true
    }

    /// Narrow the candidates by one more typed character
    ///
    /// Only effective for refinement sessions. A refinement that matches
    /// nothing leaves the list unchanged.
    pub fn refine(&mut self, c: char) {
        if !self.is_active() || !self.allow_refinement {
            return;
        }

        self.refinement.extend(c.to_lowercase());
        let refined: Vec<String> = self
            .candidates
            .iter()
            .filter(|cand| cand.to_lowercase().contains(&self.refinement))
            .cloned()
            .collect();

        if refined.is_empty() {
            tracing::trace!(refinement = self.refinement, "refinement matched nothing");
        } else {
            self.install(refined);
        }
    }

    /// Move the selection toward worse candidates, stopping at the end
    pub fn select_next(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some((i + 1).min(self.candidates.len().saturating_sub(1)));
        }
    }

    /// Move the selection toward better candidates, stopping at the start
    pub fn select_previous(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(1));
        }
    }

    /// Commit the selected candidate into the span
    ///
    /// With no candidates this behaves exactly like [`cancel`](Self::cancel).
    /// Returns the buffer the caller must install.
    pub fn accept(&mut self, audit: &dyn AuditSink) -> Option<TextBuffer> {
        let Some(chosen) = self.selected.and_then(|i| self.candidates.get(i)).cloned() else {
            return self.cancel(audit);
        };

        let text = replace_chars(&self.original_text, &self.original_span, &chosen);
        let caret = self.original_span.start + chosen.chars().count();

        audit.record(AuditEntry::completion(
            &text,
            &self.span_text(),
            &self.candidates,
            true,
        ));
        tracing::debug!(session = self.id, chosen, "completion accepted");

        self.reset();
        Some(TextBuffer::new(text, caret..caret))
    }

    /// Abandon the session and restore the original buffer
    ///
    /// Returns `None` when no session is active.
    pub fn cancel(&mut self, audit: &dyn AuditSink) -> Option<TextBuffer> {
        if !self.is_active() {
            return None;
        }

        audit.record(AuditEntry::completion(
            &self.original_text,
            &self.span_text(),
            &self.candidates,
            false,
        ));
        tracing::debug!(session = self.id, "completion cancelled");

        let restored = TextBuffer::new(
            std::mem::take(&mut self.original_text),
            self.original_selection.clone(),
        );
        self.reset();
        Some(restored)
    }

    /// Snapshot for the caller
    #[must_use]
    pub fn view(&self) -> SessionView {
        let highlights = self
            .candidates
            .iter()
            .map(|c| {
                if self.state == SessionState::Active(Acquisition::Corrected) {
                    highlight(c, &self.original_text)
                } else {
                    unhighlighted(c)
                }
            })
            .collect();

        SessionView {
            candidates: self.candidates.clone(),
            highlights,
            selected_index: self.selected,
            is_active: self.is_active(),
            awaiting_network: self.state == SessionState::Active(Acquisition::AwaitingNetwork),
            refining: self.allow_refinement,
        }
    }

    fn install(&mut self, candidates: Vec<String>) {
        self.selected = if candidates.is_empty() { None } else { Some(0) };
        self.candidates = candidates;
    }

    fn reset(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            tracing::debug!(session = self.id, "cancelling corrector request");
            handle.abort();
        }
        self.state = SessionState::Idle;
        self.original_text.clear();
        self.original_selection = 0..0;
        self.original_span = 0..0;
        self.candidates.clear();
        self.selected = None;
        self.refinement.clear();
        self.allow_refinement = false;
    }
}
