//! Phrase completion and correction
//!
//! Local ranking of the phrase corpus, the corrector service client, and
//! the session state machine that ties them to the caller's text buffer.

mod buffer;
pub mod corpus;
pub mod corrector;
mod highlight;
pub mod score;
pub mod session;

pub use buffer::{TextBuffer, char_slice, replace_chars};
pub use corpus::Corpus;
pub use corrector::{CORRECTOR_TIMEOUT, CorrectionClient, CorrectorReply};
pub use highlight::{HighlightedWord, highlight};
pub use score::{Candidate, score, score_candidates};
pub use session::{
    Acquisition, CompletionSession, CorrectionReply, CorrectionRequest, CorrectorMode, Event,
    Outcome, REFINE_TRIGGER, SessionState, SessionView,
};
