//! Text tokenization and sentence detection
//!
//! Two tokenizers live here: a lossless structural split used to rewrite
//! text in place (pronunciation overrides, abbreviation checks) and a lossy
//! word split used only for matching.

mod sentence;
mod tokenize;

pub use sentence::{COMMON_ABBREVIATIONS, ends_sentence};
pub use tokenize::{DELIMITERS, normalize_token, tokenize_lossless, tokenize_words};
