//! Speech planning
//!
//! Decides how a phrase is voiced: a matching soundbite clip if one exists
//! and may be played, otherwise text prepared for the synthesizer with the
//! user's pronunciation overrides applied. Synthesis and playback happen
//! outside this crate.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::soundbite::SoundbiteIndex;
use crate::text::tokenize_lossless;

/// How a phrase should be voiced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utterance {
    /// Play this pre-recorded clip
    Soundbite(PathBuf),
    /// Synthesize this text
    Synthesize {
        text: String,
        /// Text is SSML markup
        ssml: bool,
    },
}

/// Token → replacement overrides for the synthesizer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pronunciations {
    overrides: HashMap<String, String>,
}

impl Pronunciations {
    /// Parse `token|replacement` lines
    ///
    /// Fields are trimmed and the token is lowercased. Lines without
    /// exactly two fields are skipped.
    #[must_use]
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut overrides = HashMap::new();
        for line in lines {
            let fields: Vec<&str> = line
                .as_ref()
                .split('|')
                .map(|f| f.trim_matches(|c: char| c == ' ' || c == '\t'))
                .collect();
            if let [token, replacement] = fields.as_slice() {
                overrides.insert(token.to_lowercase(), (*replacement).to_string());
            } else {
                tracing::debug!(line = line.as_ref(), "skipping malformed pronunciation rule");
            }
        }
        Self { overrides }
    }

    /// Replace every token that has an override, keeping spacing and punctuation
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        if self.overrides.is_empty() {
            return text.to_string();
        }
        tokenize_lossless(text)
            .into_iter()
            .map(|t| {
                self.overrides
                    .get(&t.to_lowercase())
                    .cloned()
                    .unwrap_or(t)
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Clean up text the synthesizer mishandles
///
/// Surrounding whitespace is trimmed, then surrounding backslashes; a
/// trailing backslash otherwise silences the whole utterance.
#[must_use]
pub fn fix_synth_bugs(text: &str) -> String {
    text.trim_matches(|c: char| c == ' ' || c == '\t')
        .trim_matches('\\')
        .to_string()
}

/// Decide how to voice `text`
///
/// `soundbites` is `None` when clips must not be played (disabled, or a
/// call is active).
#[must_use]
pub fn plan(
    text: &str,
    soundbites: Option<&SoundbiteIndex>,
    pronunciations: &Pronunciations,
) -> Utterance {
    if let Some(path) = soundbites.and_then(|index| index.lookup(text)) {
        tracing::debug!(path = %path.display(), "matched soundbite");
        return Utterance::Soundbite(path.to_path_buf());
    }

    let text = pronunciations.apply(&fix_synth_bugs(text));
    let ssml = text.starts_with('<');
    Utterance::Synthesize { text, ssml }
}
