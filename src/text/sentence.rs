//! End-of-sentence detection for automatic speaking

use super::tokenize_lossless;

/// Abbreviations whose trailing period does not end a sentence
pub const COMMON_ABBREVIATIONS: &[&str] = &[
    "a.m", "ave", "blvd", "capt", "co", "col", "corp", "dr", "e.g", "est", "etc", "gen", "i.e",
    "inc", "jr", "lt", "ltd", "maj", "mr", "mrs", "ms", "mt", "no", "p.m", "prof", "rd", "rev",
    "sgt", "sr", "st", "vol", "vs",
];

/// Whether `text` ends in sentence-terminating punctuation
///
/// A final period after a known abbreviation ("Dr.") does not count.
#[must_use]
pub fn ends_sentence(text: &str) -> bool {
    let trimmed = text.trim_end();
    let Some(last) = trimmed.chars().last() else {
        return false;
    };

    if !matches!(last, '.' | '!' | '?') {
        return false;
    }

    if last == '.' {
        let tokens = tokenize_lossless(trimmed);
        let idx = tokens.len() - 1;
        if idx > 1 {
            let preceding = tokens[idx - 1].to_lowercase();
            if COMMON_ABBREVIATIONS.contains(&preceding.as_str()) {
                return false;
            }
        }
    }

    true
}
