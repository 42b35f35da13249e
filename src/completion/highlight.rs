//! Marking corrected words in corrector candidates

/// One word of a candidate and whether it differs from the original
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedWord {
    pub text: String,
    pub changed: bool,
}

/// Split `candidate` on spaces and flag words absent from `context`
///
/// Comparison is case-insensitive and word-based, so reordered words are
/// not flagged.
#[must_use]
pub fn highlight(candidate: &str, context: &str) -> Vec<HighlightedWord> {
    let original = context.to_lowercase();
    let original_words: Vec<&str> = original.split(' ').filter(|w| !w.is_empty()).collect();

    candidate
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| HighlightedWord {
            text: w.to_string(),
            changed: !original_words.contains(&w.to_lowercase().as_str()),
        })
        .collect()
}

/// Candidate words with nothing flagged, used for local completions
#[must_use]
pub fn unhighlighted(candidate: &str) -> Vec<HighlightedWord> {
    candidate
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| HighlightedWord {
            text: w.to_string(),
            changed: false,
        })
        .collect()
}
