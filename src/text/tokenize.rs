//! Lossless and lossy tokenizers

/// Characters emitted as standalone tokens by [`tokenize_lossless`]
pub const DELIMITERS: [char; 6] = [' ', '.', ',', '!', '?', '-'];

/// Characters removed outright by [`tokenize_words`]
const STRIPPED: [char; 6] = ['\'', '\u{2019}', ',', '.', '!', '?'];

/// Split text into words, spaces and punctuation
///
/// Every delimiter flushes the pending run of non-delimiter characters,
/// even when that run is empty, and is then emitted as its own token. A
/// trailing run is only flushed if non-empty. Joining the result
/// reproduces the input exactly.
#[must_use]
pub fn tokenize_lossless(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut run = String::new();

    for c in text.chars() {
        if DELIMITERS.contains(&c) {
            tokens.push(std::mem::take(&mut run));
            tokens.push(c.to_string());
        } else {
            run.push(c);
        }
    }

    if !run.is_empty() {
        tokens.push(run);
    }

    tokens
}

/// Split text into normalized words for matching
///
/// Strips apostrophes (straight and curly) and `, . ! ?`, treats `-` as a
/// word separator, drops empty words and lowercases the rest. Not
/// invertible.
#[must_use]
pub fn tokenize_words(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .map(|c| if c == '-' { ' ' } else { c })
        .collect();

    cleaned
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(normalize_token)
        .collect()
}

/// Normalize a single token for comparison
#[must_use]
pub fn normalize_token(token: &str) -> String {
    token.to_lowercase()
}
