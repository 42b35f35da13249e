//! Text buffer with a character-indexed selection

use std::ops::Range;

/// Text plus a selection, both as the caller's editor holds them
///
/// Selection offsets count `char`s, not bytes. An empty selection is a
/// caret.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextBuffer {
    pub text: String,
    pub selection: Range<usize>,
}

impl TextBuffer {
    #[must_use]
    pub fn new(text: impl Into<String>, selection: Range<usize>) -> Self {
        Self {
            text: text.into(),
            selection,
        }
    }

    /// Buffer with the caret after the last character
    #[must_use]
    pub fn with_caret_at_end(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            text,
            selection: len..len,
        }
    }

    /// Length in characters
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Selection clamped to the buffer and ordered
    #[must_use]
    pub fn clamped_selection(&self) -> Range<usize> {
        let len = self.char_len();
        let start = self.selection.start.min(len);
        let end = self.selection.end.clamp(start, len);
        start..end
    }
}

/// Byte offset of the `idx`-th character (or the end of `text`)
fn byte_offset(text: &str, idx: usize) -> usize {
    text.char_indices().nth(idx).map_or(text.len(), |(b, _)| b)
}

/// Characters `range` of `text`
#[must_use]
pub fn char_slice(text: &str, range: &Range<usize>) -> String {
    let start = byte_offset(text, range.start);
    let end = byte_offset(text, range.end).max(start);
    text[start..end].to_string()
}

/// `text` with the characters in `range` replaced by `with`
#[must_use]
pub fn replace_chars(text: &str, range: &Range<usize>, with: &str) -> String {
    let start = byte_offset(text, range.start);
    let end = byte_offset(text, range.end).max(start);
    let mut out = String::with_capacity(text.len() - (end - start) + with.len());
    out.push_str(&text[..start]);
    out.push_str(with);
    out.push_str(&text[end..]);
    out
}
