//! Soundbite lookup
//!
//! Soundbites are pre-recorded clips named after the phrase they speak
//! (`Thank you.m4a`). Spoken text is normalized the same way as the file
//! stems and looked up to decide whether a clip can be played instead of
//! synthesized speech.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Audio file extensions recognized as soundbites
pub const AUDIO_EXTENSIONS: [&str; 2] = ["m4a", "wav"];

/// Normalized phrase → clip path, rebuilt from a directory listing
#[derive(Debug, Clone, Default)]
pub struct SoundbiteIndex {
    entries: HashMap<String, PathBuf>,
    names: Vec<String>,
}

impl SoundbiteIndex {
    /// Build an index from the entry names of `dir`
    ///
    /// Non-audio entries are skipped. When two files normalize to the same
    /// key the later one in `listing` wins; listing order is whatever the
    /// caller supplies, so the winner is not otherwise defined.
    #[must_use]
    pub fn rebuild(dir: &Path, listing: &[String]) -> Self {
        let mut entries = HashMap::new();
        let mut names = Vec::new();

        for file_name in listing {
            let path = Path::new(file_name);
            let is_audio = path.extension().is_some_and(|ext| {
                AUDIO_EXTENSIONS
                    .iter()
                    .any(|a| ext.to_string_lossy().eq_ignore_ascii_case(a))
            });
            if !is_audio {
                continue;
            }
            let Some(stem) = path.file_stem() else {
                continue;
            };

            let name = stem.to_string_lossy().to_string();
            if let Some(previous) = entries.insert(normalize_bite(&name), dir.join(file_name)) {
                tracing::debug!(
                    replaced = %previous.display(),
                    name,
                    "soundbite name collision"
                );
            }
            names.push(name);
        }

        names.sort();
        tracing::debug!(count = entries.len(), dir = %dir.display(), "soundbite index rebuilt");

        Self { entries, names }
    }

    /// Clip for `text`, if one matches after normalization
    #[must_use]
    pub fn lookup(&self, text: &str) -> Option<&Path> {
        self.entries.get(&normalize_bite(text)).map(PathBuf::as_path)
    }

    /// Raw soundbite names (file stems), sorted
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalize a soundbite name or spoken phrase for lookup
///
/// Curly apostrophes become straight ones, text is lowercased and
/// surrounding whitespace and periods are trimmed. `!` and `?` are kept
/// since they usually change how a clip sounds.
#[must_use]
pub fn normalize_bite(text: &str) -> String {
    text.replace('\u{2019}', "'")
        .to_lowercase()
        .trim_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string()
}
