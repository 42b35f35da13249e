//! The phrase corpus offered as completion candidates

use std::collections::BTreeSet;

/// Known phrases: the user's phrase list merged with soundbite names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    phrases: Vec<String>,
}

impl Corpus {
    /// Merge phrase and soundbite lists, deduplicated and sorted ascending
    #[must_use]
    pub fn build(phrases: &[String], soundbites: &[String]) -> Self {
        let merged: BTreeSet<&String> = phrases.iter().chain(soundbites).collect();
        Self {
            phrases: merged.into_iter().cloned().collect(),
        }
    }

    /// Phrases in stable sorted order
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}
