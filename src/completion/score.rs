//! Phrase ranking against a partial query
//!
//! Linear in corpus size; corpora are a few hundred phrases at most.

use std::cmp::Ordering;

use crate::text::tokenize_words;

/// Score for a query word found verbatim in the phrase
const EXACT_MATCH: f64 = 1.0;

/// Score for a query word that prefixes a phrase word
const PREFIX_MATCH: f64 = 0.5;

/// Bonus when the matched phrase word sits at the query word's position
const POSITION_BONUS: f64 = 1.0;

/// A corpus phrase with its score against a query
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Phrase text as it appears in the corpus
    pub text: String,
    /// Non-negative match score
    pub score: f64,
}

/// Score a single phrase against pre-tokenized query words
#[must_use]
pub fn score_phrase(query_words: &[String], phrase: &str) -> f64 {
    let words = tokenize_words(phrase);
    let mut score = 0.0;

    for (j, q) in query_words.iter().enumerate() {
        let matched = if let Some(i) = words.iter().position(|w| w == q) {
            score += EXACT_MATCH;
            Some(i)
        } else if let Some(i) = words.iter().position(|w| w.starts_with(q.as_str())) {
            score += PREFIX_MATCH;
            Some(i)
        } else {
            None
        };

        if matched == Some(j) {
            score += POSITION_BONUS;
        }
    }

    score
}

/// Rank `corpus` against `query`, keeping only positive scores
///
/// Ordered by score descending, ties broken by ascending phrase text.
#[must_use]
pub fn score_candidates(corpus: &[String], query: &str) -> Vec<Candidate> {
    let query_words = tokenize_words(query);

    let mut scored: Vec<Candidate> = corpus
        .iter()
        .filter_map(|phrase| {
            let score = score_phrase(&query_words, phrase);
            (score > 0.0).then(|| Candidate {
                text: phrase.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.text.cmp(&b.text))
    });

    scored
}

/// Rank `corpus` against `query`, returning phrase text best first
#[must_use]
pub fn score(corpus: &[String], query: &str) -> Vec<String> {
    score_candidates(corpus, query)
        .into_iter()
        .map(|c| c.text)
        .collect()
}
