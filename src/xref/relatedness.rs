//! Word-overlap venue relatedness.
//!
//! `reference` is split into whitespace-separated words; `candidate` is opaque
//! text. Each word that occurs anywhere in `candidate` (case-sensitive
//! substring, not a token match) counts once. The pair is related when at
//! least half of the words, rounded down, occur.
//!
//! The test is directional: `related(a, b)` and `related(b, a)` can differ.
//! A one-word reference has a threshold of zero and is related to anything.

use crate::{Error, Result};

/// Number of words from `reference` occurring as substrings of `candidate`,
/// and the total word count.
pub fn word_overlap(reference: &str, candidate: &str) -> (usize, usize) {
    let mut total = 0;
    let mut hits = 0;
    for word in reference.split_whitespace() {
        total += 1;
        if candidate.contains(word) {
            hits += 1;
        }
    }
    (hits, total)
}

/// Whether `candidate` names the same venue as `reference`.
///
/// Fails with `Error::Precondition` when `reference` has no words.
pub fn related(reference: &str, candidate: &str) -> Result<bool> {
    let (hits, total) = word_overlap(reference, candidate);
    if total == 0 {
        return Err(Error::Precondition(format!(
            "reference text {reference:?} has no words"
        )));
    }
    Ok(hits >= total / 2)
}
