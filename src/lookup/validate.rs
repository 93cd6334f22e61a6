use serde::{Deserialize, Serialize};

use crate::dictionary::DictionaryDataset;

/// Words shorter than this are never playable.
pub const MIN_WORD_LENGTH: usize = 3;

/// A committed word that was found in the dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordResult {
    pub word: String,
    pub definition: String,
    pub score: usize,
}

/// Lookup key form of a word: trimmed and lowercased.
pub fn canonical_form(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Whether a canonical word can be played at all, regardless of dictionary membership.
pub fn is_playable(word: &str) -> bool {
    word.chars().count() >= MIN_WORD_LENGTH && !word.contains(' ')
}

/// One point per letter beyond the second, never negative.
pub fn score(word: &str) -> usize {
    word.trim().chars().count().saturating_sub(2)
}

/// Validate a committed word against `dataset`.
///
/// Returns `None` when the word fails the length/space gate or is not in the dictionary.
pub fn validate_word(dataset: &DictionaryDataset, word: &str) -> Option<WordResult> {
    let word = canonical_form(word);
    if !is_playable(&word) {
        return None;
    }

    let definition = dataset.definition(&word)?;
    Some(WordResult {
        score: score(&word),
        definition: definition.to_string(),
        word,
    })
}
