use crate::dictionary::DictionaryDataset;
use crate::lookup::validate::{canonical_form, is_playable};

/// Default cap on the number of suggestions returned for a prefix.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 21;

/// Rank dictionary words starting with `prefix`.
///
/// Playable matches are ordered by length, then lexicographically. The regular
/// `+s` plural of the prefix is then moved to sit right after the prefix itself
/// (or to the front if the prefix is not a word), and the list is cut to `limit`.
pub fn rank_suggestions(dataset: &DictionaryDataset, prefix: &str, limit: usize) -> Vec<String> {
    let prefix = canonical_form(prefix);
    if prefix.is_empty() {
        return Vec::new();
    }

    let mut words: Vec<&str> = dataset
        .words_with_prefix(&prefix)
        .filter(|word| is_playable(word))
        .collect();

    words.sort_by(|a, b| {
        a.chars()
            .count()
            .cmp(&b.chars().count())
            .then_with(|| a.cmp(b))
    });

    promote_plural(&mut words, &prefix);
    words.truncate(limit);

    words.into_iter().map(str::to_string).collect()
}

fn promote_plural(words: &mut Vec<&str>, base: &str) {
    let plural = format!("{base}s");
    let Some(from) = words.iter().position(|word| *word == plural) else {
        return;
    };

    let word = words.remove(from);
    let to = words
        .iter()
        .position(|word| *word == base)
        .map_or(0, |base_at| base_at + 1);
    words.insert(to, word);
}
