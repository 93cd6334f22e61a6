use serde::Deserialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::{debug, info};

use crate::dictionary::source::{Resource, ResourceFormat};
use crate::error::LoadError;
use crate::lookup::canonical_form;

/// Definition attached to words that come from a plain word list.
pub const PLACEHOLDER_DEFINITION: &str = "Definition not found";

/// The two JSON shapes a dictionary resource may take.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDataset {
    Definitions(BTreeMap<String, String>),
    Words(Vec<String>),
}

/// In-memory mapping of canonical word to definition.
///
/// Keys are kept in an ordered map so prefix queries are a range scan.
/// Short and multi-word keys are stored as-is; the lookup layer filters them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryDataset {
    entries: BTreeMap<String, String>,
}

impl DictionaryDataset {
    /// Build a dataset from word/definition pairs. Keys are canonicalized.
    ///
    /// When several keys collapse to the same canonical word, a key that was
    /// already canonical (`"cat"` over `"Cat"`) supplies the definition; among
    /// variants the first one seen wins.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        // canonical word -> (definition, came from an exact key)
        let mut map: BTreeMap<String, (String, bool)> = BTreeMap::new();
        for (raw, definition) in entries {
            let raw = raw.as_ref();
            let word = canonical_form(raw);
            if word.is_empty() {
                continue;
            }
            let exact = raw == word;
            match map.entry(word) {
                Entry::Vacant(slot) => {
                    slot.insert((definition.into(), exact));
                }
                Entry::Occupied(mut slot) => {
                    if exact && !slot.get().1 {
                        slot.insert((definition.into(), true));
                    }
                }
            }
        }

        Self {
            entries: map
                .into_iter()
                .map(|(word, (definition, _))| (word, definition))
                .collect(),
        }
    }

    /// Build a membership-only dataset where every word carries the placeholder definition.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_entries(
            words
                .into_iter()
                .map(|word| (word.as_ref().to_string(), PLACEHOLDER_DEFINITION)),
        )
    }

    /// Parse a fetched resource according to its format.
    pub fn parse(resource: &Resource) -> Result<Self, LoadError> {
        let dataset = match resource.format {
            ResourceFormat::Json => Self::from_json(&resource.location, &resource.body)?,
            ResourceFormat::WordList => Self::from_word_list(&resource.body),
        };

        if dataset.is_empty() {
            return Err(LoadError::Empty {
                location: resource.location.clone(),
            });
        }

        info!(
            "Parsed {} words from dictionary resource {}",
            dataset.len(),
            resource.location
        );
        Ok(dataset)
    }

    fn from_json(location: &str, body: &str) -> Result<Self, LoadError> {
        let raw: RawDataset = serde_json::from_str(body).map_err(|e| LoadError::Malformed {
            location: location.to_string(),
            reason: e.to_string(),
        })?;

        Ok(match raw {
            RawDataset::Definitions(map) => Self::from_entries(map),
            RawDataset::Words(words) => {
                debug!("Resource {} is a word list, using placeholder definitions", location);
                Self::from_words(words)
            }
        })
    }

    // One word per line, `#` starts a comment line
    fn from_word_list(body: &str) -> Self {
        Self::from_words(
            body.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn definition(&self, word: &str) -> Option<&str> {
        self.entries.get(word).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All stored keys starting with `prefix`, in byte order.
    pub fn words_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(word, _)| word.as_str())
            .take_while(move |word| word.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(body: &str) -> Resource {
        Resource {
            location: "test.json".to_string(),
            format: ResourceFormat::Json,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_parse_definition_map() {
        let dataset =
            DictionaryDataset::parse(&json(r#"{"Cat ": "a feline", "dog": "an animal"}"#)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.definition("cat"), Some("a feline"));
        assert_eq!(dataset.definition("dog"), Some("an animal"));
        assert_eq!(dataset.definition("Cat "), None);
    }

    #[test]
    fn test_parse_word_array_uses_placeholder() {
        let dataset = DictionaryDataset::parse(&json(r#"["tree", "TREES", "  "]"#)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.definition("trees"), Some(PLACEHOLDER_DEFINITION));
    }

    #[test]
    fn test_parse_word_list() {
        let resource = Resource {
            location: "words.txt".to_string(),
            format: ResourceFormat::WordList,
            body: "# boggle words\nkissa\n\n  Koira  \ntalo\n".to_string(),
        };
        let dataset = DictionaryDataset::parse(&resource).unwrap();

        assert_eq!(dataset.len(), 3);
        assert!(dataset.contains("koira"));
        assert!(!dataset.contains("# boggle words"));
    }

    #[test]
    fn test_parse_errors() {
        let malformed = DictionaryDataset::parse(&json(r#"{"cat": 3}"#));
        assert!(matches!(malformed, Err(LoadError::Malformed { .. })));

        let not_json = DictionaryDataset::parse(&json("cat, dog"));
        assert!(matches!(not_json, Err(LoadError::Malformed { .. })));

        let empty = DictionaryDataset::parse(&json("{}"));
        assert_eq!(
            empty,
            Err(LoadError::Empty {
                location: "test.json".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_keys_prefer_exact_lowercase() {
        let dataset = DictionaryDataset::from_entries([("cat", "first"), ("CAT", "second")]);
        assert_eq!(dataset.definition("cat"), Some("first"));

        let dataset = DictionaryDataset::from_entries([("CAT", "shouted"), ("cat", "plain")]);
        assert_eq!(dataset.definition("cat"), Some("plain"));

        let dataset = DictionaryDataset::from_entries([("Dog", "title"), ("DOG ", "shouted")]);
        assert_eq!(dataset.definition("dog"), Some("title"));
    }

    #[test]
    fn test_json_case_variant_does_not_shadow_exact_key() {
        // "Cat" sorts before "cat" once the object is deserialized
        let dataset = DictionaryDataset::parse(&json(
            r#"{"cat": "a feline", "Cat": "a heavy machinery brand"}"#,
        ))
        .unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.definition("cat"), Some("a feline"));
    }

    #[test]
    fn test_words_with_prefix() {
        let dataset = DictionaryDataset::from_words(["car", "cat", "cats", "dog", "ca"]);

        let words: Vec<&str> = dataset.words_with_prefix("ca").collect();
        assert_eq!(words, vec!["ca", "car", "cat", "cats"]);

        assert_eq!(dataset.words_with_prefix("x").count(), 0);
        assert_eq!(dataset.words_with_prefix("").count(), 5);
    }
}
