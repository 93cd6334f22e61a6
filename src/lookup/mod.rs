pub mod suggest;
pub mod validate;

// Re-export common types
pub use suggest::{rank_suggestions, DEFAULT_SUGGESTION_LIMIT};
pub use validate::{canonical_form, is_playable, score, validate_word, WordResult, MIN_WORD_LENGTH};
