use miette::Diagnostic;
use std::io;
use thiserror::Error;

/// Primary error type for the word lookup service
#[derive(Error, Debug, Diagnostic)]
pub enum LookupError {
    #[error("Environment configuration error: {0}")]
    #[diagnostic(code(wordlookup::config_error))]
    Config(String),

    #[error("Dictionary error: {0}")]
    #[diagnostic(code(wordlookup::dictionary_error))]
    Dictionary(#[from] LoadError),

    #[error("Actor system error: {0}")]
    #[diagnostic(code(wordlookup::actor_error))]
    Actor(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(wordlookup::io_error))]
    Io(#[from] io::Error),
}

/// Dictionary loading errors.
///
/// Cloneable because a single failed fetch is reported to every caller that
/// was waiting on it.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Failed to read dictionary resource {location}: {reason}")]
    #[diagnostic(code(wordlookup::dictionary::unreachable))]
    Unreachable { location: String, reason: String },

    #[error("Dictionary resource {location} is malformed: {reason}")]
    #[diagnostic(
        code(wordlookup::dictionary::malformed),
        help("expected a JSON object of word to definition, a JSON array of words, or a word-per-line text file")
    )]
    Malformed { location: String, reason: String },

    #[error("Dictionary resource {location} contains no words")]
    #[diagnostic(code(wordlookup::dictionary::empty))]
    Empty { location: String },

    #[error("Timed out after {secs}s fetching dictionary '{selector}'")]
    #[diagnostic(code(wordlookup::dictionary::timeout))]
    Timeout { selector: String, secs: u64 },

    #[error("Dictionary load was superseded by a selector change or reload")]
    #[diagnostic(code(wordlookup::dictionary::superseded))]
    Superseded,

    #[error("Dictionary store is unavailable: {0}")]
    #[diagnostic(code(wordlookup::dictionary::store_unavailable))]
    StoreUnavailable(String),
}

// Re-export error types for convenience
pub use LookupError as Error;

/// Create a result type that uses our error type
pub type Result<T> = std::result::Result<T, Error>;
