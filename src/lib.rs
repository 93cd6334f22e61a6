pub mod actors;
pub mod config;
pub mod console;
pub mod dictionary;
pub mod error;
pub mod lookup;

// Re-export error types for convenience
pub use error::{Error, LoadError, LookupError, Result};
