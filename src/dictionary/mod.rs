pub mod dataset;
pub mod source;

// Re-export common types
pub use dataset::{DictionaryDataset, PLACEHOLDER_DEFINITION};
pub use source::{
    DictionarySelector, DictionarySource, FileSource, MemorySource, Resource, ResourceFormat,
};
