pub mod dictionary_store;
pub mod query_engine;

// Re-export actor types for easier import
pub use dictionary_store::DictionaryStoreActor;
pub use query_engine::QueryEngineActor;
