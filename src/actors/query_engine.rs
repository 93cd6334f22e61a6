use actix::prelude::*;
use tracing::{debug, info, warn};

use crate::actors::dictionary_store::{
    DictionaryStoreActor, Invalidate, LoadDictionary, LoadResult, SetSelector,
};
use crate::error::LoadError;
use crate::lookup::{canonical_form, is_playable, rank_suggestions, validate_word, WordResult};

/// Message sent on every keystroke with the current input text
#[derive(Message)]
#[rtype(result = "Vec<String>")]
pub struct PrefixChanged {
    pub text: String,
}

/// Message sent when the user submits or selects a word
#[derive(Message)]
#[rtype(result = "Result<Option<WordResult>, LoadError>")]
pub struct WordCommitted {
    pub word: String,
}

/// Message to switch the active dataset
#[derive(Message)]
#[rtype(result = "()")]
pub struct DatasetSelectorChanged {
    pub name: String,
}

/// Message to force the dataset to be fetched again on next use
#[derive(Message)]
#[rtype(result = "()")]
pub struct ReloadDictionary;

/// Actor that answers suggestion and validation queries against the store
pub struct QueryEngineActor {
    store: Addr<DictionaryStoreActor>,
    suggestion_limit: usize,
}

impl QueryEngineActor {
    pub fn new(store: Addr<DictionaryStoreActor>, suggestion_limit: usize) -> Self {
        Self {
            store,
            suggestion_limit,
        }
    }
}

async fn load(store: Addr<DictionaryStoreActor>) -> LoadResult {
    store
        .send(LoadDictionary)
        .await
        .map_err(|e| LoadError::StoreUnavailable(e.to_string()))?
}

impl Actor for QueryEngineActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        info!(
            "QueryEngineActor started (suggestion limit {})",
            self.suggestion_limit
        );
    }
}

impl Handler<PrefixChanged> for QueryEngineActor {
    type Result = ResponseFuture<Vec<String>>;

    fn handle(&mut self, msg: PrefixChanged, _ctx: &mut Context<Self>) -> Self::Result {
        let store = self.store.clone();
        let limit = self.suggestion_limit;

        Box::pin(async move {
            if canonical_form(&msg.text).is_empty() {
                return Vec::new();
            }

            match load(store).await {
                Ok(dataset) => {
                    let suggestions = rank_suggestions(&dataset, &msg.text, limit);
                    debug!(
                        "{} suggestions for prefix '{}'",
                        suggestions.len(),
                        msg.text
                    );
                    suggestions
                }
                Err(e) => {
                    warn!("Suggestions unavailable for '{}': {}", msg.text, e);
                    Vec::new()
                }
            }
        })
    }
}

impl Handler<WordCommitted> for QueryEngineActor {
    type Result = ResponseFuture<Result<Option<WordResult>, LoadError>>;

    fn handle(&mut self, msg: WordCommitted, _ctx: &mut Context<Self>) -> Self::Result {
        let store = self.store.clone();

        Box::pin(async move {
            // Unplayable input never needs the dictionary
            if !is_playable(&canonical_form(&msg.word)) {
                debug!("Skipping unplayable word '{}'", msg.word);
                return Ok(None);
            }

            let dataset = load(store).await?;
            let result = validate_word(&dataset, &msg.word);
            info!(
                "Word '{}' valid: {}",
                msg.word.trim(),
                result.is_some()
            );
            Ok::<_, LoadError>(result)
        })
    }
}

impl Handler<DatasetSelectorChanged> for QueryEngineActor {
    type Result = ();

    fn handle(&mut self, msg: DatasetSelectorChanged, _ctx: &mut Context<Self>) -> Self::Result {
        self.store.do_send(SetSelector { name: msg.name });
    }
}

impl Handler<ReloadDictionary> for QueryEngineActor {
    type Result = ();

    fn handle(&mut self, _msg: ReloadDictionary, _ctx: &mut Context<Self>) -> Self::Result {
        self.store.do_send(Invalidate);
    }
}
