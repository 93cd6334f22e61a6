use actix::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::dictionary::{DictionaryDataset, DictionarySelector, DictionarySource};
use crate::error::LoadError;

pub type LoadResult = Result<Arc<DictionaryDataset>, LoadError>;

/// Message to get the active dataset, loading it if necessary
#[derive(Message)]
#[rtype(result = "LoadResult")]
pub struct LoadDictionary;

/// Message to switch the active dataset
#[derive(Message)]
#[rtype(result = "()")]
pub struct SetSelector {
    pub name: String,
}

/// Message to drop the cached dataset and any pending load
#[derive(Message)]
#[rtype(result = "()")]
pub struct Invalidate;

/// Message to inspect the store
#[derive(Message)]
#[rtype(result = "StoreStatus")]
pub struct GetStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Empty,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub selector: DictionarySelector,
    pub state: StoreState,
    /// Number of stored words when ready
    pub words: usize,
    /// Error from the most recent failed load, cleared by a successful one
    pub last_error: Option<LoadError>,
}

enum Slot {
    Empty,
    /// Callers waiting on the single in-flight fetch
    Loading(Vec<oneshot::Sender<LoadResult>>),
    Ready(Arc<DictionaryDataset>),
}

/// Actor that owns the active dataset and loads it at most once per selector
pub struct DictionaryStoreActor {
    source: Arc<dyn DictionarySource>,
    selector: DictionarySelector,
    fetch_timeout: Duration,
    /// Bumped on every invalidation; a fetch started under an older value is stale
    generation: u64,
    /// The running fetch, cancelled on invalidation
    fetch_handle: Option<SpawnHandle>,
    slot: Slot,
    last_error: Option<LoadError>,
}

impl DictionaryStoreActor {
    pub fn new(
        source: Arc<dyn DictionarySource>,
        selector: DictionarySelector,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            selector,
            fetch_timeout,
            generation: 0,
            fetch_handle: None,
            slot: Slot::Empty,
            last_error: None,
        }
    }

    fn invalidate(&mut self, ctx: &mut Context<Self>) {
        self.generation += 1;
        if let Some(handle) = self.fetch_handle.take() {
            ctx.cancel_future(handle);
            debug!("Cancelled in-flight load of '{}'", self.selector);
        }
        // Dropping pending senders resolves their waiters as superseded
        self.slot = Slot::Empty;
        debug!(
            "Dictionary cache invalidated (generation {})",
            self.generation
        );
    }

    fn start_fetch(&mut self, ctx: &mut Context<Self>) {
        let generation = self.generation;
        let selector = self.selector.clone();
        let source = Arc::clone(&self.source);
        let fetch_timeout = self.fetch_timeout;

        info!("Loading dictionary '{}'", selector);

        let fetch = async move {
            let resource = tokio::time::timeout(fetch_timeout, source.fetch(&selector))
                .await
                .map_err(|_| LoadError::Timeout {
                    selector: selector.to_string(),
                    secs: fetch_timeout.as_secs(),
                })??;
            DictionaryDataset::parse(&resource)
        };

        let handle = ctx.spawn(
            fetch
                .into_actor(self)
                .map(move |result, act, _ctx| act.finish_fetch(generation, result)),
        );
        self.fetch_handle = Some(handle);
    }

    fn finish_fetch(&mut self, generation: u64, result: Result<DictionaryDataset, LoadError>) {
        if generation != self.generation {
            debug!(
                "Discarding stale dictionary load (generation {}, current {})",
                generation, self.generation
            );
            return;
        }
        self.fetch_handle = None;

        let waiters = match std::mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Loading(waiters) => waiters,
            other => {
                self.slot = other;
                return;
            }
        };

        match result {
            Ok(dataset) => {
                let dataset = Arc::new(dataset);
                info!(
                    "Dictionary '{}' ready with {} words",
                    self.selector,
                    dataset.len()
                );
                self.slot = Slot::Ready(Arc::clone(&dataset));
                self.last_error = None;
                for waiter in waiters {
                    let _ = waiter.send(Ok(Arc::clone(&dataset)));
                }
            }
            Err(e) => {
                warn!("Failed to load dictionary '{}': {}", self.selector, e);
                self.last_error = Some(e.clone());
                for waiter in waiters {
                    let _ = waiter.send(Err(e.clone()));
                }
            }
        }
    }
}

impl Actor for DictionaryStoreActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        info!("DictionaryStoreActor started with selector '{}'", self.selector);
    }
}

impl Handler<LoadDictionary> for DictionaryStoreActor {
    type Result = ResponseFuture<LoadResult>;

    fn handle(&mut self, _msg: LoadDictionary, ctx: &mut Context<Self>) -> Self::Result {
        if let Slot::Ready(dataset) = &self.slot {
            let dataset = Arc::clone(dataset);
            return Box::pin(async move { Ok(dataset) });
        }

        let (tx, rx) = oneshot::channel();
        match &mut self.slot {
            Slot::Loading(waiters) => {
                debug!("Joining in-flight load of '{}'", self.selector);
                waiters.push(tx);
            }
            _ => {
                self.slot = Slot::Loading(vec![tx]);
                self.start_fetch(ctx);
            }
        }

        Box::pin(async move { rx.await.unwrap_or(Err(LoadError::Superseded)) })
    }
}

impl Handler<SetSelector> for DictionaryStoreActor {
    type Result = ();

    fn handle(&mut self, msg: SetSelector, ctx: &mut Context<Self>) -> Self::Result {
        let selector = DictionarySelector::new(msg.name);
        if selector == self.selector {
            debug!("Selector '{}' already active", selector);
            return;
        }

        info!("Switching dictionary from '{}' to '{}'", self.selector, selector);
        self.selector = selector;
        self.last_error = None;
        self.invalidate(ctx);
    }
}

impl Handler<Invalidate> for DictionaryStoreActor {
    type Result = ();

    fn handle(&mut self, _msg: Invalidate, ctx: &mut Context<Self>) -> Self::Result {
        info!("Reloading dictionary '{}' on next use", self.selector);
        self.invalidate(ctx);
    }
}

impl Handler<GetStatus> for DictionaryStoreActor {
    type Result = MessageResult<GetStatus>;

    fn handle(&mut self, _msg: GetStatus, _ctx: &mut Context<Self>) -> Self::Result {
        let (state, words) = match &self.slot {
            Slot::Empty => (StoreState::Empty, 0),
            Slot::Loading(_) => (StoreState::Loading, 0),
            Slot::Ready(dataset) => (StoreState::Ready, dataset.len()),
        };

        MessageResult(StoreStatus {
            selector: self.selector.clone(),
            state,
            words,
            last_error: self.last_error.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::dictionary::{MemorySource, Resource};

    /// Source that counts fetches per selector and answers after a delay
    pub(crate) struct CountingSource {
        inner: MemorySource,
        delay: Duration,
        fetches: std::sync::Mutex<HashMap<String, usize>>,
        total: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    /// Marks one fetch as running until dropped, including when it is cancelled
    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl CountingSource {
        pub(crate) fn new(inner: MemorySource, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                inner,
                delay,
                fetches: std::sync::Mutex::new(HashMap::new()),
                total: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }

        pub(crate) fn total(&self) -> usize {
            self.total.load(Ordering::SeqCst)
        }

        /// Highest number of fetches that were running at the same time
        pub(crate) fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }

        pub(crate) fn fetches_of(&self, name: &str) -> usize {
            self.fetches.lock().unwrap().get(name).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl DictionarySource for CountingSource {
        async fn fetch(&self, selector: &DictionarySelector) -> Result<Resource, LoadError> {
            self.total.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);
            *self
                .fetches
                .lock()
                .unwrap()
                .entry(selector.name().to_string())
                .or_default() += 1;
            tokio::time::sleep(self.delay).await;
            self.inner.fetch(selector).await
        }
    }

    fn two_datasets() -> MemorySource {
        MemorySource::new()
            .with_json("animals", r#"{"cat": "a feline", "dog": "an animal"}"#)
            .with_word_list("plants", "tree\nfern\n")
            .with_json("broken", "{not json")
    }

    fn start_store(source: Arc<CountingSource>, name: &str) -> Addr<DictionaryStoreActor> {
        DictionaryStoreActor::new(
            source,
            DictionarySelector::new(name),
            Duration::from_secs(5),
        )
        .start()
    }

    #[actix_rt::test]
    async fn test_load_is_cached() {
        let source = CountingSource::new(two_datasets(), Duration::from_millis(10));
        let store = start_store(source.clone(), "animals");

        let first = store.send(LoadDictionary).await.unwrap().unwrap();
        let second = store.send(LoadDictionary).await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.definition("cat"), Some("a feline"));
        assert_eq!(source.total(), 1);

        let status = store.send(GetStatus).await.unwrap();
        assert_eq!(status.state, StoreState::Ready);
        assert_eq!(status.words, 2);
        assert_eq!(status.last_error, None);
    }

    #[actix_rt::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let source = CountingSource::new(two_datasets(), Duration::from_millis(50));
        let store = start_store(source.clone(), "animals");

        let (a, b, c) = tokio::join!(
            store.send(LoadDictionary),
            store.send(LoadDictionary),
            store.send(LoadDictionary)
        );

        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();
        let c = c.unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(source.total(), 1);
    }

    #[actix_rt::test]
    async fn test_status_reports_loading() {
        let source = CountingSource::new(two_datasets(), Duration::from_millis(50));
        let store = start_store(source.clone(), "animals");

        let pending = store.send(LoadDictionary);
        let status = store.send(GetStatus).await.unwrap();
        assert_eq!(status.state, StoreState::Loading);

        pending.await.unwrap().unwrap();
        assert_eq!(store.send(GetStatus).await.unwrap().state, StoreState::Ready);
    }

    #[actix_rt::test]
    async fn test_failed_load_is_shared_and_retryable() {
        let source = CountingSource::new(two_datasets(), Duration::from_millis(20));
        let store = start_store(source.clone(), "broken");

        let (a, b) = tokio::join!(store.send(LoadDictionary), store.send(LoadDictionary));
        let a = a.unwrap();
        let b = b.unwrap();
        assert!(matches!(a, Err(LoadError::Malformed { .. })));
        assert_eq!(a, b);
        assert_eq!(source.total(), 1);

        let status = store.send(GetStatus).await.unwrap();
        assert_eq!(status.state, StoreState::Empty);
        assert!(matches!(status.last_error, Some(LoadError::Malformed { .. })));

        // Store is back to empty, so the next load fetches again
        assert!(store.send(LoadDictionary).await.unwrap().is_err());
        assert_eq!(source.total(), 2);
    }

    #[actix_rt::test]
    async fn test_unknown_dataset_is_unreachable() {
        let source = CountingSource::new(two_datasets(), Duration::ZERO);
        let store = start_store(source, "minerals");

        let result = store.send(LoadDictionary).await.unwrap();
        assert!(matches!(result, Err(LoadError::Unreachable { .. })));
    }

    #[actix_rt::test]
    async fn test_fetch_timeout() {
        let source = CountingSource::new(two_datasets(), Duration::from_millis(500));
        let store = DictionaryStoreActor::new(
            source,
            DictionarySelector::new("animals"),
            Duration::from_millis(20),
        )
        .start();

        let result = store.send(LoadDictionary).await.unwrap();
        match result {
            Err(LoadError::Timeout { selector, .. }) => assert_eq!(selector, "animals"),
            other => panic!("Expected Timeout error, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_selector_change_never_returns_previous_dataset() {
        let source = CountingSource::new(two_datasets(), Duration::from_millis(10));
        let store = start_store(source.clone(), "animals");

        let animals = store.send(LoadDictionary).await.unwrap().unwrap();
        assert!(animals.contains("cat"));

        store.do_send(SetSelector {
            name: "plants".to_string(),
        });
        let plants = store.send(LoadDictionary).await.unwrap().unwrap();
        assert!(plants.contains("tree"));
        assert!(!plants.contains("cat"));
        assert_eq!(source.total(), 2);
    }

    #[actix_rt::test]
    async fn test_same_selector_is_noop() {
        let source = CountingSource::new(two_datasets(), Duration::ZERO);
        let store = start_store(source.clone(), "animals");

        store.send(LoadDictionary).await.unwrap().unwrap();
        store
            .send(SetSelector {
                name: " animals ".to_string(),
            })
            .await
            .unwrap();
        store.send(LoadDictionary).await.unwrap().unwrap();

        assert_eq!(source.total(), 1);
    }

    #[actix_rt::test]
    async fn test_stale_load_does_not_populate_cache() {
        let source = CountingSource::new(two_datasets(), Duration::from_millis(50));
        let store = start_store(source.clone(), "animals");

        let stale = store.send(LoadDictionary);
        store.do_send(SetSelector {
            name: "plants".to_string(),
        });

        assert_eq!(stale.await.unwrap(), Err(LoadError::Superseded));

        let plants = store.send(LoadDictionary).await.unwrap().unwrap();
        assert!(plants.contains("fern"));

        // The animals fetch was cancelled and must not replace the plants dataset
        tokio::time::sleep(Duration::from_millis(100)).await;
        let again = store.send(LoadDictionary).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&plants, &again));
        assert!(source.fetches_of("animals") <= 1);
        assert_eq!(source.fetches_of("plants"), 1);
        assert_eq!(source.peak(), 1);
    }

    #[actix_rt::test]
    async fn test_invalidate_during_load_cancels_fetch() {
        let source = CountingSource::new(two_datasets(), Duration::from_millis(100));
        let store = start_store(source.clone(), "animals");

        let first = store.send(LoadDictionary);
        store.do_send(Invalidate);
        let second = store.send(LoadDictionary);

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap(), Err(LoadError::Superseded));
        assert!(second.unwrap().unwrap().contains("cat"));
        assert_eq!(source.peak(), 1);

        // Cancel a fetch that is already running, not just one still queued
        store.do_send(Invalidate);
        let reload = store.send(LoadDictionary);
        tokio::time::sleep(Duration::from_millis(30)).await;
        store.do_send(Invalidate);
        let last = store.send(LoadDictionary);

        assert_eq!(reload.await.unwrap(), Err(LoadError::Superseded));
        assert!(last.await.unwrap().unwrap().contains("dog"));
        assert_eq!(source.peak(), 1);
    }

    #[actix_rt::test]
    async fn test_invalidate_forces_refetch() {
        let source = CountingSource::new(two_datasets(), Duration::ZERO);
        let store = start_store(source.clone(), "plants");

        store.send(LoadDictionary).await.unwrap().unwrap();
        store.send(Invalidate).await.unwrap();
        assert_eq!(store.send(GetStatus).await.unwrap().state, StoreState::Empty);

        store.send(LoadDictionary).await.unwrap().unwrap();
        assert_eq!(source.fetches_of("plants"), 2);
    }
}
