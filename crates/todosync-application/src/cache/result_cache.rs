//! Keyed query cache with request de-duplication and prefix invalidation.

use super::key::QueryKey;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use todosync_core::clock::Clock;
use todosync_core::config::CacheSettings;
use todosync_core::{Result, TodoSyncError};

type CachedValue = Arc<dyn Any + Send + Sync>;
type FetchFuture = BoxFuture<'static, Result<CachedValue>>;
type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;
type SharedFetch = Shared<FetchFuture>;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// Nothing fetched yet.
    Idle,
    /// A fetch is in flight.
    Fetching,
    /// Holds a value younger than its stale time.
    Fresh,
    /// Holds a value that must be revalidated before it is trusted again.
    Stale,
    /// The latest fetch failed.
    Error,
}

/// Per-query fetch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a fetched value is served without revalidation.
    pub stale_time: Duration,
    /// Extra attempts after a retryable failure.
    pub retry: u32,
    /// Delay before the first retry; doubles with each further attempt.
    pub retry_delay: Duration,
}

impl QueryOptions {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            stale_time: settings.stale_time(),
            retry: settings.query_retry,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}

struct InFlight {
    id: u64,
    future: SharedFetch,
    /// Set when the entry was invalidated while this fetch was running.
    superseded: bool,
}

struct CacheEntry {
    generation: u64,
    value: Option<CachedValue>,
    error: Option<TodoSyncError>,
    fetched_at: Option<DateTime<Utc>>,
    stale_time: chrono::Duration,
    invalidated: bool,
    in_flight: Option<InFlight>,
    last_accessed: DateTime<Utc>,
    observers: usize,
    fetcher: Option<Fetcher>,
    version: watch::Sender<u64>,
}

impl CacheEntry {
    fn new(generation: u64, now: DateTime<Utc>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            generation,
            value: None,
            error: None,
            fetched_at: None,
            stale_time: chrono::Duration::zero(),
            invalidated: false,
            in_flight: None,
            last_accessed: now,
            observers: 0,
            fetcher: None,
            version,
        }
    }

    fn configure(&mut self, fetcher: Fetcher, options: &QueryOptions, now: DateTime<Utc>) {
        self.fetcher = Some(fetcher);
        self.stale_time = to_chrono(options.stale_time);
        self.last_accessed = now;
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.fetched_at {
            Some(at) => self.invalidated || now - at >= self.stale_time,
            None => true,
        }
    }

    fn status(&self, now: DateTime<Utc>) -> QueryStatus {
        if self.in_flight.is_some() {
            QueryStatus::Fetching
        } else if self.error.is_some() {
            QueryStatus::Error
        } else if self.value.is_none() {
            QueryStatus::Idle
        } else if self.is_stale(now) {
            QueryStatus::Stale
        } else {
            QueryStatus::Fresh
        }
    }

    fn touch(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

struct CacheInner {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    clock: Arc<dyn Clock>,
    gc_time: chrono::Duration,
    defaults: QueryOptions,
    next_id: AtomicU64,
}

impl CacheInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn sweep(&self, entries: &mut HashMap<QueryKey, CacheEntry>, now: DateTime<Utc>) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.observers > 0
                || entry.in_flight.is_some()
                || now - entry.last_accessed < self.gc_time
        });
        before - entries.len()
    }
}

/// In-memory result cache keyed by [`QueryKey`].
///
/// `ResultCache` is responsible for:
/// - Serving fresh values without calling the fetch function
/// - Serving stale values while revalidating in the background
/// - Collapsing concurrent fetches of one key into a single request
/// - Marking families of keys stale (`invalidate`) and dropping everything (`clear`)
///
/// Cloning is cheap; all clones share the same entries. Values are stored
/// type-erased and handed back as clones of the type the query was made with.
#[derive(Clone)]
pub struct ResultCache {
    inner: Arc<CacheInner>,
}

impl ResultCache {
    pub fn new(settings: &CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                clock,
                gc_time: to_chrono(settings.gc_time()),
                defaults: QueryOptions::from_settings(settings),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Options built from the configured defaults.
    pub fn default_options(&self) -> QueryOptions {
        self.inner.defaults
    }

    /// Returns the value cached under `key`, fetching it when needed.
    ///
    /// - Fresh: returned immediately; `fetch` is not called.
    /// - Stale: the stale value is returned immediately and one background
    ///   revalidation is started unless one is already running.
    /// - Missing or failed: waits for the in-flight fetch, starting one if
    ///   none is running. Every caller waiting on the same fetch sees the
    ///   same value or the same error.
    pub async fn query<T, F, Fut>(&self, key: QueryKey, fetch: F, options: QueryOptions) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let fetcher = erase(fetch, options);

        let pending = {
            let now = self.inner.clock.now();
            let mut entries = self.inner.lock();
            self.inner.sweep(&mut entries, now);

            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(self.inner.next_id(), now));
            entry.configure(fetcher.clone(), &options, now);

            if let Some(value) = entry.value.clone() {
                if entry.is_stale(now) && entry.in_flight.is_none() {
                    tracing::debug!(%key, "[ResultCache] Serving stale value, revalidating");
                    start_fetch(&self.inner, &key, entry, fetcher);
                }
                return downcast(&key, &value);
            }

            let running = entry.in_flight.as_ref().map(|f| f.future.clone());
            match running {
                Some(future) => {
                    tracing::debug!(%key, "[ResultCache] Joining in-flight fetch");
                    future
                }
                None => start_fetch(&self.inner, &key, entry, fetcher),
            }
        };

        let value = pending.await?;
        downcast(&key, &value)
    }

    /// Registers an observer of `key`, the equivalent of a mounted query.
    ///
    /// Starts a fetch when the entry is missing or stale. Observed entries
    /// are revalidated on invalidation and never garbage collected. Dropping
    /// the handle unregisters the observer.
    pub fn subscribe<T, F, Fut>(&self, key: QueryKey, fetch: F, options: QueryOptions) -> QuerySubscription
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let fetcher = erase(fetch, options);
        let now = self.inner.clock.now();
        let mut entries = self.inner.lock();
        self.inner.sweep(&mut entries, now);

        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(self.inner.next_id(), now));
        entry.configure(fetcher.clone(), &options, now);
        entry.observers += 1;

        if entry.in_flight.is_none() && entry.is_stale(now) {
            start_fetch(&self.inner, &key, entry, fetcher);
        }

        QuerySubscription {
            cache: self.clone(),
            generation: entry.generation,
            version: entry.version.subscribe(),
            key,
        }
    }

    /// Marks every entry under `prefix` stale.
    ///
    /// Observed entries are revalidated once. An entry whose fetch is
    /// already running is refetched after that fetch lands, so a value read
    /// before a mutation is never treated as fresh. Returns the number of
    /// matched entries.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.inner.lock();
        let mut matched = 0;

        for (key, entry) in entries.iter_mut() {
            if !key.starts_with(prefix) {
                continue;
            }
            matched += 1;
            entry.invalidated = true;

            if let Some(in_flight) = entry.in_flight.as_mut() {
                in_flight.superseded = true;
                continue;
            }

            match entry.fetcher.clone() {
                Some(fetcher) if entry.observers > 0 => {
                    start_fetch(&self.inner, key, entry, fetcher);
                }
                _ => entry.touch(),
            }
        }

        tracing::debug!(%prefix, matched, "[ResultCache] Invalidated");
        matched
    }

    /// Evicts every entry. Fetches still running complete, but their results
    /// are not stored.
    pub fn clear(&self) {
        let removed = {
            let mut entries = self.inner.lock();
            let removed = entries.len();
            entries.clear();
            removed
        };
        tracing::info!(removed, "[ResultCache] Cleared");
    }

    /// Evicts unobserved entries that have not been read for the GC time.
    pub fn evict_inactive(&self) -> usize {
        let now = self.inner.clock.now();
        let mut entries = self.inner.lock();
        let evicted = self.inner.sweep(&mut entries, now);
        if evicted > 0 {
            tracing::debug!(evicted, "[ResultCache] Evicted inactive entries");
        }
        evicted
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        let now = self.inner.clock.now();
        self.inner
            .lock()
            .get(key)
            .map(|entry| entry.status(now))
            .unwrap_or(QueryStatus::Idle)
    }

    /// Current value under `key` without fetching or touching it.
    pub fn peek<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.inner.lock();
        let value = entries.get(key)?.value.as_ref()?;
        (**value).downcast_ref::<T>().cloned()
    }

    /// Error of the latest failed fetch under `key`, if it failed.
    pub fn error(&self, key: &QueryKey) -> Option<TodoSyncError> {
        self.inner.lock().get(key)?.error.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &QueryKey, generation: u64) {
        let now = self.inner.clock.now();
        let mut entries = self.inner.lock();
        if let Some(entry) = entries.get_mut(key) {
            if entry.generation == generation {
                entry.observers = entry.observers.saturating_sub(1);
                entry.last_accessed = now;
            }
        }
    }
}

/// Observer handle returned by [`ResultCache::subscribe`].
pub struct QuerySubscription {
    cache: ResultCache,
    key: QueryKey,
    generation: u64,
    version: watch::Receiver<u64>,
}

impl QuerySubscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn current<T: Clone + 'static>(&self) -> Option<T> {
        self.cache.peek(&self.key)
    }

    pub fn status(&self) -> QueryStatus {
        self.cache.status(&self.key)
    }

    pub fn error(&self) -> Option<TodoSyncError> {
        self.cache.error(&self.key)
    }

    /// Waits until the entry changes.
    ///
    /// Returns `false` once the entry has been evicted by [`ResultCache::clear`].
    pub async fn changed(&mut self) -> bool {
        self.version.changed().await.is_ok()
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        self.cache.release(&self.key, self.generation);
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(365 * 100))
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: &CachedValue) -> Result<T> {
    (**value).downcast_ref::<T>().cloned().ok_or_else(|| {
        TodoSyncError::internal(format!("Cached value for {key} has an unexpected type"))
    })
}

/// Wraps a typed fetch function into the stored, type-erased form, adding
/// retries for retryable failures.
fn erase<T, F, Fut>(fetch: F, options: QueryOptions) -> Fetcher
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let fetch = Arc::new(fetch);
    Arc::new(move || {
        let fetch = fetch.clone();
        async move {
            let mut attempt = 0;
            loop {
                match fetch().await {
                    Ok(value) => return Ok(Arc::new(value) as CachedValue),
                    Err(e) if attempt < options.retry && e.is_retryable() => {
                        attempt += 1;
                        tracing::debug!(attempt, error = %e, "[ResultCache] Retrying query");
                        tokio::time::sleep(options.backoff(attempt)).await;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        .boxed()
    })
}

/// Starts a fetch for `entry` and records it as the in-flight one.
///
/// The fetch is spawned so it lands even if every caller stops waiting.
fn start_fetch(inner: &Arc<CacheInner>, key: &QueryKey, entry: &mut CacheEntry, fetcher: Fetcher) -> SharedFetch {
    let id = inner.next_id();
    let weak = Arc::downgrade(inner);
    let record_key = key.clone();
    let fetch = fetcher();

    let future: FetchFuture = async move {
        let result = fetch.await;
        complete(&weak, &record_key, id, &result);
        result
    }
    .boxed();
    let shared = future.shared();

    entry.in_flight = Some(InFlight {
        id,
        future: shared.clone(),
        superseded: false,
    });
    entry.touch();

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(shared.clone().map(|_| ()));
        }
        Err(_) => {
            tracing::debug!(%key, "[ResultCache] No runtime, fetch runs only while awaited");
        }
    }

    shared
}

/// Records the outcome of fetch `id`, unless the entry was evicted or a
/// newer fetch replaced it.
fn complete(inner: &Weak<CacheInner>, key: &QueryKey, id: u64, result: &Result<CachedValue>) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let now = inner.clock.now();
    let mut entries = inner.lock();

    let Some(entry) = entries.get_mut(key) else {
        tracing::debug!(%key, "[ResultCache] Entry evicted, discarding fetch result");
        return;
    };
    let superseded = match &entry.in_flight {
        Some(in_flight) if in_flight.id == id => in_flight.superseded,
        _ => {
            tracing::debug!(%key, "[ResultCache] Fetch replaced, discarding result");
            return;
        }
    };
    entry.in_flight = None;

    match result {
        Ok(value) => {
            entry.value = Some(value.clone());
            entry.error = None;
            entry.fetched_at = Some(now);
            entry.invalidated = superseded;
        }
        Err(e) => {
            tracing::debug!(%key, error = %e, "[ResultCache] Fetch failed");
            entry.error = Some(e.clone());
        }
    }

    if superseded && entry.observers > 0 {
        if let Some(fetcher) = entry.fetcher.clone() {
            start_fetch(&inner, key, entry, fetcher);
            return;
        }
    }
    entry.touch();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::todo_keys;
    use std::sync::atomic::AtomicUsize;
    use todosync_core::clock::ManualClock;
    use tokio::sync::Notify;

    fn cache() -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (ResultCache::new(&CacheSettings::default(), clock.clone()), clock)
    }

    fn options() -> QueryOptions {
        QueryOptions::default().with_retry_delay(Duration::ZERO)
    }

    fn key(name: &str) -> QueryKey {
        QueryKey::root().name(name)
    }

    /// Fetch function returning the number of times it has been called.
    fn counting(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> BoxFuture<'static, Result<usize>> + Send + Sync + 'static {
        move || {
            let calls = calls.clone();
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) }.boxed()
        }
    }

    async fn settle(sub: &mut QuerySubscription) {
        while matches!(sub.status(), QueryStatus::Fetching | QueryStatus::Idle) {
            assert!(sub.changed().await);
        }
    }

    #[tokio::test]
    async fn test_fresh_value_skips_fetch() {
        let (cache, _) = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let first: usize = cache.query(key("a"), counting(calls.clone()), options()).await.unwrap();
        let second: usize = cache.query(key("a"), counting(calls.clone()), options()).await.unwrap();

        assert_eq!((first, second), (1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status(&key("a")), QueryStatus::Fresh);
    }

    #[tokio::test]
    async fn test_stale_value_served_while_revalidating() {
        let (cache, clock) = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.query::<usize, _, _>(key("a"), counting(calls.clone()), options()).await.unwrap();

        clock.advance(chrono::Duration::minutes(6));
        let stale: usize = cache.query(key("a"), counting(calls.clone()), options()).await.unwrap();
        assert_eq!(stale, 1);
        assert_eq!(cache.status(&key("a")), QueryStatus::Fetching);

        let mut sub = cache.subscribe::<usize, _, _>(key("a"), counting(calls.clone()), options());
        settle(&mut sub).await;

        assert_eq!(sub.current::<usize>(), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_one_fetch() {
        let (cache, _) = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let fetch = {
            let calls = calls.clone();
            let gate = gate.clone();
            move || {
                let calls = calls.clone();
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TodoSyncError>("value".to_string())
                }
            }
        };

        let (a, b, _) = tokio::join!(
            cache.query(key("a"), fetch.clone(), options()),
            cache.query(key("a"), fetch.clone(), options()),
            async {
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        assert_eq!(a.unwrap(), "value");
        assert_eq!(b.unwrap(), "value");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_not_retried_when_not_retryable() {
        let (cache, _) = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    Err::<usize, _>(TodoSyncError::Forbidden {
                        message: "Access denied".into(),
                    })
                }
            }
        };

        let (a, b) = tokio::join!(
            cache.query(key("a"), fetch.clone(), options()),
            cache.query(key("a"), fetch.clone(), options()),
        );

        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status(&key("a")), QueryStatus::Error);
    }

    #[tokio::test]
    async fn test_retryable_failure_is_retried_once() {
        let (cache, _) = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    match calls.fetch_add(1, Ordering::SeqCst) {
                        0 => Err(TodoSyncError::network("connection reset")),
                        n => Ok(n),
                    }
                }
            }
        };

        let value: usize = cache.query(key("a"), fetch.clone(), options()).await.unwrap();
        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let err = cache
            .query::<usize, _, _>(
                key("b"),
                || async { Err(TodoSyncError::network("down")) },
                options().with_retry(0),
            )
            .await
            .unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_errored_entry_refetches_on_next_query() {
        let (cache, _) = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    match calls.fetch_add(1, Ordering::SeqCst) {
                        0 => Err(TodoSyncError::NotFound {
                            message: "gone".into(),
                        }),
                        n => Ok(n),
                    }
                }
            }
        };

        assert!(cache.query::<usize, _, _>(key("a"), fetch.clone(), options()).await.is_err());
        assert_eq!(cache.query::<usize, _, _>(key("a"), fetch, options()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_marks_prefix_and_refetches_observed() {
        let (cache, _) = cache();
        let list_calls = Arc::new(AtomicUsize::new(0));
        let detail_calls = Arc::new(AtomicUsize::new(0));
        let list_key = todo_keys::list(&Default::default());

        let mut sub = cache.subscribe::<usize, _, _>(list_key.clone(), counting(list_calls.clone()), options());
        settle(&mut sub).await;
        cache
            .query::<usize, _, _>(todo_keys::detail("t-1"), counting(detail_calls.clone()), options())
            .await
            .unwrap();

        let matched = cache.invalidate(&todo_keys::lists());
        assert_eq!(matched, 1);
        assert_eq!(sub.status(), QueryStatus::Fetching);
        settle(&mut sub).await;

        assert_eq!(sub.current::<usize>(), Some(2));
        assert_eq!(list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.status(&todo_keys::detail("t-1")), QueryStatus::Fresh);

        // Unobserved entries only go stale; the next read revalidates them.
        assert_eq!(cache.invalidate(&todo_keys::all()), 2);
        assert_eq!(cache.status(&todo_keys::detail("t-1")), QueryStatus::Stale);
        assert_eq!(detail_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_during_fetch_refetches_after_it_lands() {
        let (cache, _) = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sub = cache.subscribe::<usize, _, _>(key("a"), counting(calls.clone()), options());

        assert_eq!(cache.invalidate(&key("a")), 1);
        settle(&mut sub).await;

        assert_eq!(sub.current::<usize>(), Some(2));
        assert_eq!(sub.status(), QueryStatus::Fresh);
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_results() {
        let (cache, _) = cache();
        let gate = Arc::new(Notify::new());
        let fetch = {
            let gate = gate.clone();
            move || {
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    Ok::<_, TodoSyncError>(7u32)
                }
            }
        };

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.query(key("a"), fetch, options()).await }
        });
        tokio::task::yield_now().await;
        assert_eq!(cache.status(&key("a")), QueryStatus::Fetching);

        cache.clear();
        gate.notify_one();

        assert_eq!(pending.await.unwrap().unwrap(), 7);
        assert!(cache.is_empty());
        assert_eq!(cache.peek::<u32>(&key("a")), None);
    }

    #[tokio::test]
    async fn test_clear_closes_subscriptions() {
        let (cache, _) = cache();
        let mut sub = cache.subscribe::<usize, _, _>(key("a"), counting(Arc::default()), options());
        settle(&mut sub).await;

        cache.clear();

        assert!(!sub.changed().await);
        assert_eq!(sub.status(), QueryStatus::Idle);
    }

    #[tokio::test]
    async fn test_unobserved_entries_are_collected_after_gc_time() {
        let (cache, clock) = cache();
        cache.query::<usize, _, _>(key("a"), counting(Arc::default()), options()).await.unwrap();
        let mut sub = cache.subscribe::<usize, _, _>(key("b"), counting(Arc::default()), options());
        settle(&mut sub).await;

        clock.advance(chrono::Duration::minutes(9));
        assert_eq!(cache.evict_inactive(), 0);

        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(cache.evict_inactive(), 1);
        assert_eq!(cache.status(&key("a")), QueryStatus::Idle);
        assert_eq!(cache.len(), 1);

        drop(sub);
        clock.advance(chrono::Duration::minutes(11));
        assert_eq!(cache.evict_inactive(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_internal_error() {
        let (cache, _) = cache();
        cache.query::<usize, _, _>(key("a"), counting(Arc::default()), options()).await.unwrap();

        let err = cache
            .query::<String, _, _>(key("a"), || async { Ok("x".to_string()) }, options())
            .await
            .unwrap_err();
        assert!(matches!(err, TodoSyncError::Internal(_)));
    }
}
