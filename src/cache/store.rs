//! Shared in-memory store of query snapshots.
//!
//! One `QueryCache` is created at startup and cloned into every view. Only
//! the UI task touches it: fetches run as spawned tasks and hand their result
//! back through a oneshot channel that `poll()` drains.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::key::{KeyFilter, QueryKey};
use crate::api::ApiError;

/// Type-erased cached value. Each key always holds the same concrete type.
pub type Snapshot = Arc<dyn Any + Send + Sync>;

/// Produces a future that loads the snapshot for one key
pub type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<Snapshot, ApiError>> + Send + Sync>;

type Callback = Rc<dyn Fn(&QueryKey)>;
type FetchReceiver = oneshot::Receiver<Result<Snapshot, ApiError>>;

#[derive(Default)]
struct CacheEntry {
  data: Option<Snapshot>,
  updated_at: Option<DateTime<Utc>>,
  stale: bool,
  error: Option<ApiError>,
  fetcher: Option<Fetcher>,
  in_flight: Option<FetchReceiver>,
}

impl CacheEntry {
  fn needs_fetch(&self) -> bool {
    self.in_flight.is_none() && (self.data.is_none() || self.stale)
  }

  fn store(&mut self, snapshot: Snapshot) {
    self.data = Some(snapshot);
    self.updated_at = Some(Utc::now());
    self.stale = false;
    self.error = None;
  }

  /// Spawn the registered fetcher. Replaces any in-flight receiver, so the
  /// most recently started fetch is the one that lands.
  fn start_fetch(&mut self, key: &QueryKey) -> bool {
    let Some(fetcher) = self.fetcher.clone() else {
      return false;
    };

    let (tx, rx) = oneshot::channel();
    let future = fetcher();
    tokio::spawn(async move {
      // Receiver may have been superseded; the result is then dropped
      let _ = tx.send(future.await);
    });

    if self.in_flight.replace(rx).is_some() {
      debug!(%key, "superseded in-flight fetch");
    }
    debug!(%key, "fetch started");
    true
  }
}

/// Read-only view of one entry's bookkeeping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryStatus {
  pub has_data: bool,
  pub is_fetching: bool,
  pub is_stale: bool,
  pub error: Option<ApiError>,
  pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct CacheInner {
  entries: HashMap<QueryKey, CacheEntry>,
  subscribers: Vec<(u64, QueryKey, Callback)>,
  next_subscriber: u64,
}

/// Keyed snapshot store with invalidation, fetch de-duplication and change
/// subscriptions. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct QueryCache {
  inner: Rc<RefCell<CacheInner>>,
}

impl QueryCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Latest snapshot for `key`, if one was ever stored
  pub fn get<T: Any + Send + Sync>(&self, key: &QueryKey) -> Option<Arc<T>> {
    let snapshot = self.inner.borrow().entries.get(key)?.data.clone()?;
    match snapshot.downcast::<T>() {
      Ok(data) => Some(data),
      Err(_) => {
        warn!(%key, "cached snapshot has an unexpected type");
        None
      }
    }
  }

  /// Store a snapshot, marking the entry fresh
  pub fn put<T: Any + Send + Sync>(&self, key: QueryKey, value: T) {
    self
      .inner
      .borrow_mut()
      .entries
      .entry(key.clone())
      .or_default()
      .store(Arc::new(value));
    self.notify(&[key]);
  }

  /// Mark `key` stale. Its data stays readable until a refetch lands.
  pub fn invalidate(&self, key: &QueryKey) {
    self.invalidate_matching(&KeyFilter::Key(key.clone()));
  }

  /// Mark every matching entry stale. Entries that are currently observed
  /// refetch straight away, superseding any fetch already in flight.
  pub fn invalidate_matching(&self, filter: &KeyFilter) {
    let mut changed = Vec::new();
    {
      let mut inner = self.inner.borrow_mut();
      let observed: HashSet<QueryKey> = inner
        .subscribers
        .iter()
        .map(|(_, key, _)| key.clone())
        .collect();

      for (key, entry) in inner.entries.iter_mut() {
        if !filter.matches(key) {
          continue;
        }
        entry.stale = true;
        if observed.contains(key) {
          entry.start_fetch(key);
        }
        changed.push(key.clone());
      }
    }

    debug!(?filter, count = changed.len(), "invalidated");
    self.notify(&changed);
  }

  /// Register `fetcher` for `key` and fetch if the entry is absent or stale
  /// and nothing is in flight yet.
  pub fn ensure(&self, key: &QueryKey, fetcher: Fetcher) {
    let started = {
      let mut inner = self.inner.borrow_mut();
      let entry = inner.entries.entry(key.clone()).or_default();
      entry.fetcher = Some(fetcher);
      entry.needs_fetch() && entry.start_fetch(key)
    };
    if started {
      self.notify(std::slice::from_ref(key));
    }
  }

  /// Fetch `key` now, even if a fetch is already running
  pub fn refetch(&self, key: &QueryKey) {
    let started = self
      .inner
      .borrow_mut()
      .entries
      .get_mut(key)
      .is_some_and(|entry| entry.start_fetch(key));
    if started {
      self.notify(std::slice::from_ref(key));
    }
  }

  /// Apply finished fetches. Returns true if any entry changed.
  pub fn poll(&self) -> bool {
    let mut changed = Vec::new();
    {
      let mut inner = self.inner.borrow_mut();
      for (key, entry) in inner.entries.iter_mut() {
        let Some(rx) = entry.in_flight.as_mut() else {
          continue;
        };
        let result = match rx.try_recv() {
          Ok(result) => result,
          Err(oneshot::error::TryRecvError::Empty) => continue,
          Err(oneshot::error::TryRecvError::Closed) => {
            Err(ApiError::Network("Fetch was cancelled".to_string()))
          }
        };
        entry.in_flight = None;

        match result {
          Ok(snapshot) => {
            debug!(%key, "fetch settled");
            entry.store(snapshot);
          }
          Err(e) => {
            warn!(%key, error = %e, "fetch failed");
            entry.error = Some(e);
          }
        }
        changed.push(key.clone());
      }
    }

    self.notify(&changed);
    !changed.is_empty()
  }

  pub fn status(&self, key: &QueryKey) -> EntryStatus {
    let inner = self.inner.borrow();
    match inner.entries.get(key) {
      Some(entry) => EntryStatus {
        has_data: entry.data.is_some(),
        is_fetching: entry.in_flight.is_some(),
        is_stale: entry.stale,
        error: entry.error.clone(),
        updated_at: entry.updated_at,
      },
      None => EntryStatus::default(),
    }
  }

  /// Call `callback` after every change to `key`'s entry, until the returned
  /// subscription is dropped.
  pub fn subscribe<F>(&self, key: QueryKey, callback: F) -> Subscription
  where
    F: Fn(&QueryKey) + 'static,
  {
    let mut inner = self.inner.borrow_mut();
    inner.next_subscriber += 1;
    let id = inner.next_subscriber;
    inner.subscribers.push((id, key, Rc::new(callback)));

    Subscription {
      id,
      cache: Rc::downgrade(&self.inner),
    }
  }

  pub fn observer_count(&self, key: &QueryKey) -> usize {
    self
      .inner
      .borrow()
      .subscribers
      .iter()
      .filter(|(_, k, _)| k == key)
      .count()
  }

  // Callbacks run with no borrow held, so they may read or write the cache.
  fn notify(&self, keys: &[QueryKey]) {
    if keys.is_empty() {
      return;
    }
    let callbacks: Vec<(QueryKey, Callback)> = self
      .inner
      .borrow()
      .subscribers
      .iter()
      .filter(|(_, key, _)| keys.contains(key))
      .map(|(_, key, callback)| (key.clone(), Rc::clone(callback)))
      .collect();

    for (key, callback) in callbacks {
      callback(&key);
    }
  }
}

/// Handle returned by `QueryCache::subscribe`; unsubscribes on drop
pub struct Subscription {
  id: u64,
  cache: Weak<RefCell<CacheInner>>,
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(cache) = self.cache.upgrade() {
      if let Ok(mut inner) = cache.try_borrow_mut() {
        inner.subscribers.retain(|(id, _, _)| *id != self.id);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::JobId;
  use crate::cache::key::QueryScope;
  use crate::testing::settle;
  use futures::FutureExt;
  use std::cell::Cell;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  fn counting(value: Vec<u32>, calls: Arc<AtomicUsize>) -> Fetcher {
    Arc::new(move || {
      calls.fetch_add(1, Ordering::SeqCst);
      let value = value.clone();
      async move { Ok::<_, ApiError>(Arc::new(value) as Snapshot) }.boxed()
    })
  }

  fn failing() -> Fetcher {
    Arc::new(|| {
      async {
        Err::<Snapshot, _>(ApiError::HttpStatus {
          status: 500,
          message: "Failed to load projects".to_string(),
        })
      }
      .boxed()
    })
  }

  #[test]
  fn test_put_and_get() {
    let cache = QueryCache::new();
    cache.put(QueryKey::Projects, vec![1u32, 2]);

    assert_eq!(cache.get::<Vec<u32>>(&QueryKey::Projects).as_deref(), Some(&vec![1, 2]));
    assert!(cache.get::<String>(&QueryKey::Projects).is_none());
    assert!(cache.get::<Vec<u32>>(&QueryKey::Employees).is_none());
  }

  #[test]
  fn test_invalidate_keeps_previous_data() {
    let cache = QueryCache::new();
    cache.put(QueryKey::Projects, vec![1u32]);

    cache.invalidate(&QueryKey::Projects);

    let status = cache.status(&QueryKey::Projects);
    assert!(status.is_stale);
    assert!(status.has_data);
    assert!(!status.is_fetching);
    assert_eq!(cache.get::<Vec<u32>>(&QueryKey::Projects).as_deref(), Some(&vec![1]));
  }

  #[tokio::test]
  async fn test_ensure_deduplicates_by_key() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicUsize::new(0));

    cache.ensure(&QueryKey::Employees, counting(vec![7], calls.clone()));
    cache.ensure(&QueryKey::Employees, counting(vec![7], calls.clone()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    settle(|| cache.poll()).await;
    assert_eq!(cache.get::<Vec<u32>>(&QueryKey::Employees).as_deref(), Some(&vec![7]));

    // Fresh data: no further fetch
    cache.ensure(&QueryKey::Employees, counting(vec![7], calls.clone()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_failed_fetch_keeps_previous_snapshot() {
    let cache = QueryCache::new();
    cache.put(QueryKey::Projects, vec![1u32]);
    cache.invalidate(&QueryKey::Projects);

    cache.ensure(&QueryKey::Projects, failing());
    assert!(cache.status(&QueryKey::Projects).is_fetching);

    settle(|| cache.poll()).await;

    let status = cache.status(&QueryKey::Projects);
    assert!(!status.is_fetching);
    assert_eq!(
      status.error.map(|e| e.to_string()),
      Some("Failed to load projects".to_string())
    );
    assert_eq!(cache.get::<Vec<u32>>(&QueryKey::Projects).as_deref(), Some(&vec![1]));
  }

  #[tokio::test]
  async fn test_invalidate_refetches_observed_keys_only() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = QueryKey::EmployeesForProject(JobId(5));
    let other = QueryKey::EmployeesForProject(JobId(6));

    let _observer = cache.subscribe(key.clone(), |_| {});
    cache.ensure(&key, counting(vec![1], calls.clone()));
    cache.ensure(&other, counting(vec![2], calls.clone()));
    settle(|| {
      cache.poll();
      cache.status(&key).has_data && cache.status(&other).has_data
    })
    .await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    cache.invalidate_matching(&QueryScope::EmployeesForProject.into());

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(cache.status(&key).is_fetching);
    assert!(!cache.status(&other).is_fetching);
    assert!(cache.status(&other).is_stale);
  }

  #[test]
  fn test_subscription_notified_until_dropped() {
    let cache = QueryCache::new();
    let hits = Rc::new(Cell::new(0));
    let counter = hits.clone();

    let subscription = cache.subscribe(QueryKey::Employees, move |_| counter.set(counter.get() + 1));
    cache.put(QueryKey::Employees, 1u32);
    cache.put(QueryKey::Projects, 1u32);
    assert_eq!(hits.get(), 1);
    assert_eq!(cache.observer_count(&QueryKey::Employees), 1);

    drop(subscription);
    cache.put(QueryKey::Employees, 2u32);
    assert_eq!(hits.get(), 1);
    assert_eq!(cache.observer_count(&QueryKey::Employees), 0);
  }

  #[test]
  fn test_callback_may_read_the_cache() {
    let cache = QueryCache::new();
    let seen = Rc::new(Cell::new(0u32));
    let reader = cache.clone();
    let sink = seen.clone();

    let _sub = cache.subscribe(QueryKey::Projects, move |key| {
      if let Some(v) = reader.get::<u32>(key) {
        sink.set(*v);
      }
    });
    cache.put(QueryKey::Projects, 9u32);

    assert_eq!(seen.get(), 9);
  }

  #[tokio::test]
  async fn test_refetch_supersedes_in_flight_fetch() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetcher: Fetcher = Arc::new(move || {
      let n = counter.fetch_add(1, Ordering::SeqCst) as u32;
      async move {
        // First call is slower, so it would land last without superseding
        let delay = if n == 0 { 40 } else { 1 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok::<_, ApiError>(Arc::new(n) as Snapshot)
      }
      .boxed()
    });

    cache.ensure(&QueryKey::Projects, fetcher);
    cache.refetch(&QueryKey::Projects);
    settle(|| cache.poll()).await;
    assert_eq!(cache.get::<u32>(&QueryKey::Projects).as_deref(), Some(&1));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!cache.poll());
    assert_eq!(cache.get::<u32>(&QueryKey::Projects).as_deref(), Some(&1));
  }
}
