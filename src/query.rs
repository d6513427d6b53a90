//! Query binding: a view's handle on one cache key.
//!
//! A `Query<T>` registers an observer and a fetcher with the shared
//! [`QueryCache`], so two views bound to the same key share one request and
//! one snapshot.
//!
//! ```ignore
//! let api = api.clone();
//! let mut projects = Query::bind(&cache, QueryKey::Projects, move || {
//!   let api = api.clone();
//!   async move { api.get_jobs().await }
//! });
//!
//! // In the tick handler
//! if projects.poll() {
//!   // Entry changed, redraw
//! }
//!
//! // In render
//! let state = projects.state();
//! if state.is_loading { /* spinner */ }
//! ```

use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::cell::Cell;
use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use crate::api::ApiError;
use crate::cache::{Fetcher, QueryCache, QueryKey, Snapshot, Subscription};

/// What a view needs to render one query
#[derive(Debug)]
pub struct QueryState<T> {
  pub data: Option<Arc<T>>,
  /// First load: fetching with nothing to show yet
  pub is_loading: bool,
  pub is_fetching: bool,
  pub error: Option<ApiError>,
}

pub struct Query<T> {
  cache: QueryCache,
  key: QueryKey,
  changed: Rc<Cell<bool>>,
  _subscription: Subscription,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Query<T> {
  /// Bind to `key`, fetching with `fetch` if the entry is missing or stale.
  pub fn bind<F, Fut>(cache: &QueryCache, key: QueryKey, fetch: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let changed = Rc::new(Cell::new(true));
    let flag = changed.clone();
    let subscription = cache.subscribe(key.clone(), move |_| flag.set(true));

    let fetcher: Fetcher = Arc::new(move || {
      let future = fetch();
      async move { future.await.map(|data| Arc::new(data) as Snapshot) }.boxed()
    });
    cache.ensure(&key, fetcher);

    Self {
      cache: cache.clone(),
      key,
      changed,
      _subscription: subscription,
      _marker: PhantomData,
    }
  }

  pub fn state(&self) -> QueryState<T> {
    let status = self.cache.status(&self.key);
    QueryState {
      data: self.data(),
      is_loading: status.is_fetching && !status.has_data,
      is_fetching: status.is_fetching,
      error: status.error,
    }
  }

  pub fn data(&self) -> Option<Arc<T>> {
    self.cache.get::<T>(&self.key)
  }

  pub fn is_loading(&self) -> bool {
    let status = self.cache.status(&self.key);
    status.is_fetching && !status.has_data
  }

  pub fn is_fetching(&self) -> bool {
    self.cache.status(&self.key).is_fetching
  }

  pub fn error(&self) -> Option<ApiError> {
    self.cache.status(&self.key).error
  }

  pub fn is_stale(&self) -> bool {
    self.cache.status(&self.key).is_stale
  }

  pub fn updated_at(&self) -> Option<DateTime<Utc>> {
    self.cache.status(&self.key).updated_at
  }

  /// Force a new fetch, superseding one already in flight
  pub fn refetch(&mut self) {
    self.cache.refetch(&self.key);
  }

  /// Returns `true` if the entry changed since the last call.
  /// Call this in the tick handler, after `QueryCache::poll`.
  pub fn poll(&mut self) -> bool {
    self.changed.replace(false)
  }
}

impl<T> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("status", &self.cache.status(&self.key))
      .finish_non_exhaustive()
  }
}
