//! Write operations with post-success cache invalidation.
//!
//! A `Mutation<I, O>` wraps one API write. It runs on a spawned task and is
//! polled from the tick handler like a [`Query`](crate::query::Query). On
//! success the declared filters are invalidated before anything else sees the
//! result, so observed lists refetch behind the write.
//!
//! Calls are not serialised. Every call started is settled by `poll`, and each
//! success invalidates. Status, error and the returned outcome follow the most
//! recent call only.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::cache::{KeyFilter, QueryCache};

type Action<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<Option<O>, ApiError>> + Send + Sync>;
type OnSuccess<O> = Box<dyn FnOnce(Option<&O>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
  Idle,
  Pending,
  Error,
}

/// Reported once by `Mutation::poll` when the latest call settles
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<O> {
  /// `None` when the server answered with an empty body
  Success(Option<O>),
  Error(String),
}

impl<O> MutationOutcome<O> {
  pub fn is_success(&self) -> bool {
    matches!(self, MutationOutcome::Success(_))
  }
}

/// One started call awaiting its result
struct InFlight<O> {
  seq: u64,
  receiver: oneshot::Receiver<Result<Option<O>, ApiError>>,
  on_success: Option<OnSuccess<O>>,
}

pub struct Mutation<I, O> {
  name: &'static str,
  cache: QueryCache,
  action: Action<I, O>,
  invalidates: Vec<KeyFilter>,
  status: MutationStatus,
  error: Option<ApiError>,
  in_flight: Vec<InFlight<O>>,
  /// Sequence number of the most recent call
  latest: u64,
}

impl<I, O: Send + 'static> Mutation<I, O> {
  pub fn new<F, Fut>(cache: &QueryCache, action: F) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<O>, ApiError>> + Send + 'static,
  {
    Self {
      name: "mutation",
      cache: cache.clone(),
      action: Arc::new(move |input| action(input).boxed()),
      invalidates: Vec::new(),
      status: MutationStatus::Idle,
      error: None,
      in_flight: Vec::new(),
      latest: 0,
    }
  }

  /// Name used in log events
  pub fn named(mut self, name: &'static str) -> Self {
    self.name = name;
    self
  }

  /// Invalidate `filter` after every successful call. Chain for several.
  pub fn invalidates(mut self, filter: impl Into<KeyFilter>) -> Self {
    self.invalidates.push(filter.into());
    self
  }

  pub fn mutate(&mut self, input: I) {
    self.start(input, None);
  }

  /// Like `mutate`, running `on_success` once after invalidation
  pub fn mutate_with<F>(&mut self, input: I, on_success: F)
  where
    F: FnOnce(Option<&O>) + 'static,
  {
    self.start(input, Some(Box::new(on_success)));
  }

  pub fn status(&self) -> MutationStatus {
    self.status
  }

  pub fn is_pending(&self) -> bool {
    self.status == MutationStatus::Pending
  }

  pub fn is_error(&self) -> bool {
    self.status == MutationStatus::Error
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  /// Back to `Idle`, dropping any error. Calls still in flight keep running;
  /// their successes still invalidate but no outcome is reported for them.
  pub fn reset(&mut self) {
    self.status = MutationStatus::Idle;
    self.error = None;
    self.latest += 1;
  }

  /// Settle every finished call. Returns the latest call's outcome exactly
  /// once; earlier calls only invalidate and run their callbacks.
  pub fn poll(&mut self) -> Option<MutationOutcome<O>> {
    let mut outcome = None;
    let mut i = 0;
    while i < self.in_flight.len() {
      let result = match self.in_flight[i].receiver.try_recv() {
        Ok(result) => result,
        Err(oneshot::error::TryRecvError::Empty) => {
          i += 1;
          continue;
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          Err(ApiError::Network("Request was cancelled".to_string()))
        }
      };
      let call = self.in_flight.remove(i);
      let is_latest = call.seq == self.latest;
      if let Some(settled) = self.finish(call.on_success, result, is_latest) {
        outcome = Some(settled);
      }
    }
    outcome
  }

  fn finish(
    &mut self,
    on_success: Option<OnSuccess<O>>,
    result: Result<Option<O>, ApiError>,
    is_latest: bool,
  ) -> Option<MutationOutcome<O>> {
    match result {
      Ok(output) => {
        info!(mutation = self.name, is_latest, "mutation succeeded");
        for filter in &self.invalidates {
          self.cache.invalidate_matching(filter);
        }
        if let Some(callback) = on_success {
          callback(output.as_ref());
        }
        if !is_latest {
          return None;
        }
        self.status = MutationStatus::Idle;
        self.error = None;
        Some(MutationOutcome::Success(output))
      }
      Err(e) => {
        warn!(mutation = self.name, is_latest, error = %e, "mutation failed");
        if !is_latest {
          return None;
        }
        let message = e.to_string();
        self.status = MutationStatus::Error;
        self.error = Some(e);
        Some(MutationOutcome::Error(message))
      }
    }
  }

  fn start(&mut self, input: I, on_success: Option<OnSuccess<O>>) {
    let (tx, rx) = oneshot::channel();
    let future = (self.action)(input);
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });

    self.latest += 1;
    self.in_flight.push(InFlight {
      seq: self.latest,
      receiver: rx,
      on_success,
    });
    self.status = MutationStatus::Pending;
    self.error = None;
    debug!(
      mutation = self.name,
      in_flight = self.in_flight.len(),
      "mutation started"
    );
  }
}
