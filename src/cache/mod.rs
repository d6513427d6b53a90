//! In-memory entity cache shared by every view.
//!
//! Snapshots are keyed by [`QueryKey`]. Writes invalidate keys or whole
//! scopes; observed keys refetch right away, unobserved ones refetch the next
//! time a view binds them. Nothing is persisted.

mod key;
mod store;

pub use key::{KeyFilter, QueryKey, QueryScope};
pub use store::{EntryStatus, Fetcher, QueryCache, Snapshot, Subscription};
