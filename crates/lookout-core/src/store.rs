//! The `EntriesRepository` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `lookout-store-sqlite`).
//! The recorder and the query API depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::{Entry, EntryId, EntryType, NewEntry};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`EntriesRepository::get`]. Every filter is optional and
/// present filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryQuery {
  /// Only entries with an id strictly below this cursor.
  pub before:   Option<EntryId>,
  /// Only entries carrying this tag.
  pub tag:      Option<String>,
  /// Only entries from this batch.
  pub batch_id: Option<Uuid>,
  /// Maximum number of entries; [`EntryQuery::DEFAULT_TAKE`] when absent.
  pub take:     Option<usize>,
}

impl EntryQuery {
  pub const DEFAULT_TAKE: usize = 50;

  pub fn before(mut self, id: EntryId) -> Self {
    self.before = Some(id);
    self
  }

  pub fn tag(mut self, tag: impl Into<String>) -> Self {
    self.tag = Some(tag.into());
    self
  }

  pub fn batch_id(mut self, batch_id: Uuid) -> Self {
    self.batch_id = Some(batch_id);
    self
  }

  pub fn take(mut self, take: usize) -> Self {
    self.take = Some(take);
    self
  }

  /// The tag filter, ignoring an empty tag.
  pub fn tag_filter(&self) -> Option<&str> {
    self.tag.as_deref().filter(|t| !t.is_empty())
  }

  pub fn limit(&self) -> usize { self.take.unwrap_or(Self::DEFAULT_TAKE) }
}

// ─── Error bound ─────────────────────────────────────────────────────────────

/// Lets callers tell a missing entry apart from a storage failure without
/// knowing the backend's concrete error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_not_found(&self) -> bool;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an entry storage backend.
///
/// Entries are append-only: there is no update operation. Ids are assigned
/// by the backend and increase monotonically across concurrent callers.
pub trait EntriesRepository: Send + Sync {
  type Error: StoreError;

  /// Fetch one entry by id, with its content decoded.
  ///
  /// Fails with a not-found error (see [`StoreError::is_not_found`]) when no
  /// entry has that id.
  fn find(
    &self,
    id: EntryId,
  ) -> impl Future<Output = Result<Entry, Self::Error>> + Send + '_;

  /// List entries matching `query`, newest first (descending id), at most
  /// `query.limit()` of them. `entry_type: None` means any type.
  fn get<'a>(
    &'a self,
    entry_type: Option<EntryType>,
    query: &'a EntryQuery,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + 'a;

  /// Persist `entries` in order, indexing each entry's tags under the id it
  /// was assigned. Returns the assigned ids in the same order.
  ///
  /// Not atomic: if an insert fails, entries already written stay written
  /// and the call returns the error.
  fn store(
    &self,
    entries: Vec<NewEntry>,
  ) -> impl Future<Output = Result<Vec<EntryId>, Self::Error>> + Send + '_;
}
