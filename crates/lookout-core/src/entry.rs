//! Entry types — the normalised record of one observed application event.
//!
//! An entry moves through three shapes:
//!
//! 1. [`IncomingEntry`] — built by a watcher from a framework event.
//! 2. [`NewEntry`] — stamped with a type and batch id by the recorder.
//! 3. [`Entry`] — persisted, carrying the id assigned by the store.
//!
//! Entries are immutable once stored.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Store-assigned identifier. Monotonically increasing in insertion order.
pub type EntryId = i64;

/// Structured payload of an entry; its shape depends on the [`EntryType`].
pub type EntryContent = serde_json::Map<String, serde_json::Value>;

// ─── EntryType ───────────────────────────────────────────────────────────────

/// The category of an entry; discriminates the shape of its content.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
  Cache,
  Command,
  Dump,
  Event,
  Exception,
  Job,
  Log,
  Mail,
  Model,
  Notification,
  Query,
  Redis,
  Request,
  ScheduledTask,
}

impl EntryType {
  pub const ALL: [EntryType; 14] = [
    Self::Cache,
    Self::Command,
    Self::Dump,
    Self::Event,
    Self::Exception,
    Self::Job,
    Self::Log,
    Self::Mail,
    Self::Model,
    Self::Notification,
    Self::Query,
    Self::Redis,
    Self::Request,
    Self::ScheduledTask,
  ];

  /// The text stored in the `type` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Cache => "cache",
      Self::Command => "command",
      Self::Dump => "dump",
      Self::Event => "event",
      Self::Exception => "exception",
      Self::Job => "job",
      Self::Log => "log",
      Self::Mail => "mail",
      Self::Model => "model",
      Self::Notification => "notification",
      Self::Query => "query",
      Self::Redis => "redis",
      Self::Request => "request",
      Self::ScheduledTask => "scheduled_task",
    }
  }
}

impl fmt::Display for EntryType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for EntryType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|t| t.as_str() == s)
      .ok_or_else(|| Error::UnknownEntryType(s.to_owned()))
  }
}

// ─── IncomingEntry ───────────────────────────────────────────────────────────

/// What a watcher produces: content and tags, but no type, batch or id.
///
/// The recorder decides the type (via the `record_<category>` call used) and
/// the batch; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEntry {
  pub content:     EntryContent,
  pub tags:        BTreeSet<String>,
  /// Capture time; set when the entry is made.
  pub recorded_at: DateTime<Utc>,
}

impl IncomingEntry {
  pub fn make(content: EntryContent) -> Self {
    Self {
      content,
      tags: BTreeSet::new(),
      recorded_at: Utc::now(),
    }
  }

  /// Add tags to the entry. Duplicates collapse.
  pub fn tags<I, T>(mut self, tags: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    self.tags.extend(tags.into_iter().map(Into::into));
    self
  }
}

// ─── NewEntry ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::EntriesRepository::store`].
/// The id is always assigned by the store; it is not accepted from callers.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
  pub batch_id:   Uuid,
  pub entry_type: EntryType,
  pub content:    EntryContent,
  pub tags:       BTreeSet<String>,
  pub created_at: DateTime<Utc>,
}

impl NewEntry {
  pub fn from_incoming(
    batch_id: Uuid,
    entry_type: EntryType,
    incoming: IncomingEntry,
  ) -> Self {
    Self {
      batch_id,
      entry_type,
      content: incoming.content,
      tags: incoming.tags,
      created_at: incoming.recorded_at,
    }
  }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// A persisted entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  pub id:         EntryId,
  pub batch_id:   Uuid,
  #[serde(rename = "type")]
  pub entry_type: EntryType,
  /// Normally a JSON object. If the stored text could not be decoded, the
  /// raw text is returned as a JSON string instead.
  pub content:    serde_json::Value,
  pub tags:       BTreeSet<String>,
  pub created_at: DateTime<Utc>,
}
