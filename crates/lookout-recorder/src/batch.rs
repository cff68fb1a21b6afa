//! [`Batch`] — the entry buffer owned by one unit of work.
//!
//! Recording into a batch never touches storage: it stamps the entry with
//! its type and the batch id and pushes it onto an in-memory buffer. The
//! buffer is flushed by [`crate::UnitOfWork`].

use std::sync::{
  Arc, Mutex, PoisonError, RwLock,
  atomic::{AtomicBool, Ordering},
};

use lookout_core::entry::{EntryType, IncomingEntry, NewEntry};
use uuid::Uuid;

/// Hook that derives extra tags for an entry as it is recorded.
pub type Tagger = Arc<dyn Fn(EntryType, &IncomingEntry) -> Vec<String> + Send + Sync>;

/// State shared between a recorder and every batch it hands out.
pub(crate) struct RecordingState {
  recording: AtomicBool,
  taggers:   RwLock<Vec<Tagger>>,
}

impl RecordingState {
  pub(crate) fn new(recording: bool) -> Self {
    Self {
      recording: AtomicBool::new(recording),
      taggers:   RwLock::new(Vec::new()),
    }
  }

  pub(crate) fn is_recording(&self) -> bool { self.recording.load(Ordering::Acquire) }

  pub(crate) fn set_recording(&self, on: bool) { self.recording.store(on, Ordering::Release) }

  pub(crate) fn add_tagger(&self, tagger: Tagger) {
    self
      .taggers
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .push(tagger);
  }

  fn apply_taggers(&self, entry_type: EntryType, entry: &mut IncomingEntry) {
    // Hooks run without the lock held so they may register further hooks.
    let taggers = self
      .taggers
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone();
    for tagger in &taggers {
      let extra = tagger(entry_type, entry);
      entry.tags.extend(extra);
    }
  }
}

/// Entries captured during one unit of work, all sharing one batch id.
pub struct Batch {
  batch_id: Uuid,
  state:    Arc<RecordingState>,
  entries:  Mutex<Vec<NewEntry>>,
}

impl Batch {
  pub(crate) fn new(batch_id: Uuid, state: Arc<RecordingState>) -> Self {
    Self { batch_id, state, entries: Mutex::new(Vec::new()) }
  }

  pub fn batch_id(&self) -> Uuid { self.batch_id }

  /// Number of entries waiting to be flushed.
  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Buffer `entry` as an entry of `entry_type`. Does nothing while the
  /// recorder is stopped.
  pub fn record(&self, entry_type: EntryType, mut entry: IncomingEntry) {
    if !self.state.is_recording() {
      return;
    }

    self.state.apply_taggers(entry_type, &mut entry);
    let entry = NewEntry::from_incoming(self.batch_id, entry_type, entry);
    self.lock().push(entry);
  }

  pub fn record_cache(&self, entry: IncomingEntry) { self.record(EntryType::Cache, entry) }

  pub fn record_command(&self, entry: IncomingEntry) { self.record(EntryType::Command, entry) }

  pub fn record_dump(&self, entry: IncomingEntry) { self.record(EntryType::Dump, entry) }

  pub fn record_event(&self, entry: IncomingEntry) { self.record(EntryType::Event, entry) }

  pub fn record_exception(&self, entry: IncomingEntry) {
    self.record(EntryType::Exception, entry)
  }

  pub fn record_job(&self, entry: IncomingEntry) { self.record(EntryType::Job, entry) }

  pub fn record_log(&self, entry: IncomingEntry) { self.record(EntryType::Log, entry) }

  pub fn record_mail(&self, entry: IncomingEntry) { self.record(EntryType::Mail, entry) }

  pub fn record_model_event(&self, entry: IncomingEntry) { self.record(EntryType::Model, entry) }

  pub fn record_notification(&self, entry: IncomingEntry) {
    self.record(EntryType::Notification, entry)
  }

  pub fn record_query(&self, entry: IncomingEntry) { self.record(EntryType::Query, entry) }

  pub fn record_redis(&self, entry: IncomingEntry) { self.record(EntryType::Redis, entry) }

  pub fn record_request(&self, entry: IncomingEntry) { self.record(EntryType::Request, entry) }

  pub fn record_scheduled_command(&self, entry: IncomingEntry) {
    self.record(EntryType::ScheduledTask, entry)
  }

  /// Drain the buffer.
  pub(crate) fn take_entries(&self) -> Vec<NewEntry> { std::mem::take(&mut *self.lock()) }

  fn lock(&self) -> std::sync::MutexGuard<'_, Vec<NewEntry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl std::fmt::Debug for Batch {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Batch")
      .field("batch_id", &self.batch_id)
      .field("pending", &self.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use lookout_core::entry::EntryContent;
  use serde_json::json;

  use super::*;

  fn batch(recording: bool) -> Batch {
    Batch::new(Uuid::new_v4(), Arc::new(RecordingState::new(recording)))
  }

  fn incoming() -> IncomingEntry {
    let mut content = EntryContent::new();
    content.insert("sql".into(), json!("select 1"));
    IncomingEntry::make(content)
  }

  #[test]
  fn record_stamps_type_and_batch_id() {
    let b = batch(true);
    b.record_query(incoming());
    b.record_command(incoming());

    let entries = b.take_entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].entry_type, EntryType::Query);
    assert_eq!(entries[1].entry_type, EntryType::Command);
    assert!(entries.iter().all(|e| e.batch_id == b.batch_id()));
  }

  #[test]
  fn take_entries_empties_buffer() {
    let b = batch(true);
    b.record_log(incoming());
    assert_eq!(b.len(), 1);
    b.take_entries();
    assert!(b.is_empty());
  }

  #[test]
  fn stopped_recording_drops_entries() {
    let b = batch(false);
    b.record_request(incoming());
    assert!(b.is_empty());
  }

  #[test]
  fn taggers_add_tags() {
    let state = Arc::new(RecordingState::new(true));
    state.add_tagger(Arc::new(|t: EntryType, _: &IncomingEntry| {
      vec![format!("type:{t}")]
    }));
    let b = Batch::new(Uuid::new_v4(), state);

    b.record_job(incoming().tags(["queue:default"]));

    let entries = b.take_entries();
    let tags: Vec<&str> = entries[0].tags.iter().map(String::as_str).collect();
    assert_eq!(tags, vec!["queue:default", "type:job"]);
  }

  #[test]
  fn tagger_may_register_another_tagger() {
    let state = Arc::new(RecordingState::new(true));
    let registry = Arc::downgrade(&state);
    state.add_tagger(Arc::new(move |_: EntryType, _: &IncomingEntry| {
      if let Some(state) = registry.upgrade() {
        state.add_tagger(Arc::new(|_: EntryType, _: &IncomingEntry| {
          vec!["late".to_string()]
        }));
      }
      vec!["early".to_string()]
    }));
    let b = Batch::new(Uuid::new_v4(), state);

    b.record_log(incoming());
    b.record_log(incoming());

    let entries = b.take_entries();
    assert!(!entries[0].tags.contains("late"));
    assert!(entries[1].tags.contains("early"));
    assert!(entries[1].tags.contains("late"));
  }
}
