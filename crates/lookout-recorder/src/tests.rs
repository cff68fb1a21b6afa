//! Recorder tests against an in-memory `SqliteStore` and a store that
//! always fails.

use std::sync::{
  Arc,
  atomic::{AtomicUsize, Ordering},
};

use lookout_core::{
  entry::{Entry, EntryContent, EntryId, EntryType, IncomingEntry, NewEntry},
  store::{EntriesRepository, EntryQuery, StoreError},
};
use lookout_store_sqlite::SqliteStore;
use serde_json::json;
use uuid::Uuid;

use crate::{
  Dispatcher, Recorder, RecorderConfig, Watcher,
  watchers::{CommandFinished, CommandInput, CommandWatcher, ConsoleOutput},
};

async fn recorder() -> (Arc<SqliteStore>, Recorder<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
  let recorder = Recorder::new(store.clone(), &RecorderConfig::default());
  (store, recorder)
}

fn incoming(key: &str) -> IncomingEntry {
  let mut content = EntryContent::new();
  content.insert(key.into(), json!(true));
  IncomingEntry::make(content)
}

fn migrate() -> CommandFinished {
  CommandFinished {
    command:   "migrate".into(),
    exit_code: 0,
    input:     CommandInput::default(),
  }
}

// ─── Failing store ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("disk on fire")]
struct Broken;

impl StoreError for Broken {
  fn is_not_found(&self) -> bool { false }
}

#[derive(Default)]
struct FailingStore {
  attempts: AtomicUsize,
}

impl EntriesRepository for FailingStore {
  type Error = Broken;

  async fn find(&self, _id: EntryId) -> Result<Entry, Broken> { Err(Broken) }

  async fn get(
    &self,
    _entry_type: Option<EntryType>,
    _query: &EntryQuery,
  ) -> Result<Vec<Entry>, Broken> {
    Err(Broken)
  }

  async fn store(&self, _entries: Vec<NewEntry>) -> Result<Vec<EntryId>, Broken> {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    Err(Broken)
  }
}

// ─── Flushing ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn finish_flushes_batch_to_store() {
  let (store, recorder) = recorder().await;

  let work = recorder.begin();
  let batch_id = work.batch_id();
  work.record_request(incoming("request"));
  work.record_query(incoming("query"));
  assert_eq!(work.finish().await, 2);

  let stored = store
    .get(None, &EntryQuery::default().batch_id(batch_id))
    .await
    .unwrap();
  let types: Vec<EntryType> = stored.iter().map(|e| e.entry_type).collect();
  assert_eq!(types, vec![EntryType::Query, EntryType::Request]);
}

#[tokio::test]
async fn nothing_is_stored_before_finish() {
  let (store, recorder) = recorder().await;

  let work = recorder.begin();
  work.record_log(incoming("log"));
  assert!(store.get(None, &EntryQuery::default()).await.unwrap().is_empty());

  work.finish().await;
  assert_eq!(store.get(None, &EntryQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn units_of_work_have_separate_batches() {
  let (store, recorder) = recorder().await;

  let a = recorder.begin();
  let b = recorder.begin();
  a.record_job(incoming("a"));
  b.record_job(incoming("b"));
  b.record_job(incoming("b"));

  assert_ne!(a.batch_id(), b.batch_id());
  assert_eq!(a.len(), 1);
  assert_eq!(b.len(), 2);

  let a_id = a.batch_id();
  a.finish().await;
  b.finish().await;

  let only_a = store
    .get(None, &EntryQuery::default().batch_id(a_id))
    .await
    .unwrap();
  assert_eq!(only_a.len(), 1);
}

#[tokio::test]
async fn begin_with_batch_id_uses_given_id() {
  let (store, recorder) = recorder().await;
  let id = Uuid::new_v4();

  let work = recorder.begin_with_batch_id(id);
  work.record_event(incoming("event"));
  work.finish().await;

  let stored = store.get(None, &EntryQuery::default()).await.unwrap();
  assert_eq!(stored[0].batch_id, id);
}

#[tokio::test]
async fn storage_failure_is_swallowed() {
  let store = Arc::new(FailingStore::default());
  let recorder = Recorder::new(store.clone(), &RecorderConfig::default());

  let work = recorder.begin();
  work.record_exception(incoming("boom"));
  assert_eq!(work.finish().await, 0);
  assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropped_unit_of_work_is_flushed_in_background() {
  let (store, recorder) = recorder().await;

  {
    let work = recorder.begin();
    work.record_exception(incoming("aborted"));
    // Dropped without finish, as when the work panics or is cancelled.
  }

  recorder.shutdown().await;
  let stored = store.get(None, &EntryQuery::default()).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].entry_type, EntryType::Exception);
}

#[tokio::test]
async fn empty_unit_of_work_stores_nothing() {
  let store = Arc::new(FailingStore::default());
  let recorder = Recorder::new(store.clone(), &RecorderConfig::default());

  assert_eq!(recorder.begin().finish().await, 0);
  drop(recorder.begin());
  recorder.shutdown().await;
  assert_eq!(store.attempts.load(Ordering::SeqCst), 0);
}

// ─── Recording switch and tags ───────────────────────────────────────────────

#[tokio::test]
async fn disabled_recorder_records_nothing() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let recorder = Recorder::new(store.clone(), &RecorderConfig { enabled: false });
  assert!(!recorder.is_recording());

  let work = recorder.begin();
  work.record_mail(incoming("mail"));
  assert!(work.is_empty());

  recorder.start_recording();
  work.record_mail(incoming("mail"));
  assert_eq!(work.finish().await, 1);
}

#[tokio::test]
async fn shutdown_stops_recording() {
  let (_store, recorder) = recorder().await;
  recorder.shutdown().await;

  let work = recorder.begin();
  work.record_cache(incoming("hit"));
  assert!(work.is_empty());
}

#[tokio::test]
async fn tag_hooks_are_indexed() {
  let (store, recorder) = recorder().await;
  recorder.tag_using(|entry_type, entry| {
    if entry_type == EntryType::Request && entry.content.contains_key("slow") {
      vec!["slow".to_string()]
    } else {
      vec![]
    }
  });

  let work = recorder.begin();
  work.record_request(incoming("slow"));
  work.record_request(incoming("fast"));
  work.finish().await;

  let slow = store
    .get(Some(EntryType::Request), &EntryQuery::default().tag("slow"))
    .await
    .unwrap();
  assert_eq!(slow.len(), 1);
  assert_eq!(slow[0].content, json!({ "slow": true }));
}

// ─── Watchers ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn command_watcher_records_one_entry_per_event() {
  let (store, recorder) = recorder().await;
  let console = ConsoleOutput::new();

  let mut events = Dispatcher::new();
  CommandWatcher::new(console.clone()).register(&mut events);
  assert!(events.has_listeners::<CommandFinished>());

  let work = recorder.begin();
  console.write("Nothing to migrate.\n");
  assert_eq!(events.dispatch(&migrate(), &work), 1);
  assert_eq!(events.dispatch(&migrate(), &work), 1);
  assert_eq!(work.len(), 2);
  work.finish().await;

  let commands = store
    .get(Some(EntryType::Command), &EntryQuery::default())
    .await
    .unwrap();
  assert_eq!(commands.len(), 2);
  assert_eq!(commands[0].content["command"], json!("migrate"));
  assert_eq!(commands[0].content["exit_code"], json!(0));
  assert_eq!(commands[0].content["output"], json!("Nothing to migrate.\n"));
}

#[tokio::test]
async fn unrelated_events_are_ignored() {
  let (_store, recorder) = recorder().await;

  let mut events = Dispatcher::new();
  CommandWatcher::new(ConsoleOutput::new()).register(&mut events);

  struct RequestHandled;
  let work = recorder.begin();
  assert!(!events.has_listeners::<RequestHandled>());
  assert_eq!(events.dispatch(&RequestHandled, &work), 0);
  assert!(work.is_empty());
}

#[tokio::test]
async fn listeners_run_in_registration_order() {
  let (_store, recorder) = recorder().await;
  let mut events = Dispatcher::new();

  events.listen::<CommandFinished, _>(|event, batch| {
    batch.record_log(incoming(&format!("first:{}", event.command)));
  });
  events.listen::<CommandFinished, _>(|event, batch| {
    batch.record_log(incoming(&format!("second:{}", event.command)));
  });

  let work = recorder.begin();
  assert_eq!(events.dispatch(&migrate(), &work), 2);

  let entries = work.batch().take_entries();
  assert!(entries[0].content.contains_key("first:migrate"));
  assert!(entries[1].content.contains_key("second:migrate"));
}
