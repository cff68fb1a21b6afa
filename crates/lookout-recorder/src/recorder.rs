//! [`Recorder`] — the handle watchers record through, and [`UnitOfWork`],
//! which owns one batch and flushes it to the store.

use std::{ops::Deref, sync::Arc};

use lookout_core::{
  entry::{EntryType, IncomingEntry, NewEntry},
  store::EntriesRepository,
};
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::{
  batch::{Batch, RecordingState, Tagger},
  config::RecorderConfig,
};

// ─── Recorder ────────────────────────────────────────────────────────────────

/// Created once per application instance and passed to whatever starts units
/// of work. Cloning is cheap; clones share the store, the recording switch
/// and the tagging hooks.
pub struct Recorder<S> {
  store:   Arc<S>,
  state:   Arc<RecordingState>,
  flushes: TaskTracker,
}

impl<S> Clone for Recorder<S> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      state:   self.state.clone(),
      flushes: self.flushes.clone(),
    }
  }
}

impl<S> Recorder<S>
where
  S: EntriesRepository + 'static,
{
  pub fn new(store: Arc<S>, config: &RecorderConfig) -> Self {
    Self {
      store,
      state: Arc::new(RecordingState::new(config.enabled)),
      flushes: TaskTracker::new(),
    }
  }

  /// Start a unit of work with a fresh batch id.
  pub fn begin(&self) -> UnitOfWork<S> { self.begin_with_batch_id(Uuid::new_v4()) }

  /// Start a unit of work under a caller-chosen batch id, e.g. a request id
  /// propagated from upstream.
  pub fn begin_with_batch_id(&self, batch_id: Uuid) -> UnitOfWork<S> {
    UnitOfWork {
      batch:   Batch::new(batch_id, self.state.clone()),
      store:   self.store.clone(),
      flushes: self.flushes.clone(),
    }
  }

  pub fn is_recording(&self) -> bool { self.state.is_recording() }

  pub fn start_recording(&self) { self.state.set_recording(true) }

  pub fn stop_recording(&self) { self.state.set_recording(false) }

  /// Register a hook that adds tags to every entry recorded from now on.
  pub fn tag_using<F>(&self, tagger: F)
  where
    F: Fn(EntryType, &IncomingEntry) -> Vec<String> + Send + Sync + 'static,
  {
    self.state.add_tagger(Arc::new(tagger) as Tagger);
  }

  /// Stop recording and wait for background flushes of abandoned units of
  /// work to complete.
  pub async fn shutdown(&self) {
    self.stop_recording();
    self.flushes.close();
    self.flushes.wait().await;
    tracing::debug!("recorder shut down");
  }
}

// ─── UnitOfWork ──────────────────────────────────────────────────────────────

/// One unit of work (a request, a console command) and its batch.
///
/// Dereferences to [`Batch`], so watchers record straight into it. Call
/// [`UnitOfWork::finish`] at the end of the work. If it is dropped instead,
/// for example because the work was aborted, pending entries are flushed on
/// a background task.
pub struct UnitOfWork<S>
where
  S: EntriesRepository + 'static,
{
  batch:   Batch,
  store:   Arc<S>,
  flushes: TaskTracker,
}

impl<S> UnitOfWork<S>
where
  S: EntriesRepository + 'static,
{
  pub fn batch(&self) -> &Batch { &self.batch }

  /// Flush the batch to the store. Returns how many entries were stored;
  /// storage failures are logged and the entries dropped.
  pub async fn finish(self) -> usize {
    let entries = self.batch.take_entries();
    flush(&*self.store, self.batch.batch_id(), entries).await
  }
}

impl<S> Deref for UnitOfWork<S>
where
  S: EntriesRepository + 'static,
{
  type Target = Batch;

  fn deref(&self) -> &Batch { &self.batch }
}

impl<S> Drop for UnitOfWork<S>
where
  S: EntriesRepository + 'static,
{
  fn drop(&mut self) {
    let entries = self.batch.take_entries();
    if entries.is_empty() {
      return;
    }

    let batch_id = self.batch.batch_id();
    match tokio::runtime::Handle::try_current() {
      Ok(handle) => {
        let store = self.store.clone();
        self.flushes.spawn_on(
          async move {
            flush(&*store, batch_id, entries).await;
          },
          &handle,
        );
      }
      Err(_) => {
        tracing::warn!(
          %batch_id,
          count = entries.len(),
          "unit of work dropped outside a runtime; discarding entries"
        );
      }
    }
  }
}

async fn flush<S: EntriesRepository>(
  store: &S,
  batch_id: Uuid,
  entries: Vec<NewEntry>,
) -> usize {
  if entries.is_empty() {
    return 0;
  }

  let count = entries.len();
  match store.store(entries).await {
    Ok(ids) => {
      tracing::debug!(%batch_id, count, "flushed batch");
      ids.len()
    }
    Err(e) => {
      tracing::error!(%batch_id, count, error = %e, "failed to store batch; dropping it");
      0
    }
  }
}
