//! The [`Watcher`] capability.

use std::any::Any;

use lookout_core::entry::IncomingEntry;

use crate::{batch::Batch, events::Dispatcher};

/// Turns one kind of framework event into entries.
///
/// Implementors supply the mapping ([`Watcher::transform`]) and the recorder
/// call for their category ([`Watcher::record`]); [`Watcher::register`]
/// wires the two to the event bus so each dispatched event yields exactly
/// one recorded entry.
pub trait Watcher: Send + Sync + 'static {
  type Event: Any;

  fn transform(&self, event: &Self::Event) -> IncomingEntry;

  /// Hand a transformed entry to the batch, e.g. `batch.record_query(entry)`.
  fn record(&self, batch: &Batch, entry: IncomingEntry);

  fn register(self, events: &mut Dispatcher)
  where
    Self: Sized,
  {
    events.listen::<Self::Event, _>(move |event, batch| {
      let entry = self.transform(event);
      self.record(batch, entry);
    });
  }
}
