//! A small in-process event bus keyed by event type.
//!
//! The host framework dispatches each event together with the batch of the
//! unit of work it happened in; listeners never reach for global state.

use std::{
  any::{Any, TypeId},
  collections::HashMap,
};

use crate::batch::Batch;

type Listener = Box<dyn Fn(&dyn Any, &Batch) + Send + Sync>;

#[derive(Default)]
pub struct Dispatcher {
  listeners: HashMap<TypeId, Vec<Listener>>,
}

impl Dispatcher {
  pub fn new() -> Self { Self::default() }

  /// Subscribe `listener` to every future event of type `E`.
  pub fn listen<E, F>(&mut self, listener: F)
  where
    E: Any,
    F: Fn(&E, &Batch) + Send + Sync + 'static,
  {
    self
      .listeners
      .entry(TypeId::of::<E>())
      .or_default()
      .push(Box::new(move |event: &dyn Any, batch: &Batch| {
        if let Some(event) = event.downcast_ref::<E>() {
          listener(event, batch);
        }
      }));
  }

  pub fn has_listeners<E: Any>(&self) -> bool {
    self.listeners.contains_key(&TypeId::of::<E>())
  }

  /// Invoke every listener registered for `E`, in registration order.
  /// Returns the number of listeners invoked.
  pub fn dispatch<E: Any>(&self, event: &E, batch: &Batch) -> usize {
    let Some(listeners) = self.listeners.get(&TypeId::of::<E>()) else {
      return 0;
    };

    tracing::trace!(
      event = std::any::type_name::<E>(),
      listeners = listeners.len(),
      "dispatching event"
    );
    for listener in listeners {
      listener(event, batch);
    }
    listeners.len()
  }
}

impl std::fmt::Debug for Dispatcher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Dispatcher")
      .field("event_types", &self.listeners.len())
      .finish()
  }
}
