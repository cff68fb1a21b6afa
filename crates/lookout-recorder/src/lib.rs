//! Capture side of Lookout: watchers turn framework events into entries and
//! the recorder buffers them per unit of work before handing them to an
//! [`EntriesRepository`](lookout_core::store::EntriesRepository).
//!
//! # Wiring
//!
//! ```rust,ignore
//! let recorder = Recorder::new(Arc::new(store), &RecorderConfig::default());
//!
//! let mut events = Dispatcher::new();
//! CommandWatcher::new(console.clone()).register(&mut events);
//!
//! // One unit of work, e.g. one console invocation:
//! let work = recorder.begin();
//! events.dispatch(&finished, &work);
//! work.finish().await;
//! ```

pub mod batch;
pub mod config;
pub mod events;
pub mod recorder;
pub mod watcher;
pub mod watchers;

pub use batch::Batch;
pub use config::RecorderConfig;
pub use events::Dispatcher;
pub use recorder::{Recorder, UnitOfWork};
pub use watcher::Watcher;

#[cfg(test)]
mod tests;
