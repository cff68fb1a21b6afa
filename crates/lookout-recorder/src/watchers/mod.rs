//! Concrete watchers.

pub mod command;

pub use command::{CommandFinished, CommandInput, CommandWatcher, ConsoleOutput};
