//! Console command watcher: one `command` entry per finished command.

use std::sync::{Arc, Mutex, PoisonError};

use lookout_core::entry::{EntryContent, IncomingEntry};
use serde_json::Value;

use crate::{batch::Batch, watcher::Watcher};

/// Output accumulated by the console kernel while commands run.
///
/// The kernel writes into one clone, the watcher reads from another.
#[derive(Debug, Clone, Default)]
pub struct ConsoleOutput(Arc<Mutex<String>>);

impl ConsoleOutput {
  pub fn new() -> Self { Self::default() }

  pub fn write(&self, text: &str) { self.lock().push_str(text) }

  pub fn contents(&self) -> String { self.lock().clone() }

  pub fn clear(&self) { self.lock().clear() }

  fn lock(&self) -> std::sync::MutexGuard<'_, String> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Parsed console input.
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  pub arguments: EntryContent,
  pub options:   EntryContent,
}

/// Fired by the console kernel after a command returns.
#[derive(Debug, Clone)]
pub struct CommandFinished {
  pub command:   String,
  pub exit_code: i32,
  pub input:     CommandInput,
}

pub struct CommandWatcher {
  output: ConsoleOutput,
}

impl CommandWatcher {
  pub fn new(output: ConsoleOutput) -> Self { Self { output } }
}

impl Watcher for CommandWatcher {
  type Event = CommandFinished;

  fn transform(&self, event: &CommandFinished) -> IncomingEntry {
    let mut content = EntryContent::new();
    content.insert("command".into(), Value::String(event.command.clone()));
    content.insert("exit_code".into(), Value::from(event.exit_code));
    content.insert(
      "arguments".into(),
      Value::Object(event.input.arguments.clone()),
    );
    content.insert("options".into(), Value::Object(event.input.options.clone()));
    content.insert("output".into(), Value::String(self.output.contents()));
    IncomingEntry::make(content)
  }

  fn record(&self, batch: &Batch, entry: IncomingEntry) { batch.record_command(entry) }
}
