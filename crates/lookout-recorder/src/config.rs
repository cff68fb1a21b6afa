//! Recorder configuration.

use serde::Deserialize;

/// Settings for a [`crate::Recorder`], usually a `[recorder]` table in the
/// host application's config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RecorderConfig {
  /// Whether entries are recorded from startup. Recording can still be
  /// toggled at runtime.
  #[serde(default = "default_enabled")]
  pub enabled: bool,
}

fn default_enabled() -> bool { true }

impl Default for RecorderConfig {
  fn default() -> Self { Self { enabled: default_enabled() } }
}
