//! Error types for `lookout-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown entry type: {0:?}")]
  UnknownEntryType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
