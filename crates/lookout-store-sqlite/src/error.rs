//! Error type for `lookout-store-sqlite`.

use lookout_core::{entry::EntryId, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] lookout_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("entry not found: {0}")]
  EntryNotFound(EntryId),
}

impl StoreError for Error {
  fn is_not_found(&self) -> bool {
    matches!(self, Error::EntryNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
