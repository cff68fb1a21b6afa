//! Handlers for `/entries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/entries` | optional `type`, `before`, `tag`, `batch_id`, `take` |
//! | `GET`  | `/entries/:id` | Single entry; 404 if missing |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use lookout_core::{
  entry::{Entry, EntryId, EntryType},
  store::{EntriesRepository, EntryQuery},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Entry type discriminant, e.g. `command`. Empty means any type.
  #[serde(rename = "type")]
  pub entry_type: Option<String>,
  /// Cursor: only entries with a smaller id.
  pub before:     Option<EntryId>,
  pub tag:        Option<String>,
  pub batch_id:   Option<Uuid>,
  pub take:       Option<usize>,
}

impl ListParams {
  fn entry_type(&self) -> Result<Option<EntryType>, ApiError> {
    match self.entry_type.as_deref() {
      None | Some("") => Ok(None),
      Some(t) => t
        .parse()
        .map(Some)
        .map_err(|e: lookout_core::Error| ApiError::BadRequest(e.to_string())),
    }
  }

  fn query(&self) -> EntryQuery {
    EntryQuery {
      before:   self.before,
      tag:      self.tag.clone(),
      batch_id: self.batch_id,
      take:     self.take,
    }
  }
}

/// `GET /entries[?type=...][&before=...][&tag=...][&batch_id=...][&take=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Entry>>, ApiError>
where
  S: EntriesRepository,
{
  let entry_type = params.entry_type()?;
  let query = params.query();

  let entries = store
    .get(entry_type, &query)
    .await
    .map_err(ApiError::from_store)?;

  Ok(Json(entries))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /entries/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<EntryId>,
) -> Result<Json<Entry>, ApiError>
where
  S: EntriesRepository,
{
  let entry = store.find(id).await.map_err(ApiError::from_store)?;
  Ok(Json(entry))
}
