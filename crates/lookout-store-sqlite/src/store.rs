//! [`SqliteStore`] — the SQLite implementation of [`EntriesRepository`].

use std::{collections::HashMap, path::Path};

use lookout_core::{
  entry::{Entry, EntryId, EntryType, NewEntry},
  store::{EntriesRepository, EntryQuery},
};
use rusqlite::{OptionalExtension as _, types::Value};

use crate::{
  encode::{RawEntry, RawNewEntry, encode_uuid},
  schema::SCHEMA,
  Error, Result,
};

const ENTRY_COLUMNS: &str = "id, batch_id, type, content, created_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lookout entries store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All clones
/// share one connection thread, so statements from concurrent callers are
/// serialised and `AUTOINCREMENT` ids never collide.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Query helpers ───────────────────────────────────────────────────────────

/// An id set bound as one JSON array parameter, read back with `json_each`,
/// so the number of ids is not capped by SQLite's bind variable limit.
fn id_set(ids: impl Iterator<Item = EntryId>) -> rusqlite::Result<String> {
  serde_json::to_string(&ids.collect::<Vec<_>>())
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// `take` as a SQL `LIMIT`. Values past `i64::MAX` saturate instead of
/// wrapping to a negative (unlimited) limit.
pub(crate) fn sql_limit(take: usize) -> i64 { i64::try_from(take).unwrap_or(i64::MAX) }

/// Entry ids carrying `tag`, read from the tag index.
fn ids_for_tag(
  conn: &rusqlite::Connection,
  tag: &str,
) -> rusqlite::Result<Vec<EntryId>> {
  let mut stmt =
    conn.prepare_cached("SELECT entry_id FROM entries_tags WHERE tag = ?1")?;
  let ids = stmt
    .query_map([tag], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(ids)
}

/// Fill in the tags of already-fetched rows with a single query.
fn attach_tags(
  conn: &rusqlite::Connection,
  rows: &mut [RawEntry],
) -> rusqlite::Result<()> {
  if rows.is_empty() {
    return Ok(());
  }

  let ids = id_set(rows.iter().map(|r| r.id))?;
  let mut stmt = conn.prepare_cached(
    "SELECT entry_id, tag FROM entries_tags
     WHERE entry_id IN (SELECT value FROM json_each(?1))",
  )?;
  let pairs = stmt
    .query_map([ids], |row| {
      Ok((row.get::<_, EntryId>(0)?, row.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let index: HashMap<EntryId, usize> =
    rows.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
  for (entry_id, tag) in pairs {
    if let Some(&i) = index.get(&entry_id) {
      rows[i].tags.push(tag);
    }
  }
  Ok(())
}

// ─── EntriesRepository impl ──────────────────────────────────────────────────

impl EntriesRepository for SqliteStore {
  type Error = Error;

  async fn find(&self, id: EntryId) -> Result<Entry> {
    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
            [id],
            RawEntry::from_row,
          )
          .optional()?;

        let Some(raw) = raw else { return Ok(None) };
        let mut rows = [raw];
        attach_tags(conn, &mut rows)?;
        let [raw] = rows;
        Ok(Some(raw))
      })
      .await?;

    raw.ok_or(Error::EntryNotFound(id))?.into_entry()
  }

  async fn get(
    &self,
    entry_type: Option<EntryType>,
    query: &EntryQuery,
  ) -> Result<Vec<Entry>> {
    let type_str = entry_type.map(EntryType::as_str);
    let before   = query.before;
    let tag      = query.tag_filter().map(str::to_owned);
    let batch_id = query.batch_id.map(encode_uuid);
    let limit    = sql_limit(query.limit());

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        // Each present option contributes one condition and its parameters.
        let mut conds: Vec<String> = vec![];
        let mut params: Vec<Value> = vec![];

        if let Some(t) = type_str {
          conds.push("type = ?".into());
          params.push(Value::Text(t.to_owned()));
        }
        if let Some(before) = before {
          conds.push("id < ?".into());
          params.push(Value::Integer(before));
        }
        if let Some(tag) = tag {
          // Resolve the tag index first, then filter by id; no join.
          let ids = ids_for_tag(conn, &tag)?;
          if ids.is_empty() {
            return Ok(vec![]);
          }
          conds.push("id IN (SELECT value FROM json_each(?))".into());
          params.push(Value::Text(id_set(ids.into_iter())?));
        }
        if let Some(batch_id) = batch_id {
          conds.push("batch_id = ?".into());
          params.push(Value::Text(batch_id));
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };
        params.push(Value::Integer(limit));

        let sql = format!(
          "SELECT {ENTRY_COLUMNS} FROM entries
           {where_clause}
           ORDER BY id DESC
           LIMIT ?"
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        attach_tags(conn, &mut rows)?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(
      entry_type = type_str,
      returned = raws.len(),
      "listed entries"
    );

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn store(&self, entries: Vec<NewEntry>) -> Result<Vec<EntryId>> {
    if entries.is_empty() {
      return Ok(vec![]);
    }

    let rows = entries
      .iter()
      .map(RawNewEntry::encode)
      .collect::<Result<Vec<_>>>()?;

    let ids: Vec<EntryId> = self
      .conn
      .call(move |conn| {
        let mut ids = Vec::with_capacity(rows.len());

        // One entry at a time: the row, then its tags under the new id.
        for row in rows {
          conn.execute(
            "INSERT INTO entries (batch_id, type, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
              row.batch_id,
              row.entry_type,
              row.content,
              row.created_at,
            ],
          )?;
          let entry_id = conn.last_insert_rowid();

          if !row.tags.is_empty() {
            let mut stmt = conn.prepare_cached(
              "INSERT INTO entries_tags (entry_id, tag) VALUES (?1, ?2)",
            )?;
            for tag in &row.tags {
              stmt.execute(rusqlite::params![entry_id, tag])?;
            }
          }

          ids.push(entry_id);
        }

        Ok(ids)
      })
      .await?;

    tracing::debug!(count = ids.len(), "stored entries");
    Ok(ids)
  }
}
