//! Encoding and decoding helpers between Lookout domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, batch ids are hyphenated lowercase
//! UUIDs, and entry content is compact JSON.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use lookout_core::entry::{Entry, EntryContent, EntryId, NewEntry};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Content ─────────────────────────────────────────────────────────────────

pub fn encode_content(content: &EntryContent) -> Result<String> {
  Ok(serde_json::to_string(content)?)
}

/// Decode stored content. Text that is not valid JSON is handed back as a
/// JSON string so one corrupt row cannot fail a whole listing.
pub fn decode_content(id: EntryId, s: String) -> serde_json::Value {
  match serde_json::from_str(&s) {
    Ok(value) => value,
    Err(e) => {
      tracing::warn!(entry_id = id, error = %e, "entry content is not valid json");
      serde_json::Value::String(s)
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column values for one `entries` insert plus its tag rows.
pub struct RawNewEntry {
  pub batch_id:   String,
  pub entry_type: &'static str,
  pub content:    String,
  pub created_at: String,
  pub tags:       Vec<String>,
}

impl RawNewEntry {
  pub fn encode(entry: &NewEntry) -> Result<Self> {
    Ok(Self {
      batch_id:   encode_uuid(entry.batch_id),
      entry_type: entry.entry_type.as_str(),
      content:    encode_content(&entry.content)?,
      created_at: encode_dt(entry.created_at),
      tags:       entry.tags.iter().cloned().collect(),
    })
  }
}

/// Raw strings read directly from an `entries` row, with its tags.
pub struct RawEntry {
  pub id:         EntryId,
  pub batch_id:   String,
  pub entry_type: String,
  pub content:    String,
  pub created_at: String,
  pub tags:       Vec<String>,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      batch_id:   row.get(1)?,
      entry_type: row.get(2)?,
      content:    row.get(3)?,
      created_at: row.get(4)?,
      tags:       Vec::new(),
    })
  }

  pub fn into_entry(self) -> Result<Entry> {
    Ok(Entry {
      id:         self.id,
      batch_id:   decode_uuid(&self.batch_id)?,
      entry_type: self.entry_type.parse()?,
      content:    decode_content(self.id, self.content),
      tags:       self.tags.into_iter().collect::<BTreeSet<_>>(),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn corrupt_content_surfaces_raw_text() {
    let value = decode_content(7, "{not json".to_string());
    assert_eq!(value, json!("{not json"));
  }

  #[test]
  fn content_preserves_value_types() {
    let mut content = EntryContent::new();
    content.insert("n".into(), json!(1.5));
    content.insert("b".into(), json!(false));
    content.insert("nested".into(), json!({ "list": [1, "two", null] }));

    let text = encode_content(&content).unwrap();
    assert_eq!(decode_content(1, text), serde_json::Value::Object(content));
  }

  #[test]
  fn bad_date_is_an_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
