//! SQL schema for the Lookout SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Entries are append-only. AUTOINCREMENT keeps ids from being reused even
-- after rows are pruned, so id order is insertion order.
CREATE TABLE IF NOT EXISTS entries (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id    TEXT NOT NULL,   -- one unit of work (request, command run)
    type        TEXT NOT NULL,   -- EntryType discriminant
    content     TEXT NOT NULL,   -- JSON object
    created_at  TEXT NOT NULL    -- ISO 8601 UTC capture time
);

-- Tag index; written only after the entry row exists.
CREATE TABLE IF NOT EXISTS entries_tags (
    entry_id  INTEGER NOT NULL REFERENCES entries(id),
    tag       TEXT NOT NULL,
    PRIMARY KEY (entry_id, tag)
);

CREATE INDEX IF NOT EXISTS entries_tags_tag_idx ON entries_tags(tag);
CREATE INDEX IF NOT EXISTS entries_batch_idx    ON entries(batch_id);
CREATE INDEX IF NOT EXISTS entries_type_idx     ON entries(type, id);

PRAGMA user_version = 1;
";
