//! SQL schema for the grades SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL,
    description TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_by  INTEGER,
    updated_by  INTEGER,
    created_at  TEXT    NOT NULL,   -- RFC 3339 UTC, microsecond precision
    updated_at  TEXT    NOT NULL
);

-- Names are unique among active subjects only.
CREATE UNIQUE INDEX IF NOT EXISTS subjects_active_name_idx
    ON subjects(name) WHERE is_active = 1;

CREATE TABLE IF NOT EXISTS competencies (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL,
    marks       INTEGER NOT NULL CHECK (marks BETWEEN 0 AND 10),
    subject_id  INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_by  INTEGER,
    updated_by  INTEGER,
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL,
    UNIQUE (name, subject_id)
);

CREATE INDEX IF NOT EXISTS competencies_subject_idx    ON competencies(subject_id);
CREATE INDEX IF NOT EXISTS subjects_created_by_idx     ON subjects(created_by);
CREATE INDEX IF NOT EXISTS competencies_created_by_idx ON competencies(created_by);

PRAGMA user_version = 1;
";
