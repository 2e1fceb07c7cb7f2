//! SQL schema for the drawlot SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.
//!
//! There are deliberately no cross-table FOREIGN KEY constraints: a
//! candidate must remain deletable while project member lists and photos
//! still reference it, and history rows must survive the deletion of the
//! project and candidate they denormalize.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    project_id    TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    user_id       TEXT NOT NULL,
    candidate_ids TEXT NOT NULL DEFAULT '',   -- JSON array of member UUIDs
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS candidates (
    candidate_id TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    photo_url    TEXT,
    user_id      TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS candidate_photos (
    photo_id     TEXT PRIMARY KEY,
    candidate_id TEXT NOT NULL,
    photo_url    TEXT NOT NULL,
    is_avatar    INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL
);

-- Draw audit trail. project_name and candidate_name are snapshots taken at
-- draw time; no row here joins back to a live entity.
CREATE TABLE IF NOT EXISTS history (
    history_id     TEXT PRIMARY KEY,
    project_id     TEXT NOT NULL,
    project_name   TEXT NOT NULL,
    candidate_id   TEXT NOT NULL,
    candidate_name TEXT NOT NULL,
    selected_at    TEXT NOT NULL,
    user_id        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS projects_user_idx         ON projects(user_id);
CREATE INDEX IF NOT EXISTS candidates_user_idx       ON candidates(user_id);
CREATE INDEX IF NOT EXISTS candidate_photos_cand_idx ON candidate_photos(candidate_id);
CREATE INDEX IF NOT EXISTS history_user_idx          ON history(user_id);
CREATE INDEX IF NOT EXISTS history_project_idx       ON history(project_id);

PRAGMA user_version = 1;
";
