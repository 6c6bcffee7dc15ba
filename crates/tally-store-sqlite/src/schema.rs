//! SQL schema for the Tally SQLite store.
//!
//! Applied every time a store is opened. The layout version is recorded in
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    is_admin      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- `votes` is a cached aggregate: always the sum of votes.direction for the
-- initiative. Only the retirement engine writes it.
CREATE TABLE IF NOT EXISTS initiatives (
    initiative_id TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    author_id     TEXT NOT NULL REFERENCES users(user_id),
    votes         INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS votes (
    user_id       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    initiative_id TEXT NOT NULL REFERENCES initiatives(initiative_id) ON DELETE CASCADE,
    direction     INTEGER NOT NULL CHECK (direction IN (1, -1)),
    created_at    TEXT NOT NULL,
    PRIMARY KEY (user_id, initiative_id)
);

-- Append-only log of initiatives removed by the vote engine.
-- The initiative row itself is gone; only its identity is remembered.
CREATE TABLE IF NOT EXISTS retirements (
    initiative_id TEXT PRIMARY KEY,
    final_count   INTEGER NOT NULL,
    retired_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS initiatives_author_idx  ON initiatives(author_id);
CREATE INDEX IF NOT EXISTS initiatives_created_idx ON initiatives(created_at);
CREATE INDEX IF NOT EXISTS votes_initiative_idx    ON votes(initiative_id);

PRAGMA user_version = 1;
";
