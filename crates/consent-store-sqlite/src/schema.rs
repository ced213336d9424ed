//! SQL schema for the consent SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- People are created once and never updated.
CREATE TABLE IF NOT EXISTS people (
    person_id   TEXT PRIMARY KEY,
    account_id  TEXT,
    browser_id  TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    category_id     TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    mandatory       INTEGER NOT NULL DEFAULT 0,
    default_value   INTEGER NOT NULL DEFAULT 0,
    additional_info TEXT,
    position        INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS cookies (
    cookie_id   TEXT PRIMARY KEY,
    category_id TEXT NOT NULL REFERENCES categories(category_id),
    name        TEXT NOT NULL,
    description TEXT
);

-- Decisions are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS decisions (
    decision_id     TEXT PRIMARY KEY,
    person_id       TEXT NOT NULL REFERENCES people(person_id),
    category_id     TEXT NOT NULL REFERENCES categories(category_id),
    status          TEXT,            -- 'agreed' | 'declined' | NULL
    capture_source  TEXT,
    capture_channel TEXT,
    recorded_at     TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS people_browser_idx    ON people(browser_id);
CREATE INDEX IF NOT EXISTS people_account_idx    ON people(account_id);
CREATE INDEX IF NOT EXISTS cookies_category_idx  ON cookies(category_id);
CREATE INDEX IF NOT EXISTS decisions_person_idx  ON decisions(person_id);

PRAGMA user_version = 1;
";
