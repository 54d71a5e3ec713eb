//! SQL schema for the Gatepass SQLite store.
//!
//! Executed once at connection startup. Column names are the storage-shape
//! keys produced by `gatepass_core::fields`; every column is text.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS visitors (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    gender        TEXT,
    contactnumber TEXT,
    idproof       TEXT,
    comingfrom    TEXT,
    purpose       TEXT,
    residentid    TEXT NOT NULL,
    societyid     TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'pending', -- 'pending' | 'approved' | 'rejected'
    entrytime     TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')), -- RFC 3339 UTC, ms
    exittime      TEXT,
    photo         TEXT,                            -- data:image/...;base64,... string
    createdby     TEXT,
    createdat     TEXT
);

CREATE INDEX IF NOT EXISTS visitors_society_idx ON visitors(societyid, entrytime);

PRAGMA user_version = 1;
";

/// Table every query reads and writes.
pub const TABLE: &str = "visitors";
