//! SQL schema for the Beleg SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS receipts (
    receipt_id   TEXT PRIMARY KEY,
    vendor       TEXT NOT NULL,
    invoice_date TEXT NOT NULL,    -- ISO 8601 calendar date
    total        TEXT NOT NULL,    -- decimal string; never stored as REAL
    vat          TEXT NOT NULL,    -- decimal string
    currency     TEXT NOT NULL DEFAULT 'EUR',
    status       TEXT NOT NULL DEFAULT 'pending',  -- 'pending' | 'booked'
    raw_text     TEXT,
    file_path    TEXT,
    created_at   TEXT NOT NULL,    -- ISO 8601 UTC
    updated_at   TEXT,
    created_by   TEXT
);

-- One booking per receipt. The UNIQUE constraint is the arbiter for
-- concurrent booking requests: the loser's insert fails and the store
-- resolves it by returning the winner's row.
CREATE TABLE IF NOT EXISTS bookings (
    booking_id TEXT PRIMARY KEY,
    receipt_id TEXT NOT NULL REFERENCES receipts(receipt_id) ON DELETE CASCADE,
    voucher_id TEXT NOT NULL,
    booked_at  TEXT NOT NULL,
    UNIQUE (receipt_id)
);

CREATE INDEX IF NOT EXISTS receipts_status_idx  ON receipts(status);
CREATE INDEX IF NOT EXISTS receipts_created_idx ON receipts(created_at);

PRAGMA user_version = 1;
";
