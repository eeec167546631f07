//! SQL DDL for initializing the database schema.

/// SQLite schema includes:
/// - `chain_users` (one membership per (user_id, chain), with the cached auth handle)
/// - `recurring_bookings` (standing booking requests)
/// - `sessions` (reconciled session view, one row per (chain, class_id, user_id))
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Chain memberships
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chain_users (
    user_id INTEGER NOT NULL,
    chain TEXT NOT NULL,
    username TEXT NOT NULL,
    password TEXT NOT NULL,
    auth_handle TEXT NULL, -- JSON
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL, -- RFC3339
    UNIQUE(user_id, chain)
);

-- ---------------------------------------------------------------------------
-- Recurring booking configs
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS recurring_bookings (
    id INTEGER PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL,
    chain TEXT NOT NULL,
    activity_id TEXT NOT NULL,
    weekday INTEGER NOT NULL,
    hour INTEGER NOT NULL,
    minute INTEGER NOT NULL,
    location_id INTEGER NOT NULL,
    display_name TEXT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_recurring_bookings_user_chain ON recurring_bookings(user_id, chain);

-- ---------------------------------------------------------------------------
-- Sessions
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    chain TEXT NOT NULL,
    class_id TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    status TEXT NOT NULL,
    starts_at TEXT NOT NULL, -- RFC3339, UTC
    class_data TEXT NOT NULL, -- JSON
    updated_at TEXT NOT NULL, -- RFC3339
    reminded_at TEXT NULL, -- RFC3339
    UNIQUE(chain, class_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_sessions_starts_at ON sessions(starts_at);
"#;
