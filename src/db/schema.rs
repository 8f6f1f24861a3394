//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `master` table (fetch-tracking queue, one row per (type, tms))
/// - `export` table (geolocated event facts, one row per event id)
/// - `mentions` table (per-event actor mentions, unique per (event, tms, name))
pub const SQLITE_INIT: &str = r"
-- ---------------------------------------------------------------------------
-- Master queue: discovered-but-not-yet-fetched resources
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS master (
    type TEXT NOT NULL,
    tms INTEGER NOT NULL,
    url TEXT NOT NULL,
    fetched INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (type, tms)
);

CREATE INDEX IF NOT EXISTS idx_master_type_tms_fetched ON master(type, tms, fetched);

-- ---------------------------------------------------------------------------
-- Export: canonical event facts (id assigned by the source feed)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS export (
    id INTEGER PRIMARY KEY NOT NULL,
    actor_name TEXT NULL,
    event_code TEXT NULL,
    lat REAL NULL,
    long REAL NULL,
    goldstein INTEGER NOT NULL,
    num_mentions INTEGER NOT NULL,
    tms INTEGER NOT NULL,
    source_url TEXT NOT NULL
);

-- ---------------------------------------------------------------------------
-- Mentions: actor mentions tied to an event (advisory reference, no FK)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS mentions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event INTEGER NOT NULL,
    tms INTEGER NOT NULL,
    name TEXT NOT NULL,
    confidence INTEGER NOT NULL,
    tone REAL NOT NULL,
    UNIQUE (event, tms, name)
);

CREATE INDEX IF NOT EXISTS idx_mentions_tms ON mentions(tms);
CREATE INDEX IF NOT EXISTS idx_mentions_tms_name ON mentions(tms, name);
";
