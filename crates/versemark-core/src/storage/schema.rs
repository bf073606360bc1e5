//! SQLite schema for bookmarks, labels and their associations
//!
//! Foreign keys are enforced but never cascade: the stores remove
//! associations explicitly in the same transaction as the entity they
//! reference.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Bookmarks, anchored to canonical ordinal ranges
        CREATE TABLE IF NOT EXISTS bookmark (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kjv_ordinal_start INTEGER NOT NULL,
            kjv_ordinal_end INTEGER NOT NULL,
            ordinal_start INTEGER NOT NULL,
            ordinal_end INTEGER NOT NULL,
            versification TEXT NOT NULL,
            notes TEXT,
            created_at INTEGER NOT NULL,
            CHECK (kjv_ordinal_start <= kjv_ordinal_end)
        );

        -- Labels
        CREATE TABLE IF NOT EXISTS label (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            bookmark_style TEXT
        );

        -- Bookmark-label junction table (many-to-many)
        CREATE TABLE IF NOT EXISTS bookmark_to_label (
            bookmark_id INTEGER NOT NULL,
            label_id INTEGER NOT NULL,
            PRIMARY KEY (bookmark_id, label_id),
            FOREIGN KEY (bookmark_id) REFERENCES bookmark(id),
            FOREIGN KEY (label_id) REFERENCES label(id)
        );

        -- Range and point queries
        CREATE INDEX IF NOT EXISTS idx_bookmark_kjv_start ON bookmark(kjv_ordinal_start);
        CREATE INDEX IF NOT EXISTS idx_bookmark_kjv_end ON bookmark(kjv_ordinal_end);

        -- Recency ordering
        CREATE INDEX IF NOT EXISTS idx_bookmark_created_at ON bookmark(created_at);

        -- Label joins
        CREATE INDEX IF NOT EXISTS idx_bookmark_to_label_label_id ON bookmark_to_label(label_id);

        -- At most one label per reserved style
        CREATE UNIQUE INDEX IF NOT EXISTS idx_label_reserved_style
            ON label(bookmark_style) WHERE bookmark_style = 'SPEAK';
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}
