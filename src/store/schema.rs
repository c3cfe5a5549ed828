//! Catalog schema and in-place migrations.

use rusqlite::{Connection, Result};

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS series (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        path TEXT NOT NULL UNIQUE,
        thumbnail_path TEXT,
        presence_image_url TEXT,
        size_bytes INTEGER DEFAULT 0,
        date_added TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS episodes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        series_id INTEGER NOT NULL,
        filename TEXT NOT NULL,
        path TEXT NOT NULL UNIQUE,
        title TEXT,
        duration REAL DEFAULT 0,
        size_bytes INTEGER DEFAULT 0,
        episode_number INTEGER,
        season_number INTEGER,
        folder_name TEXT,
        date_added TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (series_id) REFERENCES series (id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS watch_progress (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        episode_id INTEGER NOT NULL UNIQUE,
        timestamp REAL DEFAULT 0,
        last_watched TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        completed BOOLEAN DEFAULT 0,
        FOREIGN KEY (episode_id) REFERENCES episodes (id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS media_tracks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        episode_id INTEGER NOT NULL,
        stream_index INTEGER NOT NULL,
        track_type TEXT NOT NULL,
        codec TEXT,
        language TEXT,
        title TEXT,
        subtitle_ordinal INTEGER,
        UNIQUE (episode_id, stream_index),
        FOREIGN KEY (episode_id) REFERENCES episodes (id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_episodes_series ON episodes (series_id);
    CREATE INDEX IF NOT EXISTS idx_episodes_filename ON episodes (filename);
";

/// Columns added after the first release, per table.
const ADDED_COLUMNS: &[(&str, &str, &str)] = &[
    ("episodes", "folder_name", "TEXT"),
    ("episodes", "title", "TEXT"),
    ("episodes", "size_bytes", "INTEGER DEFAULT 0"),
    ("series", "presence_image_url", "TEXT"),
    ("series", "size_bytes", "INTEGER DEFAULT 0"),
    ("media_tracks", "subtitle_ordinal", "INTEGER"),
];

/// Column names of a table.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>>>()?;
    Ok(columns)
}

/// Create missing tables and add columns older databases lack.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(CREATE_TABLES)?;

    for (table, column, ddl) in ADDED_COLUMNS {
        let columns = table_columns(conn, table)?;
        if !columns.iter().any(|c| c == column) {
            tracing::info!("Migrating catalog: adding {}.{}", table, column);
            conn.execute(
                &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, ddl),
                [],
            )?;
        }
    }

    Ok(())
}
