use chrono::Utc;
use rusqlite::{params, Connection, Result};
use std::path::Path;

use crate::error::GatewayError;
use crate::models::ProgressState;
use crate::session::ProgressGateway;

/// Storage key of the progress blob.
pub const STATE_KEY: &str = "hanon_app_state";

/// Generation of the data-source cache. Rows from any other generation are
/// dropped by `init`.
pub const CACHE_VERSION: i64 = 2;

pub struct Database {
    conn: Connection,
}

#[derive(Debug, Clone)]
pub struct CachedSource {
    pub body: String,
    pub fetched_at: String,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Last successful fetch of each data source, for offline use
            CREATE TABLE IF NOT EXISTS source_cache (
                location TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                body TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );
            "#,
        )?;

        self.migrate()?;

        Ok(())
    }

    // Drop cached data written by older cache generations
    fn migrate(&self) -> Result<()> {
        let removed = self.conn.execute(
            "DELETE FROM source_cache WHERE version != ?1",
            params![CACHE_VERSION],
        )?;
        if removed > 0 {
            log::info!("Removed {} stale cache entries", removed);
        }
        Ok(())
    }

    // Raw key/value access
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = self.conn.query_row(
            "SELECT value FROM kv_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );

        match value {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv_state (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn delete_value(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM kv_state WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    pub fn clear_progress(&self) -> Result<bool> {
        self.delete_value(STATE_KEY)
    }

    // Data source cache
    pub fn cache_source(&self, location: &str, body: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO source_cache (location, version, body, fetched_at) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(location) DO UPDATE SET
                version = excluded.version,
                body = excluded.body,
                fetched_at = excluded.fetched_at
            "#,
            params![location, CACHE_VERSION, body, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn cached_source(&self, location: &str) -> Result<Option<CachedSource>> {
        let cached = self.conn.query_row(
            "SELECT body, fetched_at FROM source_cache WHERE location = ?1 AND version = ?2",
            params![location, CACHE_VERSION],
            |row| {
                Ok(CachedSource {
                    body: row.get(0)?,
                    fetched_at: row.get(1)?,
                })
            },
        );

        match cached {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl ProgressGateway for Database {
    fn load_progress(&self) -> std::result::Result<ProgressState, GatewayError> {
        Ok(self
            .get_value(STATE_KEY)?
            .map(|blob| ProgressState::decode(&blob))
            .unwrap_or_default())
    }

    fn save_progress(&self, state: &ProgressState) -> std::result::Result<(), GatewayError> {
        let blob = state.encode()?;
        self.set_value(STATE_KEY, &blob)?;
        Ok(())
    }
}
