//! SQLite-backed response cache
//!
//! Successful responses are stored keyed by the requested URL so repeated
//! runs against the same pages never touch the origin. The crawl engine
//! behaves identically whether a body comes from here or the network.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// SQL schema for the cache database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    url TEXT PRIMARY KEY,
    final_url TEXT NOT NULL,
    status_code INTEGER NOT NULL,
    body TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);
"#;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cache connection lock poisoned")]
    Poisoned,
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// A cached response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub final_url: String,
    pub status_code: u16,
    pub body: String,
    /// RFC 3339 timestamp of when the response was stored
    pub fetched_at: String,
}

/// Response cache backed by a single SQLite connection
pub struct ResponseCache {
    conn: Mutex<Connection>,
}

impl ResponseCache {
    /// Opens (creating if needed) the cache database at `path`
    pub fn open(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        Self::with_connection(conn)
    }

    /// Creates an in-memory cache (for testing)
    pub fn open_in_memory() -> CacheResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> CacheResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Looks up a cached response by requested URL
    pub fn get(&self, url: &str) -> CacheResult<Option<CachedResponse>> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let cached = conn
            .query_row(
                "SELECT final_url, status_code, body, fetched_at FROM responses WHERE url = ?1",
                params![url],
                |row| {
                    Ok(CachedResponse {
                        final_url: row.get(0)?,
                        status_code: row.get(1)?,
                        body: row.get(2)?,
                        fetched_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(cached)
    }

    /// Returns true if a response for `url` is stored
    pub fn contains(&self, url: &str) -> CacheResult<bool> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM responses WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Stores (or replaces) the response for `url`
    pub fn put(&self, url: &str, final_url: &str, status_code: u16, body: &str) -> CacheResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO responses (url, final_url, status_code, body, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![url, final_url, status_code, body, now],
        )?;
        Ok(())
    }

    /// Number of stored responses
    pub fn len(&self) -> CacheResult<u64> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Removes every stored response; returns how many were dropped
    pub fn clear(&self) -> CacheResult<u64> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let removed = conn.execute("DELETE FROM responses", [])?;
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://livingwage.mit.edu/counties/48001";

    #[test]
    fn test_put_then_get() {
        let cache = ResponseCache::open_in_memory().unwrap();
        cache.put(URL, URL, 200, "<html></html>").unwrap();

        let cached = cache.get(URL).unwrap().unwrap();
        assert_eq!(cached.final_url, URL);
        assert_eq!(cached.status_code, 200);
        assert_eq!(cached.body, "<html></html>");
        assert!(!cached.fetched_at.is_empty());
    }

    #[test]
    fn test_miss() {
        let cache = ResponseCache::open_in_memory().unwrap();
        assert!(cache.get(URL).unwrap().is_none());
        assert!(!cache.contains(URL).unwrap());
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn test_put_replaces() {
        let cache = ResponseCache::open_in_memory().unwrap();
        cache.put(URL, URL, 200, "old").unwrap();
        cache.put(URL, URL, 200, "new").unwrap();

        assert_eq!(cache.len().unwrap(), 1);
        assert_eq!(cache.get(URL).unwrap().unwrap().body, "new");
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::open_in_memory().unwrap();
        cache.put(URL, URL, 200, "body").unwrap();
        cache.put("http://livingwage.mit.edu/metros/10180", URL, 200, "body").unwrap();

        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.len().unwrap(), 0);
        assert!(!cache.contains(URL).unwrap());
    }

    #[test]
    fn test_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("httpcache.db");

        {
            let cache = ResponseCache::open(&path).unwrap();
            cache.put(URL, URL, 200, "persisted").unwrap();
        }

        let reopened = ResponseCache::open(&path).unwrap();
        assert!(reopened.contains(URL).unwrap());
        assert_eq!(reopened.get(URL).unwrap().unwrap().body, "persisted");
    }
}
