//! SQLite caching layer for HTTP responses.

use super::is_cacheable_status;
use crate::error::{DataError, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// SQLite cache for provider responses.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
    ttl: Duration,
}

/// A response served from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// When the response was stored
    pub cached_at: DateTime<Utc>,
}

impl SqliteCache {
    /// Create a new SQLite cache, creating parent directories as needed.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    /// * `ttl` - How long a stored response stays fresh
    pub fn new<P: AsRef<Path>>(path: P, ttl: Duration) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let cache = Self { conn, ttl };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory(ttl: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn, ttl };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Configured time-to-live.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS http_responses (
                key TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                body TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_http_responses_expires ON http_responses(expires_at)",
            [],
        )?;

        Ok(())
    }

    /// Look up a fresh response by cache key.
    pub fn get(&self, key: &str) -> Result<Option<CachedResponse>> {
        self.get_at(key, Utc::now())
    }

    /// Look up a response that is still fresh at `now`.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CachedResponse>> {
        let row = self
            .conn
            .query_row(
                "SELECT status, body, cached_at FROM http_responses
                 WHERE key = ?1 AND expires_at > ?2",
                params![key, now.timestamp()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((status, body, cached_at)) = row else {
            return Ok(None);
        };

        let status = u16::try_from(status)
            .map_err(|_| DataError::Cache(format!("Invalid stored status: {}", status)))?;
        let cached_at = DateTime::parse_from_rfc3339(&cached_at)
            .map_err(|e| DataError::Cache(format!("Invalid cached_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(Some(CachedResponse {
            status,
            body,
            cached_at,
        }))
    }

    /// Store a response. Returns `false` when the status is not cacheable.
    pub fn put(&self, key: &str, url: &str, status: u16, body: &str) -> Result<bool> {
        self.put_at(key, url, status, body, Utc::now())
    }

    /// Store a response as if received at `now`.
    pub fn put_at(
        &self,
        key: &str,
        url: &str,
        status: u16,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if !is_cacheable_status(status) {
            return Ok(false);
        }

        let expires_at = (now + self.ttl).timestamp();
        self.conn.execute(
            "INSERT OR REPLACE INTO http_responses (key, url, status, body, cached_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![key, url, status, body, now.to_rfc3339(), expires_at],
        )?;

        Ok(true)
    }

    /// Delete entries that have expired. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize> {
        self.purge_expired_at(Utc::now())
    }

    /// Delete entries that are expired at `now`.
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM http_responses WHERE expires_at <= ?1",
            params![now.timestamp()],
        )?;
        Ok(removed)
    }

    /// Clear all cached data. Returns the number of entries removed.
    pub fn clear_all(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM http_responses", [])?;
        Ok(removed)
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        self.get_stats_at(Utc::now())
    }

    /// Get cache statistics relative to `now`.
    pub fn get_stats_at(&self, now: DateTime<Utc>) -> Result<CacheStats> {
        let total_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM http_responses", [], |row| row.get(0))?;

        let expired_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM http_responses WHERE expires_at <= ?1",
            params![now.timestamp()],
            |row| row.get(0),
        )?;

        let page_count: i64 = self
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = self
            .conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))?;

        Ok(CacheStats {
            total_entries: total_count as usize,
            expired_entries: expired_count as usize,
            size_bytes: (page_count * page_size).max(0) as u64,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of stored responses
    pub total_entries: usize,
    /// Number of stored responses past their expiry
    pub expired_entries: usize,
    /// Database size on disk
    pub size_bytes: u64,
}

impl CacheStats {
    /// Number of entries that would still be served.
    pub const fn fresh_entries(&self) -> usize {
        self.total_entries.saturating_sub(self.expired_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_cache_initialization() {
        let cache = SqliteCache::in_memory(Duration::hours(24));
        assert!(cache.is_ok());
    }

    #[test]
    fn test_put_and_get_within_ttl() {
        let cache = SqliteCache::in_memory(Duration::hours(24)).unwrap();

        let stored = cache
            .put_at("GET https://x.test/a", "https://x.test/a", 200, "{}", at(0))
            .unwrap();
        assert!(stored);

        let hit = cache.get_at("GET https://x.test/a", at(23)).unwrap().unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(hit.body, "{}");
        assert_eq!(hit.cached_at, at(0));
    }

    #[test]
    fn test_expired_entry_is_ignored() {
        let cache = SqliteCache::in_memory(Duration::hours(1)).unwrap();
        cache
            .put_at("k", "https://x.test/a", 200, "body", at(0))
            .unwrap();

        assert!(cache.get_at("k", at(0)).unwrap().is_some());
        assert!(cache.get_at("k", at(1)).unwrap().is_none());
    }

    #[test]
    fn test_uncacheable_status_not_stored() {
        let cache = SqliteCache::in_memory(Duration::hours(24)).unwrap();
        let stored = cache
            .put_at("k", "https://x.test/a", 500, "oops", at(0))
            .unwrap();
        assert!(!stored);
        assert!(cache.get_at("k", at(0)).unwrap().is_none());
    }

    #[test]
    fn test_not_found_is_cached() {
        let cache = SqliteCache::in_memory(Duration::hours(24)).unwrap();
        cache
            .put_at("k", "https://x.test/a", 404, "not found", at(0))
            .unwrap();
        assert_eq!(cache.get_at("k", at(1)).unwrap().unwrap().status, 404);
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let cache = SqliteCache::in_memory(Duration::hours(24)).unwrap();
        cache.put_at("k", "u", 200, "old", at(0)).unwrap();
        cache.put_at("k", "u", 200, "new", at(2)).unwrap();

        let hit = cache.get_at("k", at(3)).unwrap().unwrap();
        assert_eq!(hit.body, "new");
        assert_eq!(cache.get_stats_at(at(3)).unwrap().total_entries, 1);
    }

    #[test]
    fn test_purge_and_stats() {
        let cache = SqliteCache::in_memory(Duration::hours(2)).unwrap();
        cache.put_at("a", "u", 200, "1", at(0)).unwrap();
        cache.put_at("b", "u", 200, "2", at(5)).unwrap();

        let stats = cache.get_stats_at(at(6)).unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.fresh_entries(), 1);
        assert!(stats.size_bytes > 0);

        let removed = cache.purge_expired_at(at(6)).unwrap();
        assert_eq!(removed, 1);
        assert!(cache.get_at("b", at(6)).unwrap().is_some());
    }

    #[test]
    fn test_clear_all() {
        let cache = SqliteCache::in_memory(Duration::hours(24)).unwrap();
        cache.put_at("a", "u", 200, "1", at(0)).unwrap();
        cache.put_at("b", "u", 404, "2", at(0)).unwrap();

        assert_eq!(cache.clear_all().unwrap(), 2);
        let stats = cache.get_stats_at(at(0)).unwrap();
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_on_disk_cache_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("http_cache.db");

        {
            let cache = SqliteCache::new(&path, Duration::hours(24)).unwrap();
            cache.put("k", "u", 200, "persisted").unwrap();
        }

        let reopened = SqliteCache::new(&path, Duration::hours(24)).unwrap();
        assert_eq!(reopened.get("k").unwrap().unwrap().body, "persisted");
    }
}
