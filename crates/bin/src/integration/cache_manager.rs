//! Location and lifecycle of the HTTP response cache.
//!
//! The cache is a single SQLite file under the platform cache directory,
//! overridable from the command line or `VALORA_CACHE_PATH`.

use chrono::Duration;
use std::path::{Path, PathBuf};
use valora_data::{CacheStats, DataError, SqliteCache};

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/valora/`
/// - macOS: `~/Library/Caches/valora/`
/// - Windows: `%LOCALAPPDATA%\valora\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("valora")
}

/// Get the default cache database path.
pub(crate) fn default_cache_path() -> PathBuf {
    default_cache_dir().join("http_cache.db")
}

/// The configured cache path, or the default one.
pub(crate) fn get_cache_path(configured: Option<&Path>) -> PathBuf {
    configured.map_or_else(default_cache_path, Path::to_path_buf)
}

/// Open the cache at `path`, creating the directory if needed.
pub(crate) fn open_cache(path: &Path, ttl_hours: i64) -> Result<SqliteCache, DataError> {
    if ttl_hours <= 0 {
        return Err(DataError::Cache(format!(
            "cache TTL must be a positive number of hours, got {}",
            ttl_hours
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    SqliteCache::new(path, Duration::hours(ttl_hours))
}

/// Print where the cache lives.
pub(crate) fn print_cache_info(path: &Path) {
    println!("  Cache location: {}", path.display());
}

/// Print cache statistics.
pub(crate) fn print_cache_stats(path: &Path, stats: &CacheStats) {
    print_cache_info(path);
    println!("  Entries:        {}", stats.total_entries);
    println!("  Fresh:          {}", stats.fresh_entries());
    println!("  Expired:        {}", stats.expired_entries);
    println!("  Size:           {:.1} KiB", stats.size_bytes as f64 / 1024.0);
}
