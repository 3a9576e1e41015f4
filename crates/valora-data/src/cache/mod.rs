//! Caching layer for provider responses.

pub mod sqlite;

pub use sqlite::{CacheStats, CachedResponse, SqliteCache};

/// Status codes whose responses are stored.
pub const CACHEABLE_STATUSES: [u16; 6] = [200, 203, 300, 301, 404, 429];

/// Default time-to-live for cached responses, in hours.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// How a session interacts with the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve fresh entries from the cache and store new responses.
    #[default]
    Use,
    /// Skip cached entries but still store new responses.
    Refresh,
    /// Neither read from nor write to the cache.
    Bypass,
}

impl CacheMode {
    /// Whether cached entries may be served.
    pub const fn reads(&self) -> bool {
        matches!(self, Self::Use)
    }

    /// Whether fresh responses are stored.
    pub const fn writes(&self) -> bool {
        !matches!(self, Self::Bypass)
    }
}

/// Whether a response with this status is worth storing.
pub fn is_cacheable_status(status: u16) -> bool {
    CACHEABLE_STATUSES.contains(&status)
}

/// Build the cache key for a request: `METHOD url` with the `crumb`
/// query parameter removed, so keys survive crumb rotation.
pub fn cache_key(method: &str, url: &str) -> String {
    let stripped = match url.split_once('?') {
        Some((base, query)) => {
            let kept: Vec<&str> = query
                .split('&')
                .filter(|pair| !pair.is_empty() && !pair.starts_with("crumb="))
                .collect();
            if kept.is_empty() {
                base.to_string()
            } else {
                format!("{}?{}", base, kept.join("&"))
            }
        }
        None => url.to_string(),
    };
    format!("{} {}", method.to_uppercase(), stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(200, true)]
    #[case(203, true)]
    #[case(301, true)]
    #[case(404, true)]
    #[case(429, true)]
    #[case(401, false)]
    #[case(500, false)]
    #[case(302, false)]
    fn test_cacheable_statuses(#[case] status: u16, #[case] expected: bool) {
        assert_eq!(is_cacheable_status(status), expected);
    }

    #[rstest]
    #[case(
        "https://x.test/v10/q/KO?modules=price&crumb=abc",
        "GET https://x.test/v10/q/KO?modules=price"
    )]
    #[case(
        "https://x.test/v10/q/KO?crumb=abc&modules=price",
        "GET https://x.test/v10/q/KO?modules=price"
    )]
    #[case("https://x.test/v10/q/KO?crumb=abc", "GET https://x.test/v10/q/KO")]
    #[case("https://x.test/chart/KO", "GET https://x.test/chart/KO")]
    fn test_cache_key_strips_crumb(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(cache_key("get", url), expected);
    }

    #[test]
    fn test_cache_mode_flags() {
        assert!(CacheMode::Use.reads() && CacheMode::Use.writes());
        assert!(!CacheMode::Refresh.reads() && CacheMode::Refresh.writes());
        assert!(!CacheMode::Bypass.reads() && !CacheMode::Bypass.writes());
    }
}
