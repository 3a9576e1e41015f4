//! HTTP session for Yahoo Finance: browser headers, cookie and crumb
//! handshake, rate limiting and the on-disk response cache.

use crate::cache::{CacheMode, SqliteCache, cache_key};
use crate::error::{DataError, Result};
use reqwest::header;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};
use urlencoding::encode;

/// Desktop browser user agent sent with every request.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Cookie endpoint.
const COOKIE_URL: &str = "https://fc.yahoo.com";

/// Crumb endpoint.
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

/// Default minimum spacing between network requests.
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(200);

/// Session cookie plus the crumb that must accompany it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Credentials {
    cookie: String,
    crumb: String,
}

/// Rate limiter to space out requests to the provider
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Whether a request needs the cookie and crumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Plain request
    Anonymous,
    /// Append the crumb and send the session cookie
    Crumb,
}

/// A provider response, fresh or cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// Whether the response came from the cache
    pub from_cache: bool,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// HTTP session shared by all Yahoo requests of one run.
pub struct YahooSession {
    client: reqwest::Client,
    cache: Option<StdMutex<SqliteCache>>,
    mode: CacheMode,
    credentials: Mutex<Option<Credentials>>,
    rate_limiter: Mutex<RateLimiter>,
}

impl std::fmt::Debug for YahooSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooSession")
            .field("cached", &self.cache.is_some())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl YahooSession {
    /// Create a session with default rate limiting.
    ///
    /// # Arguments
    /// * `cache` - Response cache, or `None` to always hit the network
    /// * `mode` - How the cache is consulted
    pub fn new(cache: Option<SqliteCache>, mode: CacheMode) -> Result<Self> {
        Self::with_rate_limit(cache, mode, DEFAULT_RATE_LIMIT)
    }

    /// Create a session with a custom minimum interval between network requests.
    pub fn with_rate_limit(
        cache: Option<SqliteCache>,
        mode: CacheMode,
        min_interval: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            cache: cache.map(StdMutex::new),
            mode,
            credentials: Mutex::new(None),
            rate_limiter: Mutex::new(RateLimiter::new(min_interval)),
        })
    }

    /// Cache mode in effect.
    pub const fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Fetch `url`, consulting the cache first.
    ///
    /// Crumb-authenticated requests are keyed without the crumb, and a `401`
    /// invalidates the credentials and is retried once with fresh ones.
    pub async fn get(&self, url: &str, auth: Auth) -> Result<HttpResponse> {
        let key = cache_key("GET", url);

        if let Some(hit) = self.cached(&key)? {
            debug!(url, status = hit.status, "served from cache");
            return Ok(hit);
        }

        let (status, body) = match auth {
            Auth::Anonymous => self.send(url, None).await?,
            Auth::Crumb => self.send_with_crumb(url).await?,
        };
        debug!(url, status, "fetched");

        self.store(&key, url, status, &body)?;

        Ok(HttpResponse {
            status,
            body,
            from_cache: false,
        })
    }

    async fn send_with_crumb(&self, url: &str) -> Result<(u16, String)> {
        let mut attempt = 0;
        loop {
            let credentials = self.credentials().await?;
            let separator = if url.contains('?') { '&' } else { '?' };
            let signed = format!("{}{}crumb={}", url, separator, encode(&credentials.crumb));

            let (status, body) = self.send(&signed, Some(&credentials.cookie)).await?;
            if status == 401 && attempt == 0 {
                warn!(url, "authentication rejected, refreshing crumb");
                self.invalidate_credentials().await;
                attempt += 1;
                continue;
            }
            return Ok((status, body));
        }
    }

    async fn send(&self, url: &str, cookie: Option<&str>) -> Result<(u16, String)> {
        self.rate_limiter.lock().await.wait().await;

        let mut request = self.client.get(url);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request.send().await.map_err(DataError::Network)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(DataError::Network)?;
        Ok((status, body))
    }

    fn cached(&self, key: &str) -> Result<Option<HttpResponse>> {
        if !self.mode.reads() {
            return Ok(None);
        }
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let cache = cache
            .lock()
            .map_err(|_| DataError::Cache("cache lock poisoned".to_string()))?;
        let hit = cache.get(key)?;
        Ok(hit.map(|entry| HttpResponse {
            status: entry.status,
            body: entry.body,
            from_cache: true,
        }))
    }

    fn store(&self, key: &str, url: &str, status: u16, body: &str) -> Result<()> {
        if !self.mode.writes() {
            return Ok(());
        }
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        let cache = cache
            .lock()
            .map_err(|_| DataError::Cache("cache lock poisoned".to_string()))?;
        cache.put(key, url, status, body)?;
        Ok(())
    }

    async fn credentials(&self) -> Result<Credentials> {
        let mut guard = self.credentials.lock().await;
        if let Some(credentials) = guard.as_ref() {
            return Ok(credentials.clone());
        }
        let fresh = self.fetch_credentials().await?;
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    async fn invalidate_credentials(&self) {
        *self.credentials.lock().await = None;
    }

    async fn fetch_credentials(&self) -> Result<Credentials> {
        self.rate_limiter.lock().await.wait().await;
        let response = self
            .client
            .get(COOKIE_URL)
            .send()
            .await
            .map_err(DataError::Network)?;

        let cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .find_map(parse_set_cookie)
            .ok_or_else(|| DataError::YahooApi("Failed to parse Yahoo cookie".to_string()))?;

        self.rate_limiter.lock().await.wait().await;
        let crumb = self
            .client
            .get(CRUMB_URL)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(DataError::Network)?
            .text()
            .await
            .map_err(DataError::Network)?;

        let crumb = crumb.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') || crumb.contains(' ') {
            return Err(DataError::YahooApi(format!(
                "Unexpected crumb response: {}",
                crumb.chars().take(64).collect::<String>()
            )));
        }

        debug!("obtained Yahoo crumb");
        Ok(Credentials { cookie, crumb })
    }
}

/// Extract `name=value` from a `Set-Cookie` header.
fn parse_set_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    if pair.contains('=') {
        Some(pair.to_string())
    } else {
        None
    }
}
