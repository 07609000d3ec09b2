use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::data_source::SourceError;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
pub(crate) const REFERER: &str = "https://finance.yahoo.com/";

#[derive(Debug, Clone)]
struct CachedCrumb {
    value: String,
    fetched_at: Instant,
}

/// Manages Yahoo Finance cookie/crumb authentication.
///
/// Yahoo's unofficial API requires:
/// 1. A session cookie from fc.yahoo.com, kept by the transport's cookie jar
///    (or supplied through `YAHOO_COOKIE`)
/// 2. A crumb token from `/v1/test/getcrumb`, passed as a query parameter
#[derive(Debug)]
pub struct YahooAuthManager {
    crumb: Mutex<Option<CachedCrumb>>,
    refresh: tokio::sync::Mutex<()>,
    ttl: Duration,
    cookie_override: Option<String>,
}

impl Default for YahooAuthManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), std::env::var("YAHOO_COOKIE").ok())
    }
}

impl YahooAuthManager {
    pub fn new(ttl: Duration, cookie_override: Option<String>) -> Self {
        Self {
            crumb: Mutex::new(None),
            refresh: tokio::sync::Mutex::new(()),
            ttl,
            cookie_override: cookie_override.filter(|cookie| !cookie.trim().is_empty()),
        }
    }

    /// Explicit cookie header when overridden; otherwise the jar handles it.
    pub fn auth(&self) -> HttpAuth {
        match &self.cookie_override {
            Some(cookie) => HttpAuth::Cookie(cookie.clone()),
            None => HttpAuth::None,
        }
    }

    /// Current crumb, fetching a new one when missing or older than the TTL.
    pub async fn crumb(
        &self,
        http_client: &Arc<dyn HttpClient>,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        if let Some(crumb) = self.cached() {
            return Ok(crumb);
        }

        let _refreshing = self.refresh.lock().await;
        if let Some(crumb) = self.cached() {
            return Ok(crumb);
        }

        let value = self.fetch_crumb(http_client, timeout_ms).await?;
        *self.crumb.lock().unwrap_or_else(PoisonError::into_inner) = Some(CachedCrumb {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    /// Drop the cached crumb so the next call fetches a fresh one.
    pub fn invalidate(&self) {
        *self.crumb.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cached(&self) -> Option<String> {
        let crumb = self.crumb.lock().unwrap_or_else(PoisonError::into_inner);
        crumb
            .as_ref()
            .filter(|crumb| crumb.fetched_at.elapsed() < self.ttl)
            .map(|crumb| crumb.value.clone())
    }

    async fn fetch_crumb(
        &self,
        http_client: &Arc<dyn HttpClient>,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        let auth = self.auth();

        if self.cookie_override.is_none() {
            // fc.yahoo.com answers 404 but still sets the session cookie.
            let cookie_request = HttpRequest::get(COOKIE_URL)
                .with_header("referer", REFERER)
                .with_timeout_ms(timeout_ms);
            http_client.execute(cookie_request).await.map_err(|e| {
                SourceError::unavailable(format!("failed to fetch Yahoo cookie: {}", e.message()))
            })?;
        }

        for url in CRUMB_URLS {
            let request = HttpRequest::get(url)
                .with_header("referer", REFERER)
                .with_auth(&auth)
                .with_timeout_ms(timeout_ms);

            let response = match http_client.execute(request).await {
                Ok(response) => response,
                Err(error) => {
                    debug!(url, error = %error, "crumb endpoint failed");
                    continue;
                }
            };

            if response.status == 429 {
                return Err(SourceError::rate_limited(
                    "Yahoo rate limited while fetching crumb",
                ));
            }
            if !response.is_success() {
                debug!(url, status = response.status, "crumb endpoint rejected request");
                continue;
            }

            let body = response.body.trim();
            if body.contains("<html") || body.contains("<!DOCTYPE") {
                continue;
            }
            if body.to_ascii_lowercase().contains("too many requests") {
                return Err(SourceError::rate_limited(
                    "Yahoo rate limited while fetching crumb",
                ));
            }
            if !body.is_empty() && body.len() < 100 && !body.contains(char::is_whitespace) {
                return Ok(body.to_owned());
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch Yahoo crumb from all endpoints",
        ))
    }
}
