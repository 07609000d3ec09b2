//! Yahoo Finance adapter.
//!
//! | Product | Endpoint | Crumb |
//! |---------|----------|-------|
//! | Price history | `v8/finance/chart/{symbol}` | no |
//! | Statements | `ws/fundamentals-timeseries/v1/finance/timeseries/{symbol}` | no |
//! | Fast info | `v7/finance/quote` | yes |
//! | Full info | `v10/finance/quoteSummary/{symbol}` | yes |
//!
//! Built on a mock transport (the default) the adapter serves deterministic
//! fixtures for AAPL, MSFT, SPY and QQQ instead of calling out.

mod auth;
mod fixtures;
mod line_items;
mod wire;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::data_source::{Endpoint, MarketDataSource, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, NoopHttpClient};
use crate::{
    FastInfo, FullInfo, Granularity, PriceSeries, PriceWindow, StatementSet, Symbol, UtcDateTime,
};

pub use auth::YahooAuthManager;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";
const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "price,summaryProfile,summaryDetail";
/// Earliest period requested from the timeseries endpoint (1985-08-23).
const TIMESERIES_START: i64 = 493_590_046;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Yahoo adapter supporting both real API calls and fixture mode.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    auth_manager: Arc<YahooAuthManager>,
    use_real_api: bool,
    timeout_ms: u64,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            auth_manager: Arc::new(YahooAuthManager::default()),
            use_real_api: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl std::fmt::Debug for YahooAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooAdapter")
            .field("use_real_api", &self.use_real_api)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        let use_real_api = !http_client.is_mock();
        Self {
            http_client,
            use_real_api,
            ..Self::default()
        }
    }

    pub fn with_auth_manager(mut self, auth_manager: Arc<YahooAuthManager>) -> Self {
        self.auth_manager = auth_manager;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn is_mock(&self) -> bool {
        !self.use_real_api
    }

    async fn get(&self, endpoint: Endpoint, url: &str) -> Result<HttpResponse, SourceError> {
        let request = HttpRequest::get(url)
            .with_header("referer", auth::REFERER)
            .with_auth(&self.auth_manager.auth())
            .with_timeout_ms(self.timeout_ms);

        debug!(endpoint = %endpoint, url, "yahoo request");
        self.http_client.execute(request).await.map_err(|error| {
            if error.retryable() {
                SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
            } else {
                SourceError::internal(format!("yahoo transport error: {}", error.message()))
            }
        })
    }

    /// Map a non-2xx status onto the error taxonomy; returns the body on success.
    ///
    /// A 401 or 403 drops the cached crumb so the next call starts a new
    /// session. The failed call itself is not retried.
    fn check_status(&self, endpoint: Endpoint, response: HttpResponse) -> Result<String, SourceError> {
        match response.status {
            200..=299 => Ok(response.body),
            429 => Err(SourceError::rate_limited(format!(
                "yahoo rate limited the {endpoint} request"
            ))),
            401 | 403 => {
                self.auth_manager.invalidate();
                Err(SourceError::unavailable(format!(
                    "yahoo rejected {endpoint} credentials with status {}",
                    response.status
                )))
            }
            404 => Err(SourceError::invalid_request(format!(
                "yahoo has no {endpoint} data for this symbol"
            ))),
            status => Err(SourceError::unavailable(format!(
                "yahoo {endpoint} request returned status {status}"
            ))),
        }
    }

    async fn crumb(&self) -> Result<String, SourceError> {
        self.auth_manager
            .crumb(&self.http_client, self.timeout_ms)
            .await
    }

    async fn fetch_real_price(
        &self,
        symbol: &Symbol,
        window: PriceWindow,
    ) -> Result<PriceSeries, SourceError> {
        let url = format!(
            "{CHART_URL}/{}?range={}&interval=1d&includeAdjustedClose=true",
            urlencoding::encode(symbol.as_str()),
            window.as_str()
        );
        let response = self.get(Endpoint::Price, &url).await?;

        // Unknown symbols answer 404 with a chart error body.
        if response.status == 404 {
            return wire::parse_chart(symbol, window, &response.body)
                .or_else(|_| Ok(PriceSeries::empty(symbol.clone(), window)));
        }

        let body = self.check_status(Endpoint::Price, response)?;
        wire::parse_chart(symbol, window, &body)
    }

    async fn fetch_real_statements(
        &self,
        symbol: &Symbol,
        granularity: Granularity,
    ) -> Result<StatementSet, SourceError> {
        let url = format!(
            "{TIMESERIES_URL}/{symbol_path}?symbol={symbol_path}&type={types}&period1={TIMESERIES_START}&period2={now}",
            symbol_path = urlencoding::encode(symbol.as_str()),
            types = line_items::series_types(granularity),
            now = UtcDateTime::now().unix_timestamp(),
        );
        let response = self.get(Endpoint::Statements, &url).await?;
        let body = self.check_status(Endpoint::Statements, response)?;
        wire::parse_timeseries(symbol, granularity, &body)
    }

    async fn fetch_real_fast_info(&self, symbol: &Symbol) -> Result<FastInfo, SourceError> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{QUOTE_URL}?symbols={}&fields=marketCap,regularMarketPrice,fiftyTwoWeekHigh,fiftyTwoWeekLow&crumb={}",
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(&crumb)
        );
        let response = self.get(Endpoint::FastInfo, &url).await?;
        let body = self.check_status(Endpoint::FastInfo, response)?;
        wire::parse_quote(symbol, &body)
    }

    async fn fetch_real_full_info(&self, symbol: &Symbol) -> Result<FullInfo, SourceError> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{QUOTE_SUMMARY_URL}/{}?modules={SUMMARY_MODULES}&crumb={}",
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(&crumb)
        );
        let response = self.get(Endpoint::FullInfo, &url).await?;

        // quoteSummary reports unknown symbols as 404 with an error body.
        if response.status == 404 {
            return Err(wire::parse_quote_summary(symbol, &response.body).err().unwrap_or_else(
                || SourceError::invalid_request(format!("symbol '{symbol}' not found")),
            ));
        }

        let body = self.check_status(Endpoint::FullInfo, response)?;
        wire::parse_quote_summary(symbol, &body)
    }
}

impl MarketDataSource for YahooAdapter {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    fn price_history<'a>(
        &'a self,
        symbol: &'a Symbol,
        window: PriceWindow,
    ) -> SourceFuture<'a, PriceSeries> {
        Box::pin(async move {
            let result = if self.use_real_api {
                self.fetch_real_price(symbol, window).await
            } else {
                fixtures::price_history(symbol, window, UtcDateTime::now().date())
            };
            log_failure(Endpoint::Price, symbol, &result);
            result
        })
    }

    fn statements<'a>(
        &'a self,
        symbol: &'a Symbol,
        granularity: Granularity,
    ) -> SourceFuture<'a, StatementSet> {
        Box::pin(async move {
            let result = if self.use_real_api {
                self.fetch_real_statements(symbol, granularity).await
            } else {
                Ok(fixtures::statements(symbol, granularity))
            };
            log_failure(Endpoint::Statements, symbol, &result);
            result
        })
    }

    fn fast_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, FastInfo> {
        Box::pin(async move {
            let result = if self.use_real_api {
                self.fetch_real_fast_info(symbol).await
            } else {
                fixtures::fast_info(symbol, UtcDateTime::now().date())
            };
            log_failure(Endpoint::FastInfo, symbol, &result);
            result
        })
    }

    fn full_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, FullInfo> {
        Box::pin(async move {
            let result = if self.use_real_api {
                self.fetch_real_full_info(symbol).await
            } else {
                fixtures::full_info(symbol)
            };
            log_failure(Endpoint::FullInfo, symbol, &result);
            result
        })
    }
}

fn log_failure<T>(endpoint: Endpoint, symbol: &Symbol, result: &Result<T, SourceError>) {
    if let Err(error) = result {
        warn!(
            endpoint = %endpoint,
            symbol = %symbol,
            code = error.code(),
            error = error.message(),
            "yahoo call failed"
        );
    }
}
