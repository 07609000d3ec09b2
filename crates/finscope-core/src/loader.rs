//! Dashboard loader: cached, failure-isolated access to the three data products.
//!
//! ```text
//! DashboardRequest ──▶ DashboardLoader ──┬─▶ fetch_price        ─┐
//!                                        ├─▶ fetch_statements   ─┼─▶ Dashboard + notices
//!                                        └─▶ fetch_company_info ─┘
//!                                               │
//!                                         TtlCache (per product)
//!                                               │
//!                                        MarketDataSource
//! ```
//!
//! Each product is resolved independently; a failure in one never blocks or
//! alters the others.

use std::convert::Infallible;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::YahooAdapter;
use crate::cache::{CacheKey, CacheMode, Clock, SystemClock, TtlCache};
use crate::company_info::{CompanyInfo, CompanyInfoBuilder};
use crate::config::LoaderConfig;
use crate::data_source::{MarketDataSource, SourceError};
use crate::http_client::ReqwestHttpClient;
use crate::{Granularity, PriceSeries, PriceWindow, StatementSet, Symbol, ValidationError};

/// The three user inputs of a dashboard view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardRequest {
    pub symbol: Symbol,
    pub window: PriceWindow,
    pub granularity: Granularity,
}

impl DashboardRequest {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            window: PriceWindow::default(),
            granularity: Granularity::default(),
        }
    }

    /// Parse raw user input; window and granularity fall back to their defaults.
    pub fn parse(
        symbol: &str,
        window: Option<&str>,
        granularity: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            symbol: Symbol::parse(symbol)?,
            window: window.map(str::parse).transpose()?.unwrap_or_default(),
            granularity: granularity.map(str::parse).transpose()?.unwrap_or_default(),
        })
    }

    pub fn with_window(mut self, window: PriceWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Advisory message for the caller to surface next to the products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    NoPriceData,
    PriceUnavailable { message: String },
    NoStatementData,
    StatementsUnavailable { message: String },
    CompanyDetailsLimited,
}

impl Notice {
    pub const fn level(&self) -> NoticeLevel {
        match self {
            Self::NoPriceData | Self::NoStatementData | Self::CompanyDetailsLimited => {
                NoticeLevel::Info
            }
            Self::PriceUnavailable { .. } | Self::StatementsUnavailable { .. } => {
                NoticeLevel::Warning
            }
        }
    }

    /// Notice for a price outcome: empty series or failure.
    pub fn for_price(outcome: &Result<Arc<PriceSeries>, SourceError>) -> Option<Self> {
        match outcome {
            Ok(series) if series.is_empty() => Some(Self::NoPriceData),
            Ok(_) => None,
            Err(error) => Some(Self::PriceUnavailable {
                message: error.message().to_owned(),
            }),
        }
    }

    pub fn for_statements(outcome: &Result<Arc<StatementSet>, SourceError>) -> Option<Self> {
        match outcome {
            Ok(set) if set.is_empty() => Some(Self::NoStatementData),
            Ok(_) => None,
            Err(error) => Some(Self::StatementsUnavailable {
                message: error.message().to_owned(),
            }),
        }
    }

    pub fn for_company(info: &CompanyInfo) -> Option<Self> {
        info.is_limited().then_some(Self::CompanyDetailsLimited)
    }

    pub fn message(&self) -> String {
        match self {
            Self::NoPriceData => String::from("No price data available."),
            Self::PriceUnavailable { message } => {
                format!("Price data could not be loaded: {message}")
            }
            Self::NoStatementData => String::from("No financial statements available."),
            Self::StatementsUnavailable { message } => {
                format!("Financial statements could not be loaded: {message}")
            }
            Self::CompanyDetailsLimited => String::from(
                "Company details are limited right now; showing the fields that are available.",
            ),
        }
    }
}

/// Everything one dashboard view renders.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub request: DashboardRequest,
    pub price: Result<Arc<PriceSeries>, SourceError>,
    pub statements: Result<Arc<StatementSet>, SourceError>,
    pub company: Arc<CompanyInfo>,
    pub notices: Vec<Notice>,
}

impl Dashboard {
    fn assemble(
        request: DashboardRequest,
        price: Result<Arc<PriceSeries>, SourceError>,
        statements: Result<Arc<StatementSet>, SourceError>,
        company: Arc<CompanyInfo>,
    ) -> Self {
        let notices = [
            Notice::for_price(&price),
            Notice::for_statements(&statements),
            Notice::for_company(&company),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            request,
            price,
            statements,
            company,
            notices,
        }
    }

    /// True when price or statements failed outright.
    pub fn has_failures(&self) -> bool {
        self.price.is_err() || self.statements.is_err()
    }
}

/// Cached, failure-isolated access to the dashboard's data products.
pub struct DashboardLoader {
    source: Arc<dyn MarketDataSource>,
    config: LoaderConfig,
    cache_mode: CacheMode,
    price_cache: TtlCache<CacheKey, Arc<PriceSeries>>,
    statement_cache: TtlCache<CacheKey, Arc<StatementSet>>,
    company_cache: TtlCache<CacheKey, Arc<CompanyInfo>>,
}

impl std::fmt::Debug for DashboardLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardLoader")
            .field("source", &self.source.id())
            .field("config", &self.config)
            .field("cache_mode", &self.cache_mode)
            .finish_non_exhaustive()
    }
}

impl DashboardLoader {
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::default()
    }

    pub fn source_id(&self) -> &'static str {
        self.source.id()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Price history for `(symbol, window)`, cached for the price TTL.
    ///
    /// An empty series is a successful result. Errors are returned as-is and
    /// never cached.
    pub async fn fetch_price(
        &self,
        symbol: &Symbol,
        window: PriceWindow,
    ) -> Result<Arc<PriceSeries>, SourceError> {
        let key = CacheKey::Price {
            symbol: symbol.clone(),
            window,
        };
        self.price_cache
            .get_or_try_insert_with(key, self.config.price_ttl, self.cache_mode, || async {
                let series = self.source.price_history(symbol, window).await?;
                debug!(symbol = %symbol, window = %window, rows = series.len(), "fetched price history");
                Ok::<_, SourceError>(Arc::new(series))
            })
            .await
            .inspect_err(|error| {
                warn!(symbol = %symbol, window = %window, code = error.code(), error = error.message(), "price fetch failed");
            })
    }

    /// All three statements at one granularity, cached per `(symbol, granularity)`.
    pub async fn fetch_statements(
        &self,
        symbol: &Symbol,
        granularity: Granularity,
    ) -> Result<Arc<StatementSet>, SourceError> {
        let key = CacheKey::Statements {
            symbol: symbol.clone(),
            granularity,
        };
        self.statement_cache
            .get_or_try_insert_with(key, self.config.statements_ttl, self.cache_mode, || async {
                let set = self.source.statements(symbol, granularity).await?;
                debug!(symbol = %symbol, granularity = granularity.as_str(), empty = set.is_empty(), "fetched statements");
                Ok::<_, SourceError>(Arc::new(set))
            })
            .await
            .inspect_err(|error| {
                warn!(symbol = %symbol, granularity = granularity.as_str(), code = error.code(), error = error.message(), "statement fetch failed");
            })
    }

    /// Company overview; never fails.
    ///
    /// The merged record is cached even when a tier failed, so a rate-limited
    /// tier is not hit again until the entry expires.
    pub async fn fetch_company_info(&self, symbol: &Symbol) -> Arc<CompanyInfo> {
        let key = CacheKey::CompanyInfo {
            symbol: symbol.clone(),
        };
        self.company_cache
            .get_or_try_insert_with(key, self.config.company_info_ttl, self.cache_mode, || async {
                Ok::<_, Infallible>(Arc::new(self.resolve_company_info(symbol).await))
            })
            .await
            .unwrap_or_else(|never| match never {})
    }

    /// Resolve the three products concurrently and collect notices.
    pub async fn load_dashboard(&self, request: DashboardRequest) -> Dashboard {
        let (price, statements, company) = tokio::join!(
            self.fetch_price(&request.symbol, request.window),
            self.fetch_statements(&request.symbol, request.granularity),
            self.fetch_company_info(&request.symbol),
        );

        let dashboard = Dashboard::assemble(request, price, statements, company);
        info!(
            symbol = %dashboard.request.symbol,
            window = %dashboard.request.window,
            granularity = dashboard.request.granularity.as_str(),
            notices = dashboard.notices.len(),
            failed = dashboard.has_failures(),
            "dashboard loaded"
        );
        dashboard
    }

    /// Drop expired entries from every product cache.
    pub async fn clear_expired(&self) {
        tokio::join!(
            self.price_cache.clear_expired(),
            self.statement_cache.clear_expired(),
            self.company_cache.clear_expired(),
        );
    }

    async fn resolve_company_info(&self, symbol: &Symbol) -> CompanyInfo {
        let fast = self.source.fast_info(symbol).await;
        if let Err(error) = &fast {
            warn!(symbol = %symbol, tier = "fast", code = error.code(), error = error.message(), "company info tier degraded");
        }
        let full = self.source.full_info(symbol).await;
        if let Err(error) = &full {
            warn!(symbol = %symbol, tier = "full", code = error.code(), error = error.message(), "company info tier degraded");
        }

        let info = CompanyInfoBuilder::new(symbol.clone())
            .apply_fast(fast)
            .apply_full(full)
            .finish();
        debug!(symbol = %symbol, sourced = info.sourced_count(), limited = info.is_limited(), "company info merged");
        info
    }
}

/// Wires source, clock and configuration into a [`DashboardLoader`].
///
/// ```rust,ignore
/// // Real Yahoo transport, TTLs from FINSCOPE_* variables
/// let loader = DashboardLoader::builder().with_real_clients().build();
///
/// // Offline fixtures
/// let loader = DashboardLoader::builder().with_mock_mode().build();
/// ```
#[derive(Default)]
pub struct LoaderBuilder {
    source: Option<Arc<dyn MarketDataSource>>,
    config: Option<LoaderConfig>,
    clock: Option<Arc<dyn Clock>>,
    cache_mode: CacheMode,
    use_mock: bool,
}

impl LoaderBuilder {
    pub fn with_source(mut self, source: Arc<dyn MarketDataSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    /// Serve deterministic fixtures instead of calling Yahoo.
    pub fn with_mock_mode(mut self) -> Self {
        self.use_mock = true;
        self
    }

    /// Call Yahoo over reqwest.
    pub fn with_real_clients(mut self) -> Self {
        self.use_mock = false;
        self
    }

    pub fn build(self) -> DashboardLoader {
        let config = self.config.unwrap_or_else(LoaderConfig::from_env);
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let source = self.source.unwrap_or_else(|| {
            if self.use_mock {
                Arc::new(YahooAdapter::default())
            } else {
                Arc::new(
                    YahooAdapter::with_http_client(Arc::new(ReqwestHttpClient::with_timeout(
                        config.http_timeout,
                    )))
                    .with_timeout_ms(config.http_timeout_ms()),
                )
            }
        });

        DashboardLoader {
            source,
            config,
            cache_mode: self.cache_mode,
            price_cache: TtlCache::new(Arc::clone(&clock)),
            statement_cache: TtlCache::new(Arc::clone(&clock)),
            company_cache: TtlCache::new(clock),
        }
    }
}
