//! # Finscope Core
//!
//! Data access and resilience layer for the finscope ticker dashboard.
//!
//! ## Overview
//!
//! For one ticker symbol the crate produces three independent data products:
//!
//! - **Price history** over a selectable window
//! - **Financial statements** (balance sheet, income statement, cash flow)
//!   at annual or quarterly granularity
//! - **Company overview** assembled from two provider tiers, degrading field
//!   by field instead of failing
//!
//! Every product is cached in memory with a per-product TTL and resolved in
//! isolation, so one failing upstream call never takes the others down.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance adapter (real transport or fixtures) |
//! | [`cache`] | Typed TTL cache with single-flight fetches |
//! | [`company_info`] | Company fields, tier outcomes and the merge builder |
//! | [`config`] | Loader configuration and environment overrides |
//! | [`data_source`] | Market data source trait and structured errors |
//! | [`domain`] | Symbols, windows, price series and statement tables |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`loader`] | Dashboard loader and notices |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use finscope_core::{DashboardLoader, DashboardRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = DashboardLoader::builder().with_real_clients().build();
//!     let request = DashboardRequest::parse("AAPL", Some("6mo"), Some("quarterly"))?;
//!
//!     let dashboard = loader.load_dashboard(request).await;
//!     for notice in &dashboard.notices {
//!         eprintln!("{}", notice.message());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ DashboardLoader │────▶│ TtlCache         │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Data Source     │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest/none)   │
//! └─────────────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Domain Models   │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Price and statement fetches return [`SourceError`]; company info never
//! fails and records per-tier outcomes instead:
//!
//! ```rust
//! use finscope_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::RateLimited => "try again later",
//!         SourceErrorKind::InvalidRequest => "check the symbol",
//!         _ => "data source unavailable",
//!     }
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod company_info;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod loader;

// Adapter implementations
pub use adapters::{YahooAdapter, YahooAuthManager};

// Caching
pub use cache::{CacheKey, CacheMode, Clock, ManualClock, SystemClock, TtlCache};

// Company overview
pub use company_info::{
    CompanyField, CompanyInfo, CompanyInfoBuilder, FastInfo, FieldState, FieldValue, FullInfo,
    InfoTier, TierOutcome,
};

// Configuration
pub use config::LoaderConfig;

// Data source trait and types
pub use data_source::{Endpoint, MarketDataSource, SourceError, SourceErrorKind, SourceFuture};

// Domain models
pub use domain::{
    Granularity, PriceBar, PriceSeries, PriceWindow, StatementKind, StatementRow, StatementSet,
    StatementTable, Symbol, UtcDateTime,
};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Loader
pub use loader::{Dashboard, DashboardLoader, DashboardRequest, LoaderBuilder, Notice, NoticeLevel};
