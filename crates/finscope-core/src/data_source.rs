//! Market-data source trait and its error type.
//!
//! This module defines the adapter contract (`MarketDataSource`) the loader
//! fetches through, one method per outbound data product.
//!
//! # Endpoints
//!
//! | Endpoint | Method | Response | Description |
//! |----------|--------|----------|-------------|
//! | Price | [`price_history`](MarketDataSource::price_history) | [`PriceSeries`] | Daily bars for a window |
//! | Statements | [`statements`](MarketDataSource::statements) | [`StatementSet`] | All three statements in one round-trip |
//! | Fast info | [`fast_info`](MarketDataSource::fast_info) | [`FastInfo`] | Cheap quote-derived fields |
//! | Full info | [`full_info`](MarketDataSource::full_info) | [`FullInfo`] | Profile fields, may be rate limited |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{FastInfo, FullInfo, Granularity, PriceSeries, PriceWindow, StatementSet, Symbol};

/// Outbound data product, used in log fields and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Price,
    Statements,
    FastInfo,
    FullInfo,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Statements => "statements",
            Self::FastInfo => "fast_info",
            Self::FullInfo => "full_info",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured error returned by every source call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<crate::ValidationError> for SourceError {
    fn from(error: crate::ValidationError) -> Self {
        Self::internal(error.to_string())
    }
}

/// Boxed future returned by [`MarketDataSource`] methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Market-data provider contract.
///
/// Implementations must be `Send + Sync`; the loader shares one instance
/// behind an `Arc` across concurrent fetches.
///
/// ```rust,ignore
/// use finscope_core::{MarketDataSource, PriceWindow, Symbol, YahooAdapter};
///
/// let adapter = YahooAdapter::default();
/// let symbol = Symbol::parse("AAPL")?;
/// let series = adapter.price_history(&symbol, PriceWindow::OneYear).await?;
/// ```
pub trait MarketDataSource: Send + Sync {
    /// Short identifier used in log fields.
    fn id(&self) -> &'static str;

    /// Daily price history for the window.
    ///
    /// An unknown symbol yields `Ok` with an empty series; transport and
    /// upstream failures are errors.
    fn price_history<'a>(
        &'a self,
        symbol: &'a Symbol,
        window: PriceWindow,
    ) -> SourceFuture<'a, PriceSeries>;

    /// Balance sheet, income statement and cash flow at one granularity.
    fn statements<'a>(
        &'a self,
        symbol: &'a Symbol,
        granularity: Granularity,
    ) -> SourceFuture<'a, StatementSet>;

    /// Tier 1 company fields: market cap, price and the 52-week range.
    fn fast_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, FastInfo>;

    /// Tier 2 company fields: name, sector, industry, dividend yield and P/E.
    fn full_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, FullInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_namespaced_by_kind() {
        assert_eq!(SourceError::rate_limited("slow down").code(), "source.rate_limited");
        assert_eq!(SourceError::unavailable("down").code(), "source.unavailable");
        assert_eq!(SourceError::invalid_request("bad").code(), "source.invalid_request");
        assert_eq!(SourceError::internal("bug").code(), "source.internal");
    }

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(SourceError::rate_limited("429").retryable());
        assert!(SourceError::unavailable("503").retryable());
        assert!(!SourceError::invalid_request("404").retryable());
        assert!(!SourceError::internal("parse").retryable());
    }

    #[test]
    fn display_includes_message_and_code() {
        let error = SourceError::rate_limited("Too Many Requests");
        assert_eq!(error.to_string(), "Too Many Requests (source.rate_limited)");
    }
}
