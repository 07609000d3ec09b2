use serde::{Deserialize, Serialize};

use crate::{PriceWindow, Symbol, UtcDateTime, ValidationError};

/// One daily OHLCV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: Option<f64>,
    pub volume: Option<u64>,
}

impl PriceBar {
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        adj_close: Option<f64>,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;
        if let Some(adj_close) = adj_close {
            validate_non_negative("adj_close", adj_close)?;
        }

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            adj_close,
            volume,
        })
    }
}

impl PriceBar {
    /// Build a bar from provider data, widening `high`/`low` to cover `open`
    /// and `close` when the reported range is inconsistent.
    ///
    /// Non-finite or negative prices are still rejected.
    pub fn from_provider(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        adj_close: Option<f64>,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        let (high, low) = if high < low { (low, high) } else { (high, low) };
        let high = high.max(open).max(close);
        let low = low.min(open).min(close);
        Self::new(ts, open, high, low, close, adj_close, volume)
    }
}

/// Daily price history for one symbol over one window.
///
/// Rows are sorted by timestamp with duplicates removed, so dates are strictly
/// increasing. An empty series is a valid result for an unknown symbol or a
/// symbol without trading history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub window: PriceWindow,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, window: PriceWindow, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.ts);
        bars.dedup_by_key(|bar| bar.ts);
        Self {
            symbol,
            window,
            bars,
        }
    }

    pub fn empty(symbol: Symbol, window: PriceWindow) -> Self {
        Self::new(symbol, window, Vec::new())
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Close price series used for the line chart.
    pub fn closes(&self) -> Vec<(UtcDateTime, f64)> {
        self.bars.iter().map(|bar| (bar.ts, bar.close)).collect()
    }

    /// Percentage change from the first to the last close in the window.
    pub fn change_pct(&self) -> Option<f64> {
        let first = self.first()?.close;
        let last = self.last()?.close;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
