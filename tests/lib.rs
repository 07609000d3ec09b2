//! Shared helpers for finscope behavior tests.
//!
//! [`ScriptedSource`] is an in-memory [`MarketDataSource`] that counts calls per
//! endpoint and fails on demand, so loader, cache and degradation behavior can
//! be exercised without a network.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use time::{Date, Month};

pub use finscope_core::{
    CacheMode, CompanyField, CompanyInfo, DashboardLoader, DashboardRequest, Endpoint, FastInfo,
    FieldState, FullInfo, Granularity, InfoTier, LoaderConfig, ManualClock, MarketDataSource,
    Notice, PriceBar, PriceSeries, PriceWindow, SourceError, SourceErrorKind, SourceFuture,
    StatementKind, StatementSet, StatementTable, Symbol, TierOutcome, UtcDateTime,
};

/// Symbols the scripted source has data for; anything else yields empty results.
pub const KNOWN_SYMBOLS: [&str; 2] = ["AAPL", "MSFT"];

/// 2024-01-02T00:00:00Z
const FIRST_SESSION: i64 = 1_704_153_600;
const MAX_SESSIONS: usize = 2_520;

#[derive(Debug, Default)]
pub struct ScriptedSource {
    calls: Mutex<HashMap<Endpoint, usize>>,
    failures: Mutex<HashMap<Endpoint, SourceError>>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    /// Fail every subsequent call to `endpoint` with `error`.
    pub fn fail(&self, endpoint: Endpoint, error: SourceError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint, error);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&endpoint);
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    async fn begin(&self, endpoint: Endpoint) -> Result<(), SourceError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(endpoint)
            .or_default() += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&endpoint)
            .cloned();
        failure.map_or(Ok(()), Err)
    }
}

fn is_known(symbol: &Symbol) -> bool {
    KNOWN_SYMBOLS.contains(&symbol.as_str())
}

fn not_found(symbol: &Symbol) -> SourceError {
    SourceError::invalid_request(format!("symbol '{symbol}' not found"))
}

fn scripted_series(symbol: &Symbol, window: PriceWindow) -> Result<PriceSeries, SourceError> {
    if !is_known(symbol) {
        return Ok(PriceSeries::empty(symbol.clone(), window));
    }

    let sessions = window.trading_days().unwrap_or(MAX_SESSIONS);
    let bars = (0..sessions)
        .map(|index| -> Result<PriceBar, SourceError> {
            let ts = UtcDateTime::from_unix(FIRST_SESSION + index as i64 * 86_400)?;
            let close = 100.0 + (index % 50) as f64 * 0.5;
            Ok(PriceBar::new(
                ts,
                close,
                close + 1.0,
                close - 1.0,
                close,
                Some(close),
                Some(1_000_000),
            )?)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PriceSeries::new(symbol.clone(), window, bars))
}

/// Four fiscal years ending in September, or five quarters ending June 2024.
pub fn scripted_periods(granularity: Granularity) -> Vec<Date> {
    let build = |year: i32, month: Month, day: u8| Date::from_calendar_date(year, month, day);
    let periods = match granularity {
        Granularity::Annual => vec![
            build(2023, Month::September, 30),
            build(2022, Month::September, 30),
            build(2021, Month::September, 30),
            build(2020, Month::September, 30),
        ],
        Granularity::Quarterly => vec![
            build(2024, Month::June, 30),
            build(2024, Month::March, 31),
            build(2023, Month::December, 31),
            build(2023, Month::September, 30),
            build(2023, Month::June, 30),
        ],
    };
    periods.into_iter().flatten().collect()
}

fn scripted_statements(symbol: &Symbol, granularity: Granularity) -> StatementSet {
    if !is_known(symbol) {
        return StatementSet::empty(symbol.clone(), granularity);
    }

    let periods = scripted_periods(granularity);
    let scale = match granularity {
        Granularity::Annual => 400e9,
        Granularity::Quarterly => 100e9,
    };
    let table = |kind: StatementKind, items: [&str; 2]| {
        StatementTable::from_line_items(
            kind,
            items.into_iter().enumerate().map(|(index, label)| {
                let values = periods
                    .iter()
                    .enumerate()
                    .map(|(age, period)| (*period, scale / (index + 1) as f64 - age as f64 * 1e9))
                    .collect::<BTreeMap<_, _>>();
                (label.to_owned(), values)
            }),
        )
    };

    StatementSet {
        symbol: symbol.clone(),
        granularity,
        balance_sheet: table(StatementKind::BalanceSheet, ["Total Assets", "Total Debt"]),
        income_statement: table(StatementKind::IncomeStatement, ["Total Revenue", "Net Income"]),
        cash_flow: table(StatementKind::CashFlow, ["Operating Cash Flow", "Free Cash Flow"]),
    }
}

impl MarketDataSource for ScriptedSource {
    fn id(&self) -> &'static str {
        "scripted"
    }

    fn price_history<'a>(
        &'a self,
        symbol: &'a Symbol,
        window: PriceWindow,
    ) -> SourceFuture<'a, PriceSeries> {
        Box::pin(async move {
            self.begin(Endpoint::Price).await?;
            scripted_series(symbol, window)
        })
    }

    fn statements<'a>(
        &'a self,
        symbol: &'a Symbol,
        granularity: Granularity,
    ) -> SourceFuture<'a, StatementSet> {
        Box::pin(async move {
            self.begin(Endpoint::Statements).await?;
            Ok(scripted_statements(symbol, granularity))
        })
    }

    fn fast_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, FastInfo> {
        Box::pin(async move {
            self.begin(Endpoint::FastInfo).await?;
            if !is_known(symbol) {
                return Err(not_found(symbol));
            }
            Ok(FastInfo {
                market_cap: Some(2_900_000_000_000.0),
                last_price: Some(189.5),
                year_high: Some(199.6),
                year_low: Some(164.1),
            })
        })
    }

    fn full_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, FullInfo> {
        Box::pin(async move {
            self.begin(Endpoint::FullInfo).await?;
            if !is_known(symbol) {
                return Err(not_found(symbol));
            }
            Ok(FullInfo {
                long_name: Some(format!("{symbol} Holdings Inc.")),
                sector: Some(String::from("Technology")),
                industry: Some(String::from("Consumer Electronics")),
                dividend_yield: Some(0.0051),
                trailing_pe: Some(29.4),
            })
        })
    }
}

/// A loader over `source` driven by a manual clock and default TTLs.
pub fn scripted_loader(source: &Arc<ScriptedSource>) -> (DashboardLoader, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let loader = DashboardLoader::builder()
        .with_source(source.clone())
        .with_clock(clock.clone())
        .with_config(LoaderConfig::default())
        .build();
    (loader, clock)
}

pub fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("valid symbol")
}
