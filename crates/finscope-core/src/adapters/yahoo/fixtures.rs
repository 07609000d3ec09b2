//! Deterministic offline data served when the adapter runs on a mock transport.

use std::collections::BTreeMap;

use time::{Date, Month, Weekday};

use super::line_items::line_items;
use crate::data_source::SourceError;
use crate::{
    FastInfo, FullInfo, Granularity, PriceBar, PriceSeries, PriceWindow, StatementKind,
    StatementSet, StatementTable, Symbol, UtcDateTime,
};

/// Sessions generated for the `max` window.
const MAX_SESSIONS: usize = 5_040;
const ANNUAL_PERIODS: i32 = 4;
const QUARTERLY_PERIODS: i32 = 5;
const LATEST_FISCAL_YEAR: i32 = 2024;

#[derive(Debug, Clone, Copy)]
struct CatalogEntry {
    symbol: &'static str,
    name: &'static str,
    sector: Option<&'static str>,
    industry: Option<&'static str>,
    base_price: f64,
    shares_outstanding: f64,
    dividend_yield: Option<f64>,
    trailing_pe: Option<f64>,
    /// Annual revenue in dollars; `None` for funds, which file no statements.
    revenue: Option<f64>,
    fiscal_year_end: Month,
}

const CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        symbol: "AAPL",
        name: "Apple Inc.",
        sector: Some("Technology"),
        industry: Some("Consumer Electronics"),
        base_price: 182.0,
        shares_outstanding: 15.4e9,
        dividend_yield: Some(0.0051),
        trailing_pe: Some(29.4),
        revenue: Some(383.3e9),
        fiscal_year_end: Month::September,
    },
    CatalogEntry {
        symbol: "MSFT",
        name: "Microsoft Corporation",
        sector: Some("Technology"),
        industry: Some("Software - Infrastructure"),
        base_price: 405.0,
        shares_outstanding: 7.43e9,
        dividend_yield: Some(0.0072),
        trailing_pe: Some(36.1),
        revenue: Some(245.1e9),
        fiscal_year_end: Month::June,
    },
    CatalogEntry {
        symbol: "SPY",
        name: "SPDR S&P 500 ETF Trust",
        sector: None,
        industry: None,
        base_price: 512.0,
        shares_outstanding: 0.92e9,
        dividend_yield: Some(0.0123),
        trailing_pe: Some(26.8),
        revenue: None,
        fiscal_year_end: Month::September,
    },
    CatalogEntry {
        symbol: "QQQ",
        name: "Invesco QQQ Trust",
        sector: None,
        industry: None,
        base_price: 438.0,
        shares_outstanding: 0.57e9,
        dividend_yield: Some(0.0058),
        trailing_pe: Some(34.2),
        revenue: None,
        fiscal_year_end: Month::September,
    },
];

fn lookup(symbol: &Symbol) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.symbol == symbol.as_str())
}

fn not_found(symbol: &Symbol) -> SourceError {
    SourceError::invalid_request(format!("symbol '{symbol}' not found"))
}

pub(crate) fn price_history(
    symbol: &Symbol,
    window: PriceWindow,
    today: Date,
) -> Result<PriceSeries, SourceError> {
    let Some(entry) = lookup(symbol) else {
        return Ok(PriceSeries::empty(symbol.clone(), window));
    };

    let sessions = window.trading_days().unwrap_or(MAX_SESSIONS);
    let seed = symbol_seed(symbol);
    let dates = trading_days_ending(today, sessions);

    let mut previous_close = close_at(entry, seed, 0, sessions);
    let mut bars = Vec::with_capacity(dates.len());
    for (index, date) in dates.into_iter().enumerate() {
        let close = close_at(entry, seed, index, sessions);
        let open = previous_close;
        let high = open.max(close) * 1.008;
        let low = open.min(close) * 0.992;
        let ts = UtcDateTime::from_offset_datetime(date.midnight().assume_utc())?;
        let volume = 20_000_000 + (seed.wrapping_add(index as u64 * 7_919) % 40_000_000);

        bars.push(PriceBar::new(
            ts,
            round_cents(open),
            round_cents(high),
            round_cents(low),
            round_cents(close),
            Some(round_cents(close * 0.995)),
            Some(volume),
        )?);
        previous_close = close;
    }

    Ok(PriceSeries::new(symbol.clone(), window, bars))
}

pub(crate) fn statements(symbol: &Symbol, granularity: Granularity) -> StatementSet {
    let Some(entry) = lookup(symbol) else {
        return StatementSet::empty(symbol.clone(), granularity);
    };
    let Some(revenue) = entry.revenue else {
        return StatementSet::empty(symbol.clone(), granularity);
    };

    let periods = period_ends(entry.fiscal_year_end, granularity);
    let scale = match granularity {
        Granularity::Annual => revenue,
        Granularity::Quarterly => revenue / 4.0,
    };

    let table = |kind: StatementKind| {
        StatementTable::from_line_items(
            kind,
            line_items(kind).iter().enumerate().map(|(index, item)| {
                let weight = line_item_weight(kind, index);
                let observations = periods
                    .iter()
                    .enumerate()
                    .map(|(age, period_end)| {
                        let growth = 1.0 - 0.04 * age as f64;
                        (*period_end, (scale * weight * growth).round())
                    })
                    .collect::<BTreeMap<_, _>>();
                (item.label.to_owned(), observations)
            }),
        )
    };

    StatementSet {
        symbol: symbol.clone(),
        granularity,
        balance_sheet: table(StatementKind::BalanceSheet),
        income_statement: table(StatementKind::IncomeStatement),
        cash_flow: table(StatementKind::CashFlow),
    }
}

pub(crate) fn fast_info(symbol: &Symbol, today: Date) -> Result<FastInfo, SourceError> {
    let entry = lookup(symbol).ok_or_else(|| not_found(symbol))?;
    let year = price_history(symbol, PriceWindow::OneYear, today)?;
    let last_price = year.last().map(|bar| bar.close);

    Ok(FastInfo {
        market_cap: last_price.map(|price| (price * entry.shares_outstanding).round()),
        last_price,
        year_high: year.bars().iter().map(|bar| bar.high).reduce(f64::max),
        year_low: year.bars().iter().map(|bar| bar.low).reduce(f64::min),
    })
}

pub(crate) fn full_info(symbol: &Symbol) -> Result<FullInfo, SourceError> {
    let entry = lookup(symbol).ok_or_else(|| not_found(symbol))?;

    Ok(FullInfo {
        long_name: Some(entry.name.to_owned()),
        sector: entry.sector.map(str::to_owned),
        industry: entry.industry.map(str::to_owned),
        dividend_yield: entry.dividend_yield,
        trailing_pe: entry.trailing_pe,
    })
}

fn close_at(entry: &CatalogEntry, seed: u64, index: usize, sessions: usize) -> f64 {
    let t = index as f64;
    let phase = (seed % 628) as f64 / 100.0;
    let drift = 1.0 + 0.25 * (t - sessions as f64) / sessions.max(1) as f64;
    let wave = 1.0 + 0.06 * (t / 23.0 + phase).sin() + 0.02 * (t / 5.0 + phase).cos();
    (entry.base_price * drift * wave).max(1.0)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The last `count` weekdays up to and including `today`, oldest first.
fn trading_days_ending(today: Date, count: usize) -> Vec<Date> {
    let mut days = Vec::with_capacity(count);
    let mut cursor = today;
    while days.len() < count {
        if !matches!(cursor.weekday(), Weekday::Saturday | Weekday::Sunday) {
            days.push(cursor);
        }
        match cursor.previous_day() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    days.reverse();
    days
}

fn period_ends(fiscal_year_end: Month, granularity: Granularity) -> Vec<Date> {
    match granularity {
        Granularity::Annual => (0..ANNUAL_PERIODS)
            .filter_map(|age| month_end(LATEST_FISCAL_YEAR - age, fiscal_year_end))
            .collect(),
        Granularity::Quarterly => {
            let mut month = fiscal_year_end;
            let mut year = LATEST_FISCAL_YEAR;
            let mut ends = Vec::new();
            for _ in 0..QUARTERLY_PERIODS {
                if let Some(end) = month_end(year, month) {
                    ends.push(end);
                }
                for _ in 0..3 {
                    if month == Month::January {
                        year -= 1;
                    }
                    month = month.previous();
                }
            }
            ends
        }
    }
}

fn month_end(year: i32, month: Month) -> Option<Date> {
    let (next_year, next_month) = match month {
        Month::December => (year + 1, Month::January),
        other => (year, other.next()),
    };
    Date::from_calendar_date(next_year, next_month, 1)
        .ok()?
        .previous_day()
}

/// Share of revenue each line item represents, so rows look plausible.
fn line_item_weight(kind: StatementKind, index: usize) -> f64 {
    const BALANCE_SHEET: [f64; 14] = [
        0.92, 0.37, 0.08, 0.07, 0.02, 0.11, 0.03, 0.75, 0.38, 0.25, 0.29, 0.17, 0.01, 0.04,
    ];
    const INCOME_STATEMENT: [f64; 14] = [
        1.0, 0.56, 0.44, 0.08, 0.07, 0.15, 0.29, 0.01, 0.3, 0.05, 0.25, 0.33, 6.2e-11, 6.1e-11,
    ];
    const CASH_FLOW: [f64; 10] = [
        0.29, 0.03, -0.02, -0.03, -0.03, -0.28, -0.2, -0.04, 0.26, 0.08,
    ];

    let weights: &[f64] = match kind {
        StatementKind::BalanceSheet => &BALANCE_SHEET,
        StatementKind::IncomeStatement => &INCOME_STATEMENT,
        StatementKind::CashFlow => &CASH_FLOW,
    };
    weights.get(index).copied().unwrap_or(0.01)
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(byte as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 06 - 14);

    fn symbol(value: &str) -> Symbol {
        Symbol::parse(value).expect("symbol")
    }

    #[test]
    fn price_history_matches_window_length() {
        for window in [PriceWindow::OneMonth, PriceWindow::OneYear, PriceWindow::FiveYears] {
            let series = price_history(&symbol("AAPL"), window, TODAY).expect("fixture");
            assert_eq!(Some(series.len()), window.trading_days());
        }
        let max = price_history(&symbol("MSFT"), PriceWindow::Max, TODAY).expect("fixture");
        assert_eq!(max.len(), MAX_SESSIONS);
    }

    #[test]
    fn price_history_skips_weekends_and_ends_today() {
        let series = price_history(&symbol("SPY"), PriceWindow::OneMonth, TODAY).expect("fixture");
        assert!(series
            .bars()
            .iter()
            .all(|bar| !matches!(bar.ts.date().weekday(), Weekday::Saturday | Weekday::Sunday)));
        assert_eq!(series.last().map(|bar| bar.ts.date()), Some(TODAY));
    }

    #[test]
    fn unknown_symbol_has_no_data() {
        let unknown = symbol("ZZZZINVALID");
        assert!(price_history(&unknown, PriceWindow::OneYear, TODAY)
            .expect("empty is not an error")
            .is_empty());
        assert!(statements(&unknown, Granularity::Annual).is_empty());
        assert_eq!(fast_info(&unknown, TODAY).expect_err("tier 1").code(), "source.invalid_request");
        assert_eq!(full_info(&unknown).expect_err("tier 2").code(), "source.invalid_request");
    }

    #[test]
    fn annual_statements_are_indexed_by_fiscal_year() {
        let set = statements(&symbol("AAPL"), Granularity::Annual);
        for table in set.tables() {
            assert_eq!(
                table.periods(),
                vec![
                    date!(2024 - 09 - 30),
                    date!(2023 - 09 - 30),
                    date!(2022 - 09 - 30),
                    date!(2021 - 09 - 30)
                ]
            );
        }
    }

    #[test]
    fn quarterly_statements_step_back_three_months() {
        let set = statements(&symbol("MSFT"), Granularity::Quarterly);
        assert_eq!(
            set.income_statement.periods(),
            vec![
                date!(2024 - 06 - 30),
                date!(2024 - 03 - 31),
                date!(2023 - 12 - 31),
                date!(2023 - 09 - 30),
                date!(2023 - 06 - 30)
            ]
        );
    }

    #[test]
    fn funds_file_no_statements() {
        assert!(statements(&symbol("QQQ"), Granularity::Annual).is_empty());
        let full = full_info(&symbol("QQQ")).expect("fund profile");
        assert_eq!(full.sector, None);
        assert_eq!(full.long_name.as_deref(), Some("Invesco QQQ Trust"));
    }

    #[test]
    fn fast_info_tracks_the_one_year_range() {
        let fast = fast_info(&symbol("AAPL"), TODAY).expect("fixture");
        let price = fast.last_price.expect("price");
        assert!(fast.year_low.expect("low") <= price);
        assert!(fast.year_high.expect("high") >= price);
        assert!(fast.market_cap.expect("cap") > 1.0e12);
    }
}
