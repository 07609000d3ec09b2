//! Yahoo Finance response payloads and their normalization.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use time::macros::format_description;
use time::Date;
use tracing::warn;

use super::line_items::{line_items, series_prefix};
use crate::data_source::SourceError;
use crate::{
    FastInfo, FullInfo, Granularity, PriceBar, PriceSeries, PriceWindow, StatementKind,
    StatementSet, StatementTable, Symbol, UtcDateTime,
};

/// Yahoo wraps most numbers as `{"raw": 1.23, "fmt": "1.23"}`; missing values
/// arrive as `{}`.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

impl RawValue {
    fn value(&self) -> Option<f64> {
        self.raw.filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl ApiError {
    fn is_not_found(&self) -> bool {
        self.code.as_deref() == Some("Not Found")
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.contains("No data found"))
    }

    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(code), None) => code.clone(),
            (None, Some(description)) => description.clone(),
            (None, None) => String::from("unknown error"),
        }
    }
}

// ---------------------------------------------------------------------------
// v8 chart
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
    #[serde(default)]
    adjclose: Vec<ChartAdjClose>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct ChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Chart body to a price series. "Not found" style chart errors and a result
/// without timestamps are an empty series, not a failure.
pub(crate) fn parse_chart(
    symbol: &Symbol,
    window: PriceWindow,
    body: &str,
) -> Result<PriceSeries, SourceError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = envelope.chart.error {
        if error.is_not_found() {
            return Ok(PriceSeries::empty(symbol.clone(), window));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error: {}",
            error.describe()
        )));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::empty(symbol.clone(), window));
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(PriceSeries::empty(symbol.clone(), window));
    };
    let Some(quote) = result.indicators.quote.first() else {
        return Ok(PriceSeries::empty(symbol.clone(), window));
    };
    let adj_close = result.indicators.adjclose.first().map(|a| a.adjclose.as_slice());

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0_usize;
    for (i, &ts_value) in timestamps.iter().enumerate() {
        let ts = UtcDateTime::from_unix(ts_value)?;
        let (Some(Some(open)), Some(Some(high)), Some(Some(low)), Some(Some(close))) = (
            quote.open.get(i),
            quote.high.get(i),
            quote.low.get(i),
            quote.close.get(i),
        ) else {
            skipped += 1;
            continue;
        };
        let volume = quote.volume.get(i).copied().flatten();
        let adj = adj_close.and_then(|values| values.get(i).copied().flatten());

        match PriceBar::from_provider(ts, *open, *high, *low, *close, adj, volume) {
            Ok(bar) => bars.push(bar),
            Err(error) => {
                warn!(symbol = %symbol, ts = %ts, error = %error, "rejected chart row");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(symbol = %symbol, skipped, kept = bars.len(), "dropped chart rows");
    }

    Ok(PriceSeries::new(symbol.clone(), window, bars))
}

// ---------------------------------------------------------------------------
// fundamentals timeseries
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    #[serde(default)]
    result: Option<Vec<TimeseriesResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesPoint {
    as_of_date: String,
    #[serde(default)]
    reported_value: Option<RawValue>,
}

/// One timeseries response carrying every line item of the three statements.
pub(crate) fn parse_timeseries(
    symbol: &Symbol,
    granularity: Granularity,
    body: &str,
) -> Result<StatementSet, SourceError> {
    let envelope: TimeseriesEnvelope = serde_json::from_str(body).map_err(|e| {
        SourceError::internal(format!("failed to parse yahoo fundamentals timeseries: {e}"))
    })?;

    if let Some(error) = envelope.timeseries.error {
        if error.is_not_found() {
            return Ok(StatementSet::empty(symbol.clone(), granularity));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo timeseries API error: {}",
            error.describe()
        )));
    }

    let mut observations: HashMap<String, BTreeMap<Date, f64>> = HashMap::new();
    for mut result in envelope.timeseries.result.unwrap_or_default() {
        for series_type in result.meta.types {
            let Some(raw_points) = result.series.remove(&series_type) else {
                continue;
            };
            let points: Vec<Option<TimeseriesPoint>> = serde_json::from_value(raw_points)
                .map_err(|e| {
                    SourceError::internal(format!("malformed yahoo series '{series_type}': {e}"))
                })?;

            let entry = observations.entry(series_type).or_default();
            for point in points.into_iter().flatten() {
                let Some(value) = point.reported_value.as_ref().and_then(RawValue::value) else {
                    continue;
                };
                entry.insert(parse_date(&point.as_of_date)?, value);
            }
        }
    }

    let prefix = series_prefix(granularity);
    let mut table = |kind: StatementKind| {
        StatementTable::from_line_items(
            kind,
            line_items(kind).iter().map(|item| {
                let key = format!("{prefix}{}", item.key);
                (
                    item.label.to_owned(),
                    observations.remove(&key).unwrap_or_default(),
                )
            }),
        )
    };

    Ok(StatementSet {
        symbol: symbol.clone(),
        granularity,
        balance_sheet: table(StatementKind::BalanceSheet),
        income_statement: table(StatementKind::IncomeStatement),
        cash_flow: table(StatementKind::CashFlow),
    })
}

fn parse_date(value: &str) -> Result<Date, SourceError> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|e| SourceError::internal(format!("invalid period date '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// v7 quote (tier 1)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteBody,
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    #[serde(default)]
    result: Vec<QuoteRow>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRow {
    symbol: String,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    fifty_two_week_high: Option<f64>,
    #[serde(default)]
    fifty_two_week_low: Option<f64>,
}

pub(crate) fn parse_quote(symbol: &Symbol, body: &str) -> Result<FastInfo, SourceError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo quote: {e}")))?;

    if let Some(error) = envelope.quote_response.error {
        return Err(SourceError::unavailable(format!(
            "yahoo quote API error: {}",
            error.describe()
        )));
    }

    let row = envelope
        .quote_response
        .result
        .into_iter()
        .find(|row| row.symbol.eq_ignore_ascii_case(symbol.as_str()))
        .ok_or_else(|| SourceError::invalid_request(format!("symbol '{symbol}' not found")))?;

    Ok(FastInfo {
        market_cap: row.market_cap,
        last_price: row.regular_market_price,
        year_high: row.fifty_two_week_high,
        year_low: row.fifty_two_week_low,
    })
}

// ---------------------------------------------------------------------------
// v10 quoteSummary (tier 2)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    price: Option<SummaryPrice>,
    #[serde(default)]
    summary_profile: Option<SummaryProfile>,
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryPrice {
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryProfile {
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "dividendYield", default)]
    dividend_yield: Option<RawValue>,
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
}

pub(crate) fn parse_quote_summary(symbol: &Symbol, body: &str) -> Result<FullInfo, SourceError> {
    let envelope: SummaryEnvelope = serde_json::from_str(body).map_err(|e| {
        SourceError::internal(format!("failed to parse yahoo quote summary: {e}"))
    })?;

    if let Some(error) = envelope.quote_summary.error {
        if error.is_not_found() {
            return Err(SourceError::invalid_request(format!(
                "symbol '{symbol}' not found"
            )));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo quote summary API error: {}",
            error.describe()
        )));
    }

    let result = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| SourceError::invalid_request(format!("symbol '{symbol}' not found")))?;

    let price = result.price.unwrap_or_default();
    let profile = result.summary_profile.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();

    Ok(FullInfo {
        long_name: price.long_name.or(price.short_name).map(|name| clean_name(&name)),
        sector: profile.sector.map(|sector| format_sector(&sector)),
        industry: profile.industry,
        dividend_yield: detail.dividend_yield.as_ref().and_then(RawValue::value),
        trailing_pe: detail.trailing_pe.as_ref().and_then(RawValue::value),
    })
}

fn clean_name(name: &str) -> String {
    name.replace("&amp;", "&").trim().to_owned()
}

/// Some profiles report sectors in snake case (`consumer_defensive`).
fn format_sector(sector: &str) -> String {
    if !sector.contains('_') {
        return sector.to_owned();
    }
    sector
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
