//! Company overview with two-tier graceful degradation.
//!
//! The overview is assembled from two provider calls of different cost:
//!
//! | Tier | Fields | Failure mode |
//! |------|--------|--------------|
//! | [`InfoTier::Fast`] | market cap, current price, 52-week high/low | fields stay unavailable |
//! | [`InfoTier::Full`] | name, sector, industry, dividend yield, P/E | fields stay unavailable |
//!
//! [`CompanyInfoBuilder`] merges the two outcomes into a [`CompanyInfo`] that
//! always carries all nine [`CompanyField`]s, each tagged with where its value
//! came from. The merge is pure; no provider is needed to exercise it.
//!
//! ```rust,ignore
//! let info = CompanyInfoBuilder::new(symbol)
//!     .apply_fast(source.fast_info(&symbol).await)
//!     .apply_full(source.full_info(&symbol).await)
//!     .finish();
//! ```

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::data_source::{SourceError, SourceErrorKind};
use crate::Symbol;

/// Provider call a company field is sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoTier {
    Fast,
    Full,
}

/// The fixed set of company overview fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyField {
    CompanyName,
    Sector,
    Industry,
    MarketCap,
    CurrentPrice,
    YearHigh,
    YearLow,
    DividendYield,
    PeRatio,
}

impl CompanyField {
    pub const ALL: [Self; 9] = [
        Self::CompanyName,
        Self::Sector,
        Self::Industry,
        Self::MarketCap,
        Self::CurrentPrice,
        Self::YearHigh,
        Self::YearLow,
        Self::DividendYield,
        Self::PeRatio,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::CompanyName => "Company Name",
            Self::Sector => "Sector",
            Self::Industry => "Industry",
            Self::MarketCap => "Market Cap",
            Self::CurrentPrice => "Current Price",
            Self::YearHigh => "52 Week High",
            Self::YearLow => "52 Week Low",
            Self::DividendYield => "Dividend Yield",
            Self::PeRatio => "P/E Ratio",
        }
    }

    pub const fn tier(self) -> InfoTier {
        match self {
            Self::MarketCap | Self::CurrentPrice | Self::YearHigh | Self::YearLow => InfoTier::Fast,
            Self::CompanyName
            | Self::Sector
            | Self::Industry
            | Self::DividendYield
            | Self::PeRatio => InfoTier::Full,
        }
    }
}

impl Display for CompanyField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Text(_) => None,
            Self::Number(value) => Some(*value),
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}

/// Per-field provenance: a value from a named tier, or the unavailable default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FieldState {
    Sourced { value: FieldValue, tier: InfoTier },
    Unavailable,
}

impl FieldState {
    pub const fn is_sourced(&self) -> bool {
        matches!(self, Self::Sourced { .. })
    }

    pub fn value(&self) -> Option<&FieldValue> {
        match self {
            Self::Sourced { value, .. } => Some(value),
            Self::Unavailable => None,
        }
    }
}

impl Display for FieldState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sourced { value, .. } => value.fmt(f),
            Self::Unavailable => f.write_str("N/A"),
        }
    }
}

/// Tier 1 response. `None` means the provider did not report the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastInfo {
    pub market_cap: Option<f64>,
    pub last_price: Option<f64>,
    pub year_high: Option<f64>,
    pub year_low: Option<f64>,
}

/// Tier 2 response. `None` means the provider did not report the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullInfo {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub dividend_yield: Option<f64>,
    pub trailing_pe: Option<f64>,
}

/// What happened to one tier during a single company-info call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TierOutcome {
    NotAttempted,
    Sourced,
    Failed {
        kind: SourceErrorKind,
        message: String,
    },
}

impl TierOutcome {
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<&SourceError> for TierOutcome {
    fn from(error: &SourceError) -> Self {
        Self::Failed {
            kind: error.kind(),
            message: error.message().to_owned(),
        }
    }
}

static UNAVAILABLE: FieldState = FieldState::Unavailable;

/// Merged company overview. Every [`CompanyField`] is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub symbol: Symbol,
    fields: BTreeMap<CompanyField, FieldState>,
    pub fast_tier: TierOutcome,
    pub full_tier: TierOutcome,
}

impl CompanyInfo {
    /// All fields unavailable; the starting point of every merge.
    pub fn unavailable(symbol: Symbol) -> Self {
        Self {
            symbol,
            fields: CompanyField::ALL
                .into_iter()
                .map(|field| (field, FieldState::Unavailable))
                .collect(),
            fast_tier: TierOutcome::NotAttempted,
            full_tier: TierOutcome::NotAttempted,
        }
    }

    pub fn get(&self, field: CompanyField) -> &FieldState {
        self.fields.get(&field).unwrap_or(&UNAVAILABLE)
    }

    pub fn text(&self, field: CompanyField) -> Option<&str> {
        self.get(field).value().and_then(FieldValue::as_text)
    }

    pub fn number(&self, field: CompanyField) -> Option<f64> {
        self.get(field).value().and_then(FieldValue::as_number)
    }

    /// Fields in display order.
    pub fn iter(&self) -> impl Iterator<Item = (CompanyField, &FieldState)> + '_ {
        CompanyField::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }

    pub fn sourced_count(&self) -> usize {
        self.fields.values().filter(|state| state.is_sourced()).count()
    }

    /// True while the company name is still the unavailable default.
    pub fn is_limited(&self) -> bool {
        !self.get(CompanyField::CompanyName).is_sourced()
    }

    fn set(&mut self, field: CompanyField, value: FieldValue) {
        self.fields.insert(
            field,
            FieldState::Sourced {
                value,
                tier: field.tier(),
            },
        );
    }

    fn set_text(&mut self, field: CompanyField, value: Option<String>) {
        if let Some(value) = value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()) {
            self.set(field, FieldValue::Text(value));
        }
    }

    fn set_number(&mut self, field: CompanyField, value: Option<f64>) {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            self.set(field, FieldValue::Number(value));
        }
    }
}

/// Pure two-tier merge: `new` → `apply_fast` → `apply_full` → `finish`.
///
/// A field is only overwritten when the tier succeeded and reported it; a
/// failed tier leaves its fields untouched and records the failure.
#[derive(Debug, Clone)]
pub struct CompanyInfoBuilder {
    info: CompanyInfo,
}

impl CompanyInfoBuilder {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            info: CompanyInfo::unavailable(symbol),
        }
    }

    pub fn apply_fast(mut self, outcome: Result<FastInfo, SourceError>) -> Self {
        match outcome {
            Ok(fast) => {
                self.info.set_number(CompanyField::MarketCap, fast.market_cap);
                self.info.set_number(CompanyField::CurrentPrice, fast.last_price);
                self.info.set_number(CompanyField::YearHigh, fast.year_high);
                self.info.set_number(CompanyField::YearLow, fast.year_low);
                self.info.fast_tier = TierOutcome::Sourced;
            }
            Err(error) => self.info.fast_tier = TierOutcome::from(&error),
        }
        self
    }

    pub fn apply_full(mut self, outcome: Result<FullInfo, SourceError>) -> Self {
        match outcome {
            Ok(full) => {
                self.info.set_text(CompanyField::CompanyName, full.long_name);
                self.info.set_text(CompanyField::Sector, full.sector);
                self.info.set_text(CompanyField::Industry, full.industry);
                self.info.set_number(CompanyField::DividendYield, full.dividend_yield);
                self.info.set_number(CompanyField::PeRatio, full.trailing_pe);
                self.info.full_tier = TierOutcome::Sourced;
            }
            Err(error) => self.info.full_tier = TierOutcome::from(&error),
        }
        self
    }

    pub fn finish(self) -> CompanyInfo {
        self.info
    }
}
