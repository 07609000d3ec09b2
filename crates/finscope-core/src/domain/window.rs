use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Span of price history requested for the chart and table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceWindow {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "max")]
    Max,
}

impl PriceWindow {
    pub const ALL: [Self; 8] = [
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
        Self::TenYears,
        Self::Max,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::Max => "max",
        }
    }

    /// Calendar days covered by the window; `None` for the full listing history.
    pub const fn calendar_days(self) -> Option<i64> {
        match self {
            Self::OneMonth => Some(31),
            Self::ThreeMonths => Some(92),
            Self::SixMonths => Some(183),
            Self::OneYear => Some(366),
            Self::TwoYears => Some(731),
            Self::FiveYears => Some(1_827),
            Self::TenYears => Some(3_653),
            Self::Max => None,
        }
    }

    /// Approximate number of trading sessions in the window.
    pub const fn trading_days(self) -> Option<usize> {
        match self {
            Self::OneMonth => Some(21),
            Self::ThreeMonths => Some(63),
            Self::SixMonths => Some(126),
            Self::OneYear => Some(252),
            Self::TwoYears => Some(504),
            Self::FiveYears => Some(1_260),
            Self::TenYears => Some(2_520),
            Self::Max => None,
        }
    }
}

impl Default for PriceWindow {
    fn default() -> Self {
        Self::OneYear
    }
}

impl Display for PriceWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceWindow {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|window| window.as_str() == normalized)
            .ok_or(ValidationError::InvalidWindow { value: normalized })
    }
}
