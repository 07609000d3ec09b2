use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Reporting period shared by all three financial statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Annual,
    Quarterly,
}

impl Granularity {
    pub const ALL: [Self; 2] = [Self::Annual, Self::Quarterly];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Annual => "Annual",
            Self::Quarterly => "Quarterly",
        }
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Self::Annual
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "annual" | "a" | "yearly" => Ok(Self::Annual),
            "quarterly" | "q" => Ok(Self::Quarterly),
            other => Err(ValidationError::InvalidGranularity {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Granularity::from_str("Annual"), Ok(Granularity::Annual));
        assert_eq!(Granularity::from_str("QUARTERLY"), Ok(Granularity::Quarterly));
        assert_eq!(Granularity::from_str("q"), Ok(Granularity::Quarterly));
    }

    #[test]
    fn rejects_unknown_granularity() {
        let err = Granularity::from_str("monthly").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidGranularity { .. }));
    }
}
