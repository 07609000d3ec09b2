//! Loader configuration with environment overrides.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `FINSCOPE_PRICE_TTL_SECS` | 1800 | price history cache lifetime |
//! | `FINSCOPE_STATEMENTS_TTL_SECS` | 1800 | statement set cache lifetime |
//! | `FINSCOPE_COMPANY_INFO_TTL_SECS` | 3600 | company overview cache lifetime |
//! | `FINSCOPE_HTTP_TIMEOUT_MS` | 10000 | per-request provider timeout |

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::CoreError;

pub const PRICE_TTL_ENV: &str = "FINSCOPE_PRICE_TTL_SECS";
pub const STATEMENTS_TTL_ENV: &str = "FINSCOPE_STATEMENTS_TTL_SECS";
pub const COMPANY_INFO_TTL_ENV: &str = "FINSCOPE_COMPANY_INFO_TTL_SECS";
pub const HTTP_TIMEOUT_ENV: &str = "FINSCOPE_HTTP_TIMEOUT_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    pub price_ttl: Duration,
    pub statements_ttl: Duration,
    pub company_info_ttl: Duration,
    pub http_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            price_ttl: Duration::from_secs(30 * 60),
            statements_ttl: Duration::from_secs(30 * 60),
            company_info_ttl: Duration::from_secs(60 * 60),
            http_timeout: Duration::from_millis(10_000),
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by `FINSCOPE_*` environment variables.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let overrides: [(&'static str, &mut Duration, fn(u64) -> Duration); 4] = [
            (PRICE_TTL_ENV, &mut config.price_ttl, Duration::from_secs),
            (STATEMENTS_TTL_ENV, &mut config.statements_ttl, Duration::from_secs),
            (COMPANY_INFO_TTL_ENV, &mut config.company_info_ttl, Duration::from_secs),
            (HTTP_TIMEOUT_ENV, &mut config.http_timeout, Duration::from_millis),
        ];

        for (key, slot, unit) in overrides {
            let Some(raw) = lookup(key) else {
                continue;
            };
            match parse_amount(key, &raw) {
                Ok(amount) => *slot = unit(amount),
                Err(error) => warn!(%error, "ignoring configuration override"),
            }
        }

        config
    }

    pub fn http_timeout_ms(&self) -> u64 {
        u64::try_from(self.http_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

fn parse_amount(key: &'static str, raw: &str) -> Result<u64, CoreError> {
    raw.trim().parse::<u64>().map_err(|_| CoreError::InvalidConfig {
        key,
        value: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_product_lifetimes() {
        let config = LoaderConfig::default();
        assert_eq!(config.price_ttl, Duration::from_secs(1800));
        assert_eq!(config.statements_ttl, Duration::from_secs(1800));
        assert_eq!(config.company_info_ttl, Duration::from_secs(3600));
        assert_eq!(config.http_timeout_ms(), 10_000);
    }

    #[test]
    fn environment_overrides_apply() {
        let config = LoaderConfig::from_lookup(lookup(&[
            (PRICE_TTL_ENV, "60"),
            (COMPANY_INFO_TTL_ENV, " 120 "),
            (HTTP_TIMEOUT_ENV, "2500"),
        ]));

        assert_eq!(config.price_ttl, Duration::from_secs(60));
        assert_eq!(config.statements_ttl, Duration::from_secs(1800));
        assert_eq!(config.company_info_ttl, Duration::from_secs(120));
        assert_eq!(config.http_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn invalid_values_are_ignored() {
        let config = LoaderConfig::from_lookup(lookup(&[
            (PRICE_TTL_ENV, "thirty minutes"),
            (STATEMENTS_TTL_ENV, "-5"),
        ]));

        assert_eq!(config, LoaderConfig::default());
    }
}
