use std::time::Instant;

use finscope_core::{DashboardLoader, DashboardRequest};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::cli::WatchArgs;
use crate::error::CliError;
use crate::output::{self, RenderOptions};

use super::CommandResult;

/// One dashboard per stdin line, all sharing the loader's cache.
///
/// Invalid lines are reported on stderr and skipped. Returns whether any
/// rendered dashboard had a failed product.
pub async fn run(
    args: &WatchArgs,
    loader: &DashboardLoader,
    options: &RenderOptions,
) -> Result<bool, CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failed = false;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let request = match parse_line(&line, args) {
            Ok(request) => request,
            Err(error) => {
                warn!(line = line.trim(), %error, "skipping watch input");
                eprintln!("error: {error}");
                continue;
            }
        };

        let started = Instant::now();
        let dashboard = loader.load_dashboard(request).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = CommandResult::from_dashboard(dashboard).with_latency(latency_ms);

        output::render(&result, loader.source_id(), options)?;
        failed |= result.has_errors();
        loader.clear_expired().await;
    }

    Ok(failed)
}

/// `SYMBOL [WINDOW] [GRANULARITY]`, falling back to the command's defaults.
fn parse_line(line: &str, defaults: &WatchArgs) -> Result<DashboardRequest, CliError> {
    let mut fields = line.split_whitespace();
    let symbol = fields.next().unwrap_or_default();
    let window = fields.next().unwrap_or(&defaults.window.window);
    let granularity = fields.next().unwrap_or(&defaults.granularity.granularity);

    let extra = fields.collect::<Vec<_>>();
    if !extra.is_empty() {
        return Err(CliError::ExtraWatchFields(extra.join(" ")));
    }

    Ok(DashboardRequest::parse(symbol, Some(window), Some(granularity))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{GranularityArg, WindowArg};
    use finscope_core::{Granularity, PriceWindow, ValidationError};

    fn defaults() -> WatchArgs {
        WatchArgs {
            window: WindowArg {
                window: String::from("6mo"),
            },
            granularity: GranularityArg {
                granularity: String::from("quarterly"),
            },
        }
    }

    #[test]
    fn line_fields_override_defaults() {
        let request = parse_line("msft 5y annual", &defaults()).expect("valid line");
        assert_eq!(request.symbol.as_str(), "MSFT");
        assert_eq!(request.window, PriceWindow::FiveYears);
        assert_eq!(request.granularity, Granularity::Annual);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let request = parse_line("  AAPL ", &defaults()).expect("valid line");
        assert_eq!(request.window, PriceWindow::SixMonths);
        assert_eq!(request.granularity, Granularity::Quarterly);
    }

    #[test]
    fn invalid_window_is_rejected() {
        let error = parse_line("AAPL 3w", &defaults()).expect_err("invalid window");
        assert!(matches!(
            error,
            CliError::Validation(ValidationError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn trailing_fields_are_rejected() {
        let error = parse_line("AAPL 1y annual junk more", &defaults()).expect_err("extra fields");
        assert!(matches!(error, CliError::ExtraWatchFields(ref extra) if extra == "junk more"));
        assert_eq!(error.exit_code(), 2);
    }
}
