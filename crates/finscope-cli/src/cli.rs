//! CLI argument definitions for finscope.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dashboard` | Price history, statements and company overview for one symbol |
//! | `price` | Price history only |
//! | `statements` | Balance sheet, income statement and cash flow |
//! | `info` | Company overview |
//! | `watch` | Read `SYMBOL [WINDOW] [GRANULARITY]` lines from stdin, one dashboard each |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Serve deterministic fixtures instead of calling Yahoo |
//! | `--rows` | `10` | Price rows shown in table mode |
//! | `--log-level` | `warn` | Log level on stderr; `RUST_LOG` takes precedence |
//!
//! # Examples
//!
//! ```bash
//! finscope dashboard AAPL --window 6mo --statements quarterly
//! finscope price MSFT --window 5y --format json --pretty
//! printf 'AAPL\nMSFT 1mo\n' | finscope watch
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// finscope - ticker dashboard in the terminal
///
/// Shows price history, financial statements and a company overview for a
/// ticker symbol. Every product is cached in memory and loaded independently,
/// so one failing upstream call never hides the others.
#[derive(Debug, Parser)]
#[command(
    name = "finscope",
    author,
    version,
    about = "Ticker dashboard: price history, statements and company overview"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve deterministic fixture data (AAPL, MSFT, SPY, QQQ) without network access.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Number of most recent price rows shown in table mode.
    #[arg(long, global = true, default_value_t = 10)]
    pub rows: usize,

    /// Log level written to stderr. `RUST_LOG` overrides it.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Text tables and a close-price sparkline.
    Table,
    /// One JSON report per dashboard.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load all three products for a symbol.
    Dashboard(DashboardArgs),
    /// Fetch price history.
    Price(PriceArgs),
    /// Fetch the three financial statements.
    Statements(StatementsArgs),
    /// Fetch the company overview.
    Info(InfoArgs),
    /// Render a dashboard for every line read from stdin, sharing one cache.
    Watch(WatchArgs),
}

#[derive(Debug, Clone, Args)]
pub struct WindowArg {
    /// Price window: 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y or max.
    #[arg(long, default_value = "1y")]
    pub window: String,
}

#[derive(Debug, Clone, Args)]
pub struct GranularityArg {
    /// Statement granularity: annual or quarterly.
    #[arg(long = "statements", default_value = "annual")]
    pub granularity: String,
}

#[derive(Debug, Clone, Args)]
pub struct DashboardArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    #[command(flatten)]
    pub window: WindowArg,

    #[command(flatten)]
    pub granularity: GranularityArg,
}

#[derive(Debug, Clone, Args)]
pub struct PriceArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    #[command(flatten)]
    pub window: WindowArg,
}

#[derive(Debug, Clone, Args)]
pub struct StatementsArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    #[command(flatten)]
    pub granularity: GranularityArg,
}

#[derive(Debug, Clone, Args)]
pub struct InfoArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,
}

/// Defaults applied to stdin lines that omit window or granularity.
#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub window: WindowArg,

    #[command(flatten)]
    pub granularity: GranularityArg,
}
