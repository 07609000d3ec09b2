//! stderr logging for the CLI.
//!
//! Noisy transport crates are pinned to `warn` unless `RUST_LOG` is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls", "cookie_store"];

fn directives(log_level: LogLevel) -> String {
    let mut directives = String::from(log_level.as_str());
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    directives
}

pub fn init(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(log_level)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();

    tracing::debug!(log_level = log_level.as_str(), "logging initialized");
}
