use std::str::FromStr;

use finscope_core::{DashboardLoader, PriceWindow, Symbol};

use crate::cli::PriceArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &PriceArgs, loader: &DashboardLoader) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let window = PriceWindow::from_str(&args.window.window)?;

    let price = loader.fetch_price(&symbol, window).await;
    Ok(CommandResult::new(symbol).with_price(window, price))
}
