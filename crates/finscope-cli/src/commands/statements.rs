use std::str::FromStr;

use finscope_core::{DashboardLoader, Granularity, Symbol};

use crate::cli::StatementsArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(
    args: &StatementsArgs,
    loader: &DashboardLoader,
) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let granularity = Granularity::from_str(&args.granularity.granularity)?;

    let statements = loader.fetch_statements(&symbol, granularity).await;
    Ok(CommandResult::new(symbol).with_statements(granularity, statements))
}
