use finscope_core::{DashboardLoader, Symbol};

use crate::cli::InfoArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &InfoArgs, loader: &DashboardLoader) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;

    let company = loader.fetch_company_info(&symbol).await;
    Ok(CommandResult::new(symbol).with_company(company))
}
