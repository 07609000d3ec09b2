use finscope_core::{DashboardLoader, DashboardRequest};

use crate::cli::DashboardArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &DashboardArgs, loader: &DashboardLoader) -> Result<CommandResult, CliError> {
    let request = DashboardRequest::parse(
        &args.symbol,
        Some(&args.window.window),
        Some(&args.granularity.granularity),
    )?;

    let dashboard = loader.load_dashboard(request).await;
    Ok(CommandResult::from_dashboard(dashboard))
}
