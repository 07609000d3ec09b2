mod dashboard;
mod info;
mod price;
mod statements;
mod watch;

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use finscope_core::{
    CompanyInfo, Dashboard, DashboardLoader, Granularity, Notice, PriceSeries, PriceWindow,
    SourceError, StatementSet, Symbol,
};

use crate::cli::{Cli, Command};
use crate::error::{CliError, PRODUCT_FAILURE_EXIT_CODE};
use crate::output::{self, RenderOptions};

/// Products loaded by one command; absent products were not requested.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub symbol: Symbol,
    pub window: Option<PriceWindow>,
    pub granularity: Option<Granularity>,
    pub price: Option<Result<Arc<PriceSeries>, SourceError>>,
    pub statements: Option<Result<Arc<StatementSet>, SourceError>>,
    pub company: Option<Arc<CompanyInfo>>,
    pub notices: Vec<Notice>,
    pub latency_ms: u64,
}

impl CommandResult {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            window: None,
            granularity: None,
            price: None,
            statements: None,
            company: None,
            notices: Vec::new(),
            latency_ms: 0,
        }
    }

    pub fn from_dashboard(dashboard: Dashboard) -> Self {
        let Dashboard {
            request,
            price,
            statements,
            company,
            notices,
        } = dashboard;

        Self {
            symbol: request.symbol,
            window: Some(request.window),
            granularity: Some(request.granularity),
            price: Some(price),
            statements: Some(statements),
            company: Some(company),
            notices,
            latency_ms: 0,
        }
    }

    pub fn with_price(
        mut self,
        window: PriceWindow,
        price: Result<Arc<PriceSeries>, SourceError>,
    ) -> Self {
        self.notices.extend(Notice::for_price(&price));
        self.window = Some(window);
        self.price = Some(price);
        self
    }

    pub fn with_statements(
        mut self,
        granularity: Granularity,
        statements: Result<Arc<StatementSet>, SourceError>,
    ) -> Self {
        self.notices.extend(Notice::for_statements(&statements));
        self.granularity = Some(granularity);
        self.statements = Some(statements);
        self
    }

    pub fn with_company(mut self, company: Arc<CompanyInfo>) -> Self {
        self.notices.extend(Notice::for_company(&company));
        self.company = Some(company);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn has_errors(&self) -> bool {
        matches!(self.price, Some(Err(_))) || matches!(self.statements, Some(Err(_)))
    }
}

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let loader = if cli.mock {
        DashboardLoader::builder().with_mock_mode().build()
    } else {
        DashboardLoader::builder().with_real_clients().build()
    };
    let options = RenderOptions::from(cli);

    let failed = match &cli.command {
        Command::Dashboard(args) => {
            emit(timed(dashboard::run(args, &loader)).await?, &loader, &options)?
        }
        Command::Price(args) => emit(timed(price::run(args, &loader)).await?, &loader, &options)?,
        Command::Statements(args) => {
            emit(timed(statements::run(args, &loader)).await?, &loader, &options)?
        }
        Command::Info(args) => emit(timed(info::run(args, &loader)).await?, &loader, &options)?,
        Command::Watch(args) => watch::run(args, &loader, &options).await?,
    };

    if failed {
        return Ok(ExitCode::from(PRODUCT_FAILURE_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}

/// Render a result; returns whether any product failed.
fn emit(
    result: CommandResult,
    loader: &DashboardLoader,
    options: &RenderOptions,
) -> Result<bool, CliError> {
    output::render(&result, loader.source_id(), options)?;
    Ok(result.has_errors())
}

async fn timed<F>(command: F) -> Result<CommandResult, CliError>
where
    F: Future<Output = Result<CommandResult, CliError>>,
{
    let started = Instant::now();
    let result = command.await?;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(result.with_latency(latency_ms))
}
