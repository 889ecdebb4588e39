use anyhow::{Context, Result};
use clap::Parser;
use isubench_config::ConfigLoader;
use isubench_execution::Benchmark;
use isubench_logging::{admin, init_logging_from_config};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::warn;

mod cli;
mod report;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .load(cli.config.as_ref())
        .context("Failed to load configuration")?;
    cli.apply(&mut config)?;

    init_logging_from_config(&config.logging)?;
    admin!("{}", config.to_flags());

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling the benchmark");
                cancel.cancel();
            }
        });
    }

    let benchmark = Benchmark::new(config.clone()).context("Failed to set up the benchmark")?;
    let result = benchmark.start(&cancel).await;

    let verdict = report::print_report(&result);
    Ok(ExitCode::from(report::exit_code(
        &result,
        &verdict,
        config.load.exit_error_on_fail,
    )))
}
