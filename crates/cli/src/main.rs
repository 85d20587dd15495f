use crate::{
    commands::{Commands, ValidateArgs},
    error::CliError,
    shutdown::{ExitCode, InterruptHandle},
};
use clap::Parser;
use engine_runtime::{execution::factory, report::RunSummary};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "wa-validator",
    version = "0.1.0",
    about = "Bulk WhatsApp contact validation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout only carries the run result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = ExitCode::for_usage(&err);
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let interrupt = InterruptHandle::new(CancellationToken::new());
    interrupt.listen();

    let code = match cli.command {
        Commands::Validate(args) => match validate(&args, &interrupt).await {
            Ok(summary) => {
                ExitCode::for_completed_run(summary.interrupted || interrupt.received().is_some())
            }
            Err(err) => {
                error!(error = %err, "Validation failed");
                eprintln!("Error: {err}");
                err.exit_code()
            }
        },
    };

    std::process::exit(code.as_i32());
}

async fn validate(
    args: &ValidateArgs,
    interrupt: &InterruptHandle,
) -> Result<RunSummary, CliError> {
    if !args.input.is_file() {
        return Err(CliError::InputNotFound(args.input.clone()));
    }

    let settings = args.settings()?;
    info!(
        base_url = %settings.base_url,
        concurrency = settings.concurrency,
        batch_size = settings.batch_size,
        max_retries = settings.max_retries,
        "Loaded settings"
    );

    let clock = Instant::now();
    let summary = factory::run_csv(
        settings,
        &args.input,
        &args.output,
        interrupt.cancel_token(),
    )
    .await?;

    if let Some(path) = &args.report {
        tokio::fs::write(path, summary.to_json()?).await?;
        info!(report = %path.display(), "Run summary written");
    }

    println!(
        "Processed {} rows into {}",
        summary.rows_processed,
        args.output.display()
    );
    println!("Done in {:.1}s", clock.elapsed().as_secs_f64());

    Ok(summary)
}
