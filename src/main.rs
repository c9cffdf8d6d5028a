use std::io::{self, BufWriter};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use fba::config::{CliArgs, Command, GenerateArgs};
use fba::{Config, Coordinator, Dispatch};
use tracing::info;

fn main() -> ExitCode {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    fba::logging::init();

    let result = match args.command {
        Some(Command::Worker) => fba::worker::serve(io::stdin().lock(), io::stdout().lock())
            .context("worker failed"),
        None => generate(args.generate),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // A closed stdout (e.g. piped into `head`) is not a failure.
            let broken_pipe = err
                .chain()
                .filter_map(|cause| cause.downcast_ref::<io::Error>())
                .any(|e| e.kind() == io::ErrorKind::BrokenPipe);
            if broken_pipe {
                return ExitCode::SUCCESS;
            }
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let dispatch = if args.in_process {
        Dispatch::InProcess
    } else {
        Dispatch::current_exe().context("cannot locate own executable for worker processes")?
    };
    let config = Config::try_from(args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let coordinator = Coordinator::new(config, dispatch);
    let mut out = BufWriter::new(io::stdout().lock());
    let summary = runtime
        .block_on(coordinator.run(&mut out))
        .context("generation failed")?;

    info!(
        directories = summary.directories,
        skipped = summary.skipped,
        created = summary.created,
        failed = summary.failed,
        failed_chunks = summary.failed_chunks,
        "done"
    );
    Ok(())
}
