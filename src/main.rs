//! mirrorsync: keep a replica directory identical to a source directory
//!
//! Runs a synchronization pass every INTERVAL seconds until killed, appending
//! every action to LOG_FILE and echoing it to standard output.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use mirrorsync::cli::Args;
use mirrorsync::log::ActionLog;
use mirrorsync::sync::run_pass;
use tracing::{info, Level};

fn main() -> Result<()> {
    // Usage errors exit with status 1; --help and --version exit cleanly
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Diagnostics go to stderr so stdout carries only the action log
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    args.validate().context("Invalid arguments")?;

    info!("Starting mirrorsync v{}", env!("CARGO_PKG_VERSION"));
    info!("Source: {}", args.source.display());
    info!("Replica: {}", args.replica.display());
    info!("Interval: {:?}", args.interval());
    info!("Log file: {}", args.log_file.display());
    info!("Copy method: {:?}", args.copy_method);

    args.prepare_replica()?;

    let config = args.sync_config();
    let mut log = ActionLog::file_and_console(&args.log_file).context("Cannot open log file")?;

    let report = args
        .scheduler()
        .run(|| run_pass(&config, &mut log))
        .context("Synchronization aborted")?;

    info!(
        "Finished: {} passes completed, {} failed",
        report.passes_completed, report.passes_failed
    );
    Ok(())
}
