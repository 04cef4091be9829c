//! Datanode Inspector entry point.

use clap::Parser;
use dn_inspector::{logging, run, Args, EXIT_FATAL};
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = logging::init_logging(&args.log_level, args.json_logs) {
        eprintln!("dn-inspector: {err:#}");
        return ExitCode::from(EXIT_FATAL);
    }

    match run(args).await {
        Ok(status) => status.exit_code(),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
