//! chatctl - command-line front end for the chat service.

use clap::Parser;
use std::process::ExitCode;

use chatctl::cli::Commands;
use chatctl::logging;

#[tokio::main]
async fn main() -> ExitCode {
    // Hold the guard so the file writer flushes on exit
    let _guard = match logging::init() {
        Ok((guard, _)) => Some(guard),
        Err(e) => {
            eprintln!("Warning: failed to initialize logging: {}", e);
            None
        }
    };

    let args = Commands::parse();

    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(target: logging::EXIT_TARGET, "{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
