//! # pyload
//!
//! Command-line front end for the pyLoad API client.
//!
//! ```sh,ignore
//! pyload --api-url https://example.com:8000/ --username user --password pass status
//! ```
//!
//! Connection settings are stored in the user's config directory, so later
//! invocations only need the subcommand.

mod cli;
mod config;

use clap::Parser;
use pyload_api::client::PyLoadError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, run, user_message};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<PyLoadError>() {
                Some(api_err) => {
                    log::debug!("{api_err:?}");
                    eprintln!("Error: {}", user_message(api_err));
                }
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
