use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use log::debug;
use pyload_api::client::{PyLoadApi, PyLoadError, new_session};
use pyload_api::entities::{Destination, StatusServerResponse};
use pyload_api::utils::format_free_space;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// CLI for interacting with pyLoad.
#[derive(Debug, Parser)]
#[command(name = "pyload", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Base URL of pyLoad, e.g. https://example.com:8000/
    #[arg(long)]
    pub api_url: Option<String>,

    /// Username for pyLoad
    #[arg(long)]
    pub username: Option<String>,

    /// Password for pyLoad
    #[arg(long)]
    pub password: Option<String>,

    /// Path of the config file holding the stored connection settings
    #[arg(long, hide = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Display the general status information of pyLoad.
    Status,
    /// Toggle, pause or resume the download queue in pyLoad.
    Queue {
        /// Pause pyLoads download queue
        #[arg(short, long, conflicts_with = "resume")]
        pause: bool,
        /// Resume pyLoads download queue
        #[arg(short, long)]
        resume: bool,
    },
    /// Abort all currently running downloads in pyLoad.
    StopAll,
    /// Retry all failed downloads in pyLoad.
    Retry,
    /// Delete all finished files and packages from pyLoad.
    DeleteFinished,
    /// Restart the pyLoad service.
    Restart,
    /// Toggle the state of the auto-reconnect function of pyLoad.
    ToggleReconnect,
    /// Display the version of pyLoad.
    ServerVersion,
    /// Upload a container file to pyLoad.
    UploadContainer {
        /// Container file, e.g. a DLC
        container: PathBuf,
    },
    /// Add a package to pyLoad.
    AddPackage {
        package_name: String,
        /// Add package to the collector instead of the queue
        #[arg(long)]
        collector: bool,
        /// Link to add, prompted for when omitted
        #[arg(short, long = "link")]
        links: Vec<String>,
    },
}

/// User-facing message for each error kind
pub(crate) fn user_message(err: &PyLoadError) -> &'static str {
    match err {
        PyLoadError::CannotConnect { .. } => "Unable to connect to pyLoad",
        PyLoadError::InvalidAuth(_) => "Authentication failed, verify username and password",
        PyLoadError::Parser { .. } => "Unable to parse response from pyLoad",
    }
}

/// Runs one invocation: updates the stored config, logs in and executes a
/// single command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let Cli {
        api_url,
        username,
        password,
        config,
        command,
        ..
    } = cli;

    if command.is_none() && api_url.is_none() && username.is_none() && password.is_none() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let config_path = match config {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = Config::load(&config_path)?;
    config.merge(api_url, username, password);
    config.save(&config_path)?;

    let Some((api_url, username, password)) = config.credentials() else {
        bail!("URL, username, and password must be provided either via command line or config file.");
    };

    let Some(command) = command else {
        return Ok(());
    };

    // Local input is gathered before any request goes out
    let input = match &command {
        Commands::AddPackage { links, .. } if links.is_empty() => {
            let links = collect_links(&mut io::stdin().lock(), &mut io::stdout())?;
            CommandInput::Links(links)
        }
        Commands::UploadContainer { container } => CommandInput::Container(
            fs::read(container)
                .with_context(|| format!("Failed to read {}", container.display()))?,
        ),
        _ => CommandInput::None,
    };

    let session = new_session(REQUEST_TIMEOUT)?;
    let api = PyLoadApi::new(&session, api_url, username, password);
    api.login().await?;
    debug!("Logged in to {api_url} as {username}");

    let mut out = io::stdout();
    execute(&api, command, input, &mut out).await
}

enum CommandInput {
    None,
    Links(Vec<String>),
    Container(Vec<u8>),
}

async fn execute<W: Write>(
    api: &PyLoadApi<'_>,
    command: Commands,
    input: CommandInput,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::Status => {
            let status = api.get_status().await?;
            let free_space = api.free_space().await?;
            write!(out, "{}", render_status(&status, free_space))?;
        }
        Commands::Queue { pause, resume } => {
            if pause {
                api.pause().await?;
            } else if resume {
                api.unpause().await?;
            } else {
                api.toggle_pause().await?;
            }
            let status = api.get_status().await?;
            writeln!(
                out,
                "{} download queue.",
                if status.paused { "Paused" } else { "Resumed" }
            )?;
        }
        Commands::StopAll => {
            api.stop_all_downloads().await?;
            writeln!(out, "Aborted all running downloads.")?;
        }
        Commands::Retry => {
            api.restart_failed().await?;
            writeln!(out, "Retrying failed downloads.")?;
        }
        Commands::DeleteFinished => {
            api.delete_finished().await?;
            writeln!(out, "Deleted finished files and packages.")?;
        }
        Commands::Restart => {
            api.restart().await?;
            writeln!(out, "Restarting pyLoad...")?;
        }
        Commands::ToggleReconnect => {
            api.toggle_reconnect().await?;
            let status = api.get_status().await?;
            writeln!(
                out,
                "{} auto-reconnect",
                if status.reconnect_enabled {
                    "Enabled"
                } else {
                    "Disabled"
                }
            )?;
        }
        Commands::ServerVersion => {
            let version = api.version().await?;
            writeln!(out, "pyLoad version: {version}")?;
        }
        Commands::UploadContainer { container } => {
            let CommandInput::Container(data) = input else {
                bail!("Container file {} was not read", container.display());
            };
            let filename = file_name(&container);
            api.upload_container(&filename, &data).await?;
            writeln!(out, "Uploaded container {filename}.")?;
        }
        Commands::AddPackage {
            package_name,
            collector,
            links,
        } => {
            let links = match input {
                CommandInput::Links(prompted) => prompted,
                _ => links,
            };
            let destination = if collector {
                Destination::Collector
            } else {
                Destination::Queue
            };
            let id = api.add_package(&package_name, &links, destination).await?;
            writeln!(out, "Added package {package_name} (id {id}).")?;
        }
    }

    Ok(())
}

/// Prompts for links until an empty line or end of input
pub(crate) fn collect_links<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<Vec<String>> {
    let mut links = Vec::new();
    loop {
        write!(output, "Please enter a link: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let link = line.trim();
        if link.is_empty() {
            break;
        }
        links.push(link.to_string());
    }

    if links.is_empty() {
        bail!("No links entered");
    }
    Ok(links)
}

pub(crate) fn render_status(status: &StatusServerResponse, free_space: u64) -> String {
    format!(
        "Status:\n  \
         - Active downloads: {}\n  \
         - Items in queue: {}\n  \
         - Total downloads: {}\n  \
         - Download speed: {} ({} Mbit/s)\n  \
         - Free space: {}\n  \
         - Reconnect: {}\n  \
         - Queue : {}\n",
        status.active,
        status.queued,
        status.total,
        status.calculate_speed(),
        status.speed_mbit(),
        format_free_space(free_space),
        if status.reconnect_enabled {
            "Enabled"
        } else {
            "Disabled"
        },
        if status.paused { "Paused" } else { "Running" },
    )
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
