//! EchoEndpoint CLI - Live webhook inbox in the terminal
//!
//! Usage:
//!   echoendpoint new              Create an endpoint and make it active
//!   echoendpoint use <TOKEN>      Switch to an existing endpoint
//!   echoendpoint [watch]          Live inbox (default command)
//!   echoendpoint list             Print captured requests
//!   echoendpoint show <ID>        Print one request
//!   echoendpoint clear            Delete every captured request
//!   echoendpoint export           Save all requests as JSON
//!   echoendpoint open             Open the web dashboard
//!   echoendpoint response ...     Configure the canned response

mod client;
mod commands;
mod config;
mod inbox;
mod stream;
mod tui;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use echoendpoint_common::RequestId;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "echoendpoint")]
#[command(author = "EchoEndpoint Team")]
#[command(version)]
#[command(about = "Inspect webhooks delivered to your endpoint, live", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend URL (overrides the config file)
    #[arg(long, global = true, env = "ECHOENDPOINT_SERVER")]
    server: Option<String>,

    /// Endpoint token (overrides the config file)
    #[arg(long, global = true, env = "ECHOENDPOINT_TOKEN")]
    token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new endpoint and make it active
    New,

    /// Switch to an existing endpoint
    Use {
        /// Endpoint token
        #[arg(value_name = "TOKEN")]
        endpoint: String,
    },

    /// Live inbox of captured requests
    Watch {
        /// Print requests line by line instead of the full-screen view
        #[arg(long)]
        plain: bool,
    },

    /// Print one page of captured requests
    List {
        /// Page size (defaults to the configured page limit)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Print the detail of one captured request
    Show {
        /// Request id
        id: RequestId,

        /// Show the body exactly as stored
        #[arg(long)]
        raw: bool,

        /// Write the decoded body bytes to a file
        #[arg(long, value_name = "PATH")]
        save_body: Option<PathBuf>,
    },

    /// Delete every captured request
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Save every captured request as JSON
    Export {
        /// Output file (default: requests-<TOKEN>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Open the web dashboard in a browser
    Open,

    /// Configure what the endpoint answers with
    Response {
        #[command(subcommand)]
        action: ResponseAction,
    },
}

#[derive(Subcommand)]
enum ResponseAction {
    /// Show the current response
    Get,

    /// Set the response
    Set {
        /// Status code (100-599)
        #[arg(short, long, default_value_t = 200)]
        status: u16,

        /// Response body
        #[arg(short, long)]
        body: Option<String>,

        /// Read the response body from a file
        #[arg(long, value_name = "PATH")]
        body_file: Option<PathBuf>,

        /// Content type
        #[arg(short = 't', long, default_value = "application/json")]
        content_type: String,
    },

    /// Go back to the default response
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Ensure config directories exist
    config::ensure_dirs()?;

    let command = cli.command.unwrap_or(Commands::Watch { plain: false });

    // The full-screen view owns the terminal, so it logs to a file
    let log_file = match command {
        Commands::Watch { plain: false } => Some(open_log_file()?),
        _ => None,
    };
    init_logging(cli.verbose, log_file);

    let config = Config::load()?.with_overrides(cli.server, cli.token);

    match command {
        Commands::New => {
            commands::endpoint::create(&config).await?;
        }

        Commands::Use { endpoint } => {
            commands::endpoint::use_token(endpoint)?;
        }

        Commands::Watch { plain } => {
            commands::watch::run(&config, plain).await?;
        }

        Commands::List { limit, offset } => {
            commands::requests::list(&config, limit, offset).await?;
        }

        Commands::Show { id, raw, save_body } => {
            commands::requests::show(&config, id, raw, save_body).await?;
        }

        Commands::Clear { yes } => {
            commands::requests::clear(&config, yes).await?;
        }

        Commands::Export { output } => {
            commands::requests::export(&config, output).await?;
        }

        Commands::Open => {
            commands::endpoint::open_dashboard(&config)?;
        }

        Commands::Response { action } => match action {
            ResponseAction::Get => commands::response::get(&config).await?,
            ResponseAction::Set {
                status,
                body,
                body_file,
                content_type,
            } => {
                let options = commands::response::SetOptions {
                    status,
                    body,
                    body_file,
                    content_type,
                };
                commands::response::set(&config, options).await?;
            }
            ResponseAction::Reset => commands::response::reset(&config).await?,
        },
    }

    Ok(())
}

fn open_log_file() -> Result<File> {
    let path = config::logs_dir().join("watch.log");
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

fn init_logging(verbose: bool, log_file: Option<File>) {
    let default_filter = if verbose {
        "debug".to_string()
    } else {
        "warn,echoendpoint_cli=info".to_string()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .init(),
        None => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().without_time().with_writer(std::io::stderr))
            .init(),
    }
}
