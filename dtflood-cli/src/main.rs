//! dtflood CLI
//!
//! Command-line entry point for dispatching flood model runs to OSCAR
//! services and for the individual steps of a dispatch.
//!
//! Exit codes: 0 success, 1 failure, 2 missing credentials (or service
//! created by `check`), 124 wait timed out, 130 cancelled.

mod commands;
mod config;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::Config;
use dtflood_client::DEFAULT_TOKEN_URL;
use dtflood_dispatch::DispatchError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code when interrupted by Ctrl-C
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(name = "dtflood")]
#[command(about = "Dispatch flood model runs to OSCAR services", long_about = None)]
struct Cli {
    /// OSCAR cluster URL
    #[arg(long, env = "DTFLOOD_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// OSCAR user (basic auth)
    #[arg(long, env = "DTFLOOD_USER", global = true)]
    user: Option<String>,

    /// OSCAR password (basic auth)
    #[arg(long, env = "DTFLOOD_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// OIDC access token
    #[arg(long, env = "DTFLOOD_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// OIDC refresh token, exchanged for an access token
    #[arg(long, env = "DTFLOOD_REFRESH_TOKEN", hide_env_values = true, global = true)]
    refresh_token: Option<String>,

    /// OIDC token endpoint used for the refresh token exchange
    #[arg(long, env = "DTFLOOD_TOKEN_URL", default_value = DEFAULT_TOKEN_URL, global = true)]
    token_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries command output only.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dtflood=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::new(
        cli.endpoint,
        cli.user,
        cli.password,
        cli.token,
        cli.refresh_token,
        cli.token_url,
    );

    let code = tokio::select! {
        result = handle_command(cli.command, &config) => match result {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                exit_code(&e)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, abandoning dispatch");
            eprintln!("{}", "Cancelled".yellow());
            EXIT_CANCELLED
        }
    };

    std::process::exit(code);
}

/// Maps a failure to its process exit code
fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<DispatchError>()
        .map(DispatchError::exit_code)
        .unwrap_or(1)
}
