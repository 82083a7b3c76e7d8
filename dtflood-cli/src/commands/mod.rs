//! Commands module
//!
//! Defines all CLI commands and their handlers. Each handler returns the
//! process exit code on success.

mod check;
mod run;
mod storage;
mod upload;
mod wait;

pub use check::CheckArgs;
pub use run::RunArgs;
pub use upload::UploadArgs;
pub use wait::WaitArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Package a directory, run it on a service and unpack the output
    Run(RunArgs),
    /// Make sure a service exists, creating it from its template if needed
    Check(CheckArgs),
    /// Package one input and upload it straight to a bucket
    Upload(UploadArgs),
    /// Wait for the first object created under a bucket path
    Wait(WaitArgs),
}

/// Handle commands
///
/// Routes commands to their respective handlers.
pub async fn handle_command(command: Commands, config: &Config) -> Result<i32> {
    match command {
        Commands::Run(args) => run::handle_run(args, config).await,
        Commands::Check(args) => check::handle_check(args, config).await,
        Commands::Upload(args) => upload::handle_upload(args).await,
        Commands::Wait(args) => wait::handle_wait(args).await,
    }
}
