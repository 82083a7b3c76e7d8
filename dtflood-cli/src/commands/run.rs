//! Run command handler
//!
//! Performs the full dispatch cycle for one job directory.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use dtflood_dispatch::{DispatchConfig, DispatchOutcome};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;

/// Arguments of `dtflood run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory with the model inputs
    #[arg(short, long)]
    pub input: PathBuf,

    /// Name of the OSCAR service
    #[arg(short, long)]
    pub service: String,

    /// Directory holding `<service>.yaml` and its script
    #[arg(long, default_value = ".")]
    pub service_dir: PathBuf,

    /// Directory the output is unpacked into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Give up waiting for the output after this many seconds
    #[arg(long, env = "DTFLOOD_TIMEOUT")]
    pub timeout: Option<u64>,
}

impl RunArgs {
    fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::new(&self.service, &self.service_dir, &self.output)
            .with_timeout(self.timeout.map(Duration::from_secs))
    }
}

/// Handle `run`
pub async fn handle_run(args: RunArgs, config: &Config) -> Result<i32> {
    let dispatch_config = args.dispatch_config();
    dispatch_config
        .validate()
        .context("Invalid dispatch configuration")?;

    let client = config.oscar_client().await?;
    let outcome = dtflood_dispatch::submit_and_await(&args.input, dispatch_config, client)
        .await
        .with_context(|| format!("Dispatch of {} failed", args.input.display()))?;

    print_outcome(&args.service, &outcome);
    Ok(0)
}

fn print_outcome(service: &str, outcome: &DispatchOutcome) {
    println!("{}", "✓ Dispatch completed".green().bold());
    println!("  Service:   {} ({})", service.cyan(), outcome.resolution);
    println!("  Execution: {}", outcome.execution_id.dimmed());
    println!("  Output:    {}", outcome.output_key);
    println!(
        "  Unpacked {} file(s) into {}",
        outcome.files.len(),
        outcome.output_dir.display()
    );
    for file in &outcome.files {
        println!("    {} {}", "▸".cyan(), file.display());
    }
}
