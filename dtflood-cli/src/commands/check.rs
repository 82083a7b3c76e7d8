//! Check command handler
//!
//! Resolves a service without submitting anything. Exits 2 when the
//! service had to be created so scripts can tell a fresh deployment apart.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use dtflood_core::domain::service::Resolution;
use dtflood_dispatch::{HttpServiceRepository, ServiceResolver};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;

/// Exit code signalling that the service was created
const EXIT_CREATED: i32 = 2;

/// Arguments of `dtflood check`
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Name of the OSCAR service
    #[arg(short, long)]
    pub service: String,

    /// Directory holding `<service>.yaml` and its script
    #[arg(long, default_value = ".")]
    pub service_dir: PathBuf,
}

/// Handle `check`
pub async fn handle_check(args: CheckArgs, config: &Config) -> Result<i32> {
    let client = config.oscar_client().await?;
    let resolver = ServiceResolver::new(Arc::new(HttpServiceRepository::new(client)));

    let info = resolver.check_connection().await?;
    let (service, resolution) = resolver
        .resolve(&args.service, &args.service_dir)
        .await
        .with_context(|| format!("Could not resolve service {}", args.service))?;

    println!(
        "{} OSCAR {} at {}",
        "✓".green().bold(),
        info.version,
        config.endpoint.as_deref().unwrap_or_default()
    );
    println!("  Service: {} ({})", service.name.cyan(), resolution);
    println!("  Input:   {}", service.input);
    println!("  Output:  {}", service.output);
    println!("  Storage: {}", service.storage.endpoint.dimmed());

    Ok(exit_code(resolution))
}

fn exit_code(resolution: Resolution) -> i32 {
    match resolution {
        Resolution::Existing => 0,
        Resolution::Created => EXIT_CREATED,
    }
}
