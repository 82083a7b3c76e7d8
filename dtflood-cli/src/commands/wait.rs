//! Wait command handler
//!
//! Blocks on a bucket notification subscription and prints the first
//! created object, optionally only one whose key contains a given id.

use anyhow::{Context, Result, bail};
use clap::Args;
use dtflood_core::domain::notification::OBJECT_CREATED;
use dtflood_core::domain::storage::StoragePath;
use dtflood_dispatch::DispatchError;
use dtflood_dispatch::service::wait_for_output;
use std::time::Duration;
use tracing::info;

use super::storage::{StorageArgs, parse_storage_path};

/// Arguments of `dtflood wait`
#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Location to watch as `bucket/prefix`
    #[arg(short, long, value_parser = parse_storage_path)]
    pub bucket: StoragePath,

    /// Only accept keys containing this text (usually an execution id)
    #[arg(long)]
    pub contains: Option<String>,

    /// Give up after this many seconds
    #[arg(long, env = "DTFLOOD_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Print the whole event as JSON instead of the key
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub storage: StorageArgs,
}

/// Handle `wait`
pub async fn handle_wait(args: WaitArgs) -> Result<i32> {
    let timeout = wait_limit(args.timeout)?;
    let client = args.storage.client();
    let mut stream = client
        .listen(&args.bucket.bucket, &args.bucket.prefix, &[OBJECT_CREATED])
        .await
        .with_context(|| format!("Could not subscribe to {}", args.bucket))?;

    info!("Waiting for objects under {} on {}", args.bucket, client.endpoint());
    let contains = args.contains.as_deref().filter(|c| !c.is_empty());
    let wait = wait_for_output(&mut stream, contains);
    let event = match timeout {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| DispatchError::WaitTimedOut(limit))??,
        None => wait.await?,
    };

    if args.json {
        println!("{}", serde_json::to_string(&event)?);
    } else {
        println!("{}/{}", event.bucket, event.key);
    }

    Ok(0)
}

/// Converts `--timeout` into a wait deadline; zero is rejected
fn wait_limit(timeout: Option<u64>) -> Result<Option<Duration>> {
    match timeout {
        Some(0) => bail!("wait timeout must be greater than 0"),
        other => Ok(other.map(Duration::from_secs)),
    }
}
