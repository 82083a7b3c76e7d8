//! Upload command handler
//!
//! Packages one input file or directory as `tar.gz` and uploads it under a
//! fresh execution key, using storage credentials directly.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use dtflood_core::domain::job::UploadKey;
use dtflood_core::domain::storage::StoragePath;
use dtflood_dispatch::packager;
use std::path::PathBuf;

use super::storage::{StorageArgs, parse_storage_path};

/// Arguments of `dtflood upload`
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File or directory to upload
    #[arg(short, long)]
    pub input: PathBuf,

    /// Destination as `bucket/prefix`
    #[arg(short, long, value_parser = parse_storage_path)]
    pub bucket: StoragePath,

    #[command(flatten)]
    pub storage: StorageArgs,
}

/// Handle `upload`
pub async fn handle_upload(args: UploadArgs) -> Result<i32> {
    let input = args.input.clone();
    let archive = tokio::task::spawn_blocking(move || packager::package_gz(&input))
        .await
        .context("Packaging task failed")?
        .with_context(|| format!("Could not package {}", args.input.display()))?;

    let file_name = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let upload_key = UploadKey::generate(&file_name);
    let key = args.bucket.key_for(&upload_key.to_string());

    let client = args.storage.client();
    let sent = client
        .put_object(&args.bucket.bucket, &key, &archive)
        .await
        .with_context(|| format!("Upload to {}/{} failed", args.bucket.bucket, key))?;

    if let Err(e) = tokio::fs::remove_file(&archive).await {
        tracing::warn!("Failed to remove {}: {}", archive.display(), e);
    }

    println!("{} Uploaded {} bytes", "✓".green().bold(), sent);
    println!("  Key:       {}/{}", args.bucket.bucket, key);
    println!("  Execution: {}", upload_key.execution_id().cyan());

    Ok(0)
}
