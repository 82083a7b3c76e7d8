//! Job packaging
//!
//! Turns a job directory into a single tar archive before upload and
//! extracts the archive a service returns. Entries are stored relative to
//! the packaged directory, so unpacking into a fresh directory reproduces
//! the original layout.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors raised while packaging or unpacking
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Input {0} does not exist")]
    MissingInput(PathBuf),

    #[error("Input {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Input directory {0} is empty")]
    EmptyInput(PathBuf),

    #[error("Archive entry {0} would be written outside the destination")]
    UnsafeEntry(PathBuf),

    #[error("Packaging I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PackageError>;

/// Archives the contents of `dir` into `<dir>.tar` next to it
///
/// # Returns
/// Path of the written archive
pub fn package(dir: &Path) -> Result<PathBuf> {
    let dir = existing_dir(dir)?;

    let mut entries = fs::read_dir(&dir)?.collect::<std::io::Result<Vec<_>>>()?;
    if entries.is_empty() {
        return Err(PackageError::EmptyInput(dir));
    }
    entries.sort_by_key(|entry| entry.file_name());

    let archive_path = sibling_archive(&dir, "tar");
    info!("Compressing input {} into {}", dir.display(), archive_path.display());

    let mut builder = tar::Builder::new(File::create(&archive_path)?);
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        debug!("Adding {}", path.display());

        // Follows symlinks, so a linked directory is archived with its contents.
        if path.is_dir() {
            builder.append_dir_all(&name, &path)?;
        } else {
            builder.append_path_with_name(&path, &name)?;
        }
    }
    builder.into_inner()?.sync_all()?;

    Ok(archive_path)
}

/// Archives a file or directory, including its own name, as `<path>.tar.gz`
///
/// Used for direct uploads where the remote side expects a single named
/// entry.
pub fn package_gz(path: &Path) -> Result<PathBuf> {
    let path = path
        .canonicalize()
        .map_err(|_| PackageError::MissingInput(path.to_path_buf()))?;
    let name = path
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| PackageError::MissingInput(path.clone()))?;

    let archive_path = sibling_archive(&path, "tar.gz");
    info!("Compressing {} into {}", path.display(), archive_path.display());

    let encoder = GzEncoder::new(File::create(&archive_path)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    if path.is_dir() {
        builder.append_dir_all(&name, &path)?;
    } else {
        builder.append_path_with_name(&path, &name)?;
    }

    let mut file = builder.into_inner()?.finish()?;
    file.flush()?;

    Ok(archive_path)
}

/// Extracts `archive` into `dest`, creating `dest` if needed
///
/// Gzip-compressed archives are detected by their magic bytes.
///
/// # Returns
/// Relative paths of all extracted entries, in archive order
pub fn unpack(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    info!("Decompressing output {} into {}", archive.display(), dest.display());
    fs::create_dir_all(dest)?;

    let mut file = File::open(archive)?;
    let mut magic = Vec::with_capacity(2);
    Read::by_ref(&mut file).take(2).read_to_end(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    let reader: Box<dyn Read> = if magic == GZIP_MAGIC {
        debug!("Archive is gzip-compressed");
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut tar = tar::Archive::new(reader);
    let mut unpacked = Vec::new();
    for entry in tar.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        if !entry.unpack_in(dest)? {
            return Err(PackageError::UnsafeEntry(path));
        }
        unpacked.push(path);
    }

    Ok(unpacked)
}

fn existing_dir(dir: &Path) -> Result<PathBuf> {
    let dir = dir
        .canonicalize()
        .map_err(|_| PackageError::MissingInput(dir.to_path_buf()))?;

    if !dir.is_dir() {
        return Err(PackageError::NotADirectory(dir));
    }

    Ok(dir)
}

/// `<parent>/<name>.<extension>` for a canonical path
fn sibling_archive(path: &Path, extension: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "job".into());
    name.push(".");
    name.push(extension);

    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
