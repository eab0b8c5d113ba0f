//! Crash-safe snapshot files
//!
//! # Crash Safety
//!
//! Snapshot files are created with the write-fsync-rename pattern:
//! 1. Stream into a temporary file (`.<name>.snapshot.tmp`) next to the target
//! 2. fsync the temporary file
//! 3. Atomic rename onto the target path
//! 4. fsync the parent directory
//!
//! A crash or a failed producer therefore never leaves a partial snapshot at
//! the target path. Stray temporary files from a crash are removed by
//! [`cleanup_temp_files`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use tangle_core::{BlockId, MilestoneTimestamp, Output, ProtocolParameters};

use crate::config::SnapshotConfig;
use crate::consumer::SnapshotConsumer;
use crate::error::SnapshotResult;
use crate::format::header::{FileHeader, ReadFileHeader};
use crate::producer::RecordProducer;
use crate::reader::SnapshotStreamReader;
use crate::types::{MilestoneDiff, ReadSummary, SnapshotInfo};
use crate::writer::SnapshotStreamWriter;

/// Suffix of temporary snapshot files
pub const TEMP_FILE_SUFFIX: &str = ".snapshot.tmp";

/// Temporary path used while writing `path`
pub fn temp_path_for(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("snapshot path has no file name: {}", path.display()),
        )
    })?;
    let temp_name = format!(".{}{}", file_name.to_string_lossy(), TEMP_FILE_SUFFIX);
    Ok(path.with_file_name(temp_name))
}

/// Write a snapshot file atomically.
///
/// On error the temporary file is removed and whatever was at `path`
/// before is left untouched. Once the rename has replaced `path` the write
/// counts as done: a failing fsync of the parent directory is only logged.
pub fn write_snapshot_file<S, O, D>(
    path: &Path,
    config: &SnapshotConfig,
    timestamp: MilestoneTimestamp,
    header: &FileHeader,
    sep_producer: &mut S,
    output_producer: &mut O,
    ms_diff_producer: &mut D,
) -> SnapshotResult<SnapshotInfo>
where
    S: RecordProducer<BlockId> + ?Sized,
    O: RecordProducer<Output> + ?Sized,
    D: RecordProducer<MilestoneDiff> + ?Sized,
{
    let temp_path = temp_path_for(path)?;

    let result = write_temp_file(
        &temp_path,
        config,
        timestamp,
        header,
        sep_producer,
        output_producer,
        ms_diff_producer,
    )
    .and_then(|info| {
        fs::rename(&temp_path, path)?;
        Ok(info)
    });

    match result {
        Ok(info) => {
            if config.sync_on_write {
                sync_dir_after_rename(path, sync_parent_dir);
            }
            info!(
                target: "tangle::snapshot",
                path = %path.display(),
                bytes = info.bytes_written,
                "Snapshot file created"
            );
            Ok(info)
        }
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&temp_path) {
                if remove_err.kind() != io::ErrorKind::NotFound {
                    warn!(
                        target: "tangle::snapshot",
                        path = %temp_path.display(),
                        error = %remove_err,
                        "Failed to remove temporary snapshot file"
                    );
                }
            }
            Err(e)
        }
    }
}

fn write_temp_file<S, O, D>(
    temp_path: &Path,
    config: &SnapshotConfig,
    timestamp: MilestoneTimestamp,
    header: &FileHeader,
    sep_producer: &mut S,
    output_producer: &mut O,
    ms_diff_producer: &mut D,
) -> SnapshotResult<SnapshotInfo>
where
    S: RecordProducer<BlockId> + ?Sized,
    O: RecordProducer<Output> + ?Sized,
    D: RecordProducer<MilestoneDiff> + ?Sized,
{
    // A stale temp file from an earlier crash is overwritten.
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(temp_path)?;

    let mut writer = SnapshotStreamWriter::new(
        BufWriter::with_capacity(config.buffer_capacity, file),
        *config,
    );
    let info = writer.write(
        timestamp,
        header,
        sep_producer,
        output_producer,
        ms_diff_producer,
    )?;

    let file = writer
        .into_inner()
        .into_inner()
        .map_err(|e| e.into_error())?;
    if config.sync_on_write {
        file.sync_all()?;
    }
    Ok(info)
}

/// Returns whether the directory was synced.
fn sync_dir_after_rename(path: &Path, sync_dir: fn(&Path) -> io::Result<()>) -> bool {
    match sync_dir(path) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                target: "tangle::snapshot",
                path = %path.display(),
                error = %e,
                "Failed to sync snapshot directory after rename"
            );
            false
        }
    }
}

fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()
}

/// Read a snapshot file into `consumer`
pub fn read_snapshot_file<C>(
    path: &Path,
    params: &ProtocolParameters,
    config: &SnapshotConfig,
    consumer: &mut C,
) -> SnapshotResult<ReadSummary>
where
    C: SnapshotConsumer + ?Sized,
{
    let file = File::open(path)?;
    debug!(target: "tangle::snapshot", path = %path.display(), "Opened snapshot file");
    SnapshotStreamReader::new(BufReader::with_capacity(config.buffer_capacity, file), *config)
        .read(params, consumer)
}

/// Read only the header and timestamp of a snapshot file
pub fn read_snapshot_file_header(
    path: &Path,
    params: &ProtocolParameters,
) -> SnapshotResult<ReadFileHeader> {
    let file = File::open(path)?;
    SnapshotStreamReader::new(BufReader::new(file), SnapshotConfig::default()).read_header(params)
}

/// Remove temporary snapshot files left behind by crashes.
///
/// Returns the number of files removed. A missing directory counts as
/// nothing to clean up.
pub fn cleanup_temp_files(dir: &Path) -> io::Result<usize> {
    let mut count = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let is_temp = name.starts_with('.') && name.ends_with(TEMP_FILE_SUFFIX);
        if is_temp && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            count += 1;
        }
    }

    if count > 0 {
        debug!(
            target: "tangle::snapshot",
            dir = %dir.display(),
            count,
            "Removed temporary snapshot files"
        );
    }
    Ok(count)
}
