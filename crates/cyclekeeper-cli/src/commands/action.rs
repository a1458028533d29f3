//! Action command implementation: the built-in action handler.
//!
//! Performs exactly one filesystem mutation per invocation. Copies and moves
//! land inside the destination directory under the entry's own name.

use crate::cli::ActionArgs;
use crate::error::{CliError, Result};
use anyhow::Context;
use cyclekeeper_domain::Operation;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Execute the action command.
pub fn execute_action(args: ActionArgs, verbose: bool) -> Result<()> {
    let destination = args.destination();
    match (args.operation, destination) {
        (Operation::Delete, _) => {
            delete_entry(&args.source)?;
            if verbose {
                tracing::info!("deleted {}", args.source.display());
            }
        }
        (Operation::Copy, Some(dest)) => {
            let target = copy_entry(&args.source, &dest, args.cheap)?;
            if verbose {
                tracing::info!("copied {} -> {}", args.source.display(), target.display());
            }
        }
        (Operation::Move, Some(dest)) => {
            let target = move_entry(&args.source, &dest)?;
            if verbose {
                tracing::info!("moved {} -> {}", args.source.display(), target.display());
            }
        }
        (operation, None) => {
            return Err(CliError::InvalidInput(format!(
                "{} requires a destination directory",
                operation
            )));
        }
    }
    Ok(())
}

/// Copy `source` (file or directory tree) into the directory `dest_dir`.
///
/// Returns the path of the copy. With `cheap`, files are hard-linked when
/// the filesystem allows it.
pub fn copy_entry(source: &Path, dest_dir: &Path, cheap: bool) -> Result<PathBuf> {
    let target = prepare_target(source, dest_dir)?;

    if !source.is_dir() {
        copy_file(source, &target, cheap)?;
        return Ok(target);
    }

    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("failed to traverse {}", source.display()))?;
        let relative = entry.path().strip_prefix(source).with_context(|| {
            format!(
                "failed to strip prefix {} from {}",
                source.display(),
                entry.path().display()
            )
        })?;
        let target_path = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path).with_context(|| {
                format!("failed to create directory {}", target_path.display())
            })?;
        } else {
            copy_file(entry.path(), &target_path, cheap)?;
        }
    }

    Ok(target)
}

/// Move `source` into the directory `dest_dir`.
///
/// Falls back to copy-then-remove when a rename is not possible (for
/// example across filesystems).
pub fn move_entry(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let target = prepare_target(source, dest_dir)?;

    if target.exists() {
        // an identical file already in place just needs the source removed
        if source.is_file() && target.is_file() && same_contents(source, &target)? {
            delete_entry(source)?;
            return Ok(target);
        }
        return Err(CliError::NonIdenticalTarget(target));
    }

    if let Err(e) = fs::rename(source, &target) {
        tracing::debug!("rename of {} failed ({}), copying instead", source.display(), e);
        copy_entry(source, dest_dir, false)?;
        delete_entry(source)?;
    }

    Ok(target)
}

/// Remove a file or a whole directory tree.
pub fn delete_entry(source: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(source)
        .with_context(|| format!("failed to inspect {}", source.display()))?;

    if metadata.is_dir() {
        fs::remove_dir_all(source)
            .with_context(|| format!("failed to remove directory {}", source.display()))?;
    } else {
        fs::remove_file(source)
            .with_context(|| format!("failed to remove {}", source.display()))?;
    }
    Ok(())
}

fn prepare_target(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| CliError::InvalidInput(format!("{} has no entry name", source.display())))?;

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("failed to create destination {}", dest_dir.display()))?;
    Ok(dest_dir.join(name))
}

fn copy_file(from: &Path, to: &Path, cheap: bool) -> Result<()> {
    if to.exists() {
        if to.is_file() && same_contents(from, to)? {
            return Ok(());
        }
        return Err(CliError::NonIdenticalTarget(to.to_path_buf()));
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    if cheap && fs::hard_link(from, to).is_ok() {
        return Ok(());
    }

    fs::copy(from, to)
        .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Byte-for-byte comparison, short-circuiting on size
fn same_contents(a: &Path, b: &Path) -> Result<bool> {
    let open = |path: &Path| -> Result<(u64, BufReader<File>)> {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("failed to inspect {}", path.display()))?
            .len();
        Ok((len, BufReader::new(file)))
    };

    let (len_a, mut reader_a) = open(a)?;
    let (len_b, mut reader_b) = open(b)?;
    if len_a != len_b {
        return Ok(false);
    }

    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];
    loop {
        let n = reader_a
            .read(&mut buf_a)
            .with_context(|| format!("failed to read {}", a.display()))?;
        if n == 0 {
            return Ok(true);
        }
        reader_b
            .read_exact(&mut buf_b[..n])
            .with_context(|| format!("failed to read {}", b.display()))?;
        if buf_a[..n] != buf_b[..n] {
            return Ok(false);
        }
    }
}
