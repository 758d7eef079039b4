use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::error::{CritFixError, Result};

/// What `ensure_backup` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    Created,
    AlreadyExists,
}

/// Write-once sibling backups: `<file><suffix>` next to each source file.
///
/// A backup is never overwritten, so it always holds the content the file
/// had before critfix first touched it.
#[derive(Debug, Clone)]
pub struct BackupManager {
    suffix: String,
}

impl BackupManager {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Path of the backup for `path`
    pub fn backup_path(&self, path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(&self.suffix);
        PathBuf::from(name)
    }

    /// Original file a backup belongs to, if `backup` carries our suffix
    pub fn original_path(&self, backup: &Path) -> Option<PathBuf> {
        let name = backup.file_name()?.to_str()?;
        let original = name.strip_suffix(self.suffix.as_str())?;
        if original.is_empty() {
            return None;
        }
        Some(backup.with_file_name(original))
    }

    /// Copy the file's current bytes to its backup unless one already exists
    pub fn ensure_backup(&self, path: &Path) -> Result<BackupStatus> {
        let backup_path = self.backup_path(path);
        if check_existing(&backup_path)? {
            tracing::debug!("Backup already exists: {}", backup_path.display());
            return Ok(BackupStatus::AlreadyExists);
        }

        let bytes = fs::read(path).map_err(|e| CritFixError::backup(path, e))?;

        // create_new refuses to clobber a backup that appeared after the check
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&backup_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                check_existing(&backup_path)?;
                return Ok(BackupStatus::AlreadyExists);
            }
            Err(e) => return Err(CritFixError::backup(&backup_path, e)),
        };

        if let Err(e) = file.write_all(&bytes).and_then(|_| file.sync_all()) {
            // A truncated backup would be worse than none
            drop(file);
            let _ = fs::remove_file(&backup_path);
            return Err(CritFixError::backup(&backup_path, e));
        }

        tracing::debug!("Backup created: {}", backup_path.display());
        Ok(BackupStatus::Created)
    }

    /// Overwrite `original` with the bytes of its backup. The backup stays.
    pub fn restore(&self, original: &Path) -> Result<()> {
        let backup_path = self.backup_path(original);
        let bytes = fs::read(&backup_path).map_err(|e| CritFixError::filesystem(&backup_path, e))?;
        fs::write(original, bytes).map_err(|e| CritFixError::filesystem(original, e))?;

        tracing::info!("Restored {} from backup", original.display());
        Ok(())
    }

    /// Find backups under `root`, sorted by path
    pub fn find_backups(&self, root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut backups = Vec::new();

        for entry in WalkDir::new(root).follow_links(false).max_depth(max_depth) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() > 0 => {
                    tracing::warn!("Skipping {}: {}", e.path().unwrap_or(root).display(), e);
                    continue;
                }
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    return Err(CritFixError::filesystem(path, e.into()));
                }
            };

            if entry.file_type().is_file() && self.original_path(entry.path()).is_some() {
                backups.push(entry.into_path());
            }
        }

        backups.sort();
        Ok(backups)
    }
}

/// Whether a usable backup is already in place. Anything other than a
/// regular file at the backup path cannot hold the original bytes.
fn check_existing(backup_path: &Path) -> Result<bool> {
    match fs::symlink_metadata(backup_path) {
        Ok(meta) if meta.file_type().is_file() => Ok(true),
        Ok(_) => Err(CritFixError::backup(
            backup_path,
            io::Error::new(io::ErrorKind::AlreadyExists, "backup path is not a regular file"),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CritFixError::backup(backup_path, e)),
    }
}
