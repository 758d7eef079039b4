use anyhow::{Context, Result};
use std::path::PathBuf;

use critfix::core::output::RestoreReport;
use critfix::core::{OutputFormat, OutputWriter};
use critfix::engine::BackupManager;
use critfix::Config;

/// Restore originals from backups; returns false when any restore failed
pub fn run(
    path: PathBuf,
    recursive: bool,
    yes: bool,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> Result<bool> {
    let config = Config::load(config.as_deref())?;
    config.batch.validate()?;
    let backups = BackupManager::new(config.batch.backup_suffix);

    let found = backups
        .find_backups(&path, recursive || config.batch.recursive)
        .with_context(|| format!("Failed to scan {}", path.display()))?;

    let mut report = RestoreReport::default();
    for backup in found {
        let Some(original) = backups.original_path(&backup) else {
            continue;
        };

        if !yes {
            report.pending.push(original);
            continue;
        }

        match backups.restore(&original) {
            Ok(()) => report.restored.push(original),
            Err(e) => {
                tracing::warn!("Failed to restore {}: {}", original.display(), e);
                report.errors.push(format!("{}: {}", original.display(), e));
            }
        }
    }

    OutputWriter::new(format).write_restore_report(&report)?;

    Ok(report.errors.is_empty())
}
