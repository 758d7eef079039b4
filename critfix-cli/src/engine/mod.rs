mod backup;
mod batch;
pub mod diff;
mod processor;
mod stats;

pub use backup::{BackupManager, BackupStatus};
pub use batch::{BatchReport, BatchRunner, Discovery};
pub use processor::{FileProcessor, FileReport, FileStatus, ProcessMode, RuleApplication, SourceFile};
pub use stats::Statistics;

use std::path::PathBuf;

use crate::config::Config;
use crate::core::error::Result;
use crate::rules::RuleSet;

/// Wire a batch runner for `root` from configuration
pub fn batch_from_config(config: &Config, root: PathBuf, mode: ProcessMode) -> Result<BatchRunner> {
    config.batch.validate()?;
    let rules = RuleSet::from_config(&config.rules)?;
    let backups = BackupManager::new(config.batch.backup_suffix.clone());
    let processor = FileProcessor::new(rules, backups, config.batch.backup_policy, mode);

    Ok(BatchRunner::new(root, Discovery::from_config(&config.batch), processor))
}
