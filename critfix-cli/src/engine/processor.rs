use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::backup::{BackupManager, BackupStatus};
use super::diff::{self, LineDelta};
use super::stats::Statistics;
use crate::config::BackupPolicy;
use crate::core::error::{CritFixError, Result};
use crate::rules::{RuleKind, RuleSet, Skip};

/// Processing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessMode {
    /// Take backups and write files
    Execute,

    /// Run the rules only; nothing on disk is touched
    DryRun,
}

/// A file loaded for processing
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
    original_content: String,
}

impl SourceFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CritFixError::filesystem(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            original_content: content.clone(),
            content,
        })
    }

    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    pub fn changed(&self) -> bool {
        self.content != self.original_content
    }
}

/// Result of one rule on one file
#[derive(Debug, Clone, Serialize)]
pub struct RuleApplication {
    pub rule: RuleKind,
    pub matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<Skip>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Changed,
    Unchanged,
    Failed,
}

/// Per-file outcome recorded in the batch report
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub rules: Vec<RuleApplication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<LineDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(path: &Path, error: &CritFixError) -> Self {
        Self {
            path: path.to_path_buf(),
            status: FileStatus::Failed,
            rules: Vec::new(),
            backup: None,
            lines: None,
            diff: None,
            error: Some(error.to_string()),
        }
    }
}

/// Runs the enabled rules over one file at a time.
///
/// Order per file: read, back up, apply rules, write if changed. Rule
/// counts reach the statistics only once the file has been handled
/// successfully, so a failed write never inflates them.
pub struct FileProcessor {
    rules: RuleSet,
    backups: BackupManager,
    policy: BackupPolicy,
    mode: ProcessMode,
}

impl FileProcessor {
    pub fn new(rules: RuleSet, backups: BackupManager, policy: BackupPolicy, mode: ProcessMode) -> Self {
        Self {
            rules,
            backups,
            policy,
            mode,
        }
    }

    pub fn mode(&self) -> ProcessMode {
        self.mode
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn process(&self, path: &Path, stats: &mut Statistics) -> Result<FileReport> {
        let mut file = SourceFile::load(path)?;
        let mut backup = None;

        if self.policy == BackupPolicy::Always {
            backup = self.backup(path, stats)?;
        }

        let mut applications = Vec::with_capacity(self.rules.len());
        for rule in self.rules.iter() {
            let output = rule.apply(&file.content);
            tracing::debug!(
                "{}: rule {} matched {} time(s)",
                path.display(),
                rule.kind(),
                output.matches
            );

            applications.push(RuleApplication {
                rule: rule.kind(),
                matches: output.matches,
                skip: output.skip,
            });
            file.content = output.content;
        }

        let changed = file.changed();
        let lines = changed.then(|| diff::line_delta(file.original_content(), &file.content));
        let mut preview = None;

        if changed {
            match self.mode {
                ProcessMode::Execute => {
                    if self.policy == BackupPolicy::OnChange {
                        backup = self.backup(path, stats)?;
                    }
                    fs::write(path, &file.content).map_err(|e| CritFixError::filesystem(path, e))?;
                    tracing::debug!("Saved {}", path.display());
                }
                ProcessMode::DryRun => {
                    preview = Some(diff::unified_diff(path, file.original_content(), &file.content));
                }
            }
            stats.files_processed += 1;
        } else {
            tracing::debug!("No changes needed: {}", path.display());
        }

        for application in &applications {
            stats.record_rule(application.rule, application.matches);
        }

        Ok(FileReport {
            path: path.to_path_buf(),
            status: if changed {
                FileStatus::Changed
            } else {
                FileStatus::Unchanged
            },
            rules: applications,
            backup,
            lines,
            diff: preview,
            error: None,
        })
    }

    fn backup(&self, path: &Path, stats: &mut Statistics) -> Result<Option<BackupStatus>> {
        if self.mode == ProcessMode::DryRun {
            return Ok(None);
        }

        let status = self.backups.ensure_backup(path)?;
        if status == BackupStatus::Created {
            stats.backups_created += 1;
        }
        Ok(Some(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn processor(policy: BackupPolicy, mode: ProcessMode) -> FileProcessor {
        FileProcessor::new(
            RuleSet::from_config(&RulesConfig::default()).unwrap(),
            BackupManager::new(".backup_critical"),
            policy,
            mode,
        )
    }

    #[test]
    fn test_source_file_tracks_changes() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("a.cs");
        fs::write(&path, "x")?;

        let mut file = SourceFile::load(&path)?;
        assert!(!file.changed());
        file.content.push('y');
        assert!(file.changed());
        assert_eq!(file.original_content(), "x");
        Ok(())
    }

    #[test]
    fn test_rewrites_and_counts() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("a.cs");
        fs::write(&path, "var t = DateTime.Now;")?;

        let mut stats = Statistics::new();
        let report = processor(BackupPolicy::Always, ProcessMode::Execute).process(&path, &mut stats)?;

        assert_eq!(report.status, FileStatus::Changed);
        assert_eq!(report.backup, Some(BackupStatus::Created));
        assert_eq!(
            report.lines,
            Some(LineDelta {
                inserted: 1,
                deleted: 1
            })
        );
        assert_eq!(fs::read_to_string(&path)?, "var t = DateTime.UtcNow;");
        assert_eq!(
            fs::read_to_string(temp.path().join("a.cs.backup_critical"))?,
            "var t = DateTime.Now;"
        );
        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.timestamp_fixed, 1);
        assert_eq!(stats.backups_created, 1);
        Ok(())
    }

    #[test]
    fn test_backup_created_when_nothing_matches() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("a.cs");
        fs::write(&path, "class A {}")?;

        let mut stats = Statistics::new();
        let report = processor(BackupPolicy::Always, ProcessMode::Execute).process(&path, &mut stats)?;

        assert_eq!(report.status, FileStatus::Unchanged);
        assert_eq!(report.lines, None);
        assert!(temp.path().join("a.cs.backup_critical").exists());
        assert_eq!(stats.files_processed, 0);
        Ok(())
    }

    #[test]
    fn test_on_change_policy_skips_untouched_files() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("a.cs");
        fs::write(&path, "class A {}")?;

        let mut stats = Statistics::new();
        processor(BackupPolicy::OnChange, ProcessMode::Execute).process(&path, &mut stats)?;

        assert!(!temp.path().join("a.cs.backup_critical").exists());
        Ok(())
    }

    #[test]
    fn test_unchanged_file_is_not_rewritten() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("a.cs");
        fs::write(&path, "class A {}")?;
        let before = fs::metadata(&path)?.modified()?;

        let mut stats = Statistics::new();
        processor(BackupPolicy::Always, ProcessMode::Execute).process(&path, &mut stats)?;

        assert_eq!(fs::metadata(&path)?.modified()?, before);
        Ok(())
    }

    #[test]
    fn test_dry_run_touches_nothing() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("a.cs");
        fs::write(&path, "var t = DateTime.Now;\n")?;

        let mut stats = Statistics::new();
        let report = processor(BackupPolicy::Always, ProcessMode::DryRun).process(&path, &mut stats)?;

        assert_eq!(fs::read_to_string(&path)?, "var t = DateTime.Now;\n");
        assert!(!temp.path().join("a.cs.backup_critical").exists());
        assert_eq!(report.backup, None);
        assert!(report.diff.unwrap().contains("+var t = DateTime.UtcNow;"));
        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.timestamp_fixed, 1);
        Ok(())
    }

    #[test]
    fn test_backup_keeps_first_original_across_runs() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("a.cs");
        fs::write(&path, "a = DateTime.Now;")?;
        let p = processor(BackupPolicy::Always, ProcessMode::Execute);

        p.process(&path, &mut Statistics::new())?;
        fs::write(&path, "a = DateTime.UtcNow; b = DateTime.Now;")?;
        let mut stats = Statistics::new();
        let report = p.process(&path, &mut stats)?;

        assert_eq!(report.backup, Some(BackupStatus::AlreadyExists));
        assert_eq!(stats.backups_created, 0);
        assert_eq!(
            fs::read_to_string(temp.path().join("a.cs.backup_critical"))?,
            "a = DateTime.Now;"
        );
        Ok(())
    }

    #[test]
    fn test_blocked_backup_leaves_file_untouched() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("a.cs");
        fs::write(&path, "var t = DateTime.Now;")?;
        fs::create_dir(temp.path().join("a.cs.backup_critical"))?;

        for policy in [BackupPolicy::Always, BackupPolicy::OnChange] {
            let mut stats = Statistics::new();
            let err = processor(policy, ProcessMode::Execute)
                .process(&path, &mut stats)
                .unwrap_err();

            assert!(err.is_backup_failure());
            assert_eq!(fs::read_to_string(&path)?, "var t = DateTime.Now;");
            assert_eq!(stats, Statistics::new());
        }
        Ok(())
    }

    #[test]
    fn test_unreadable_file_is_filesystem_error() {
        let temp = TempDir::new().unwrap();
        let mut stats = Statistics::new();
        let err = processor(BackupPolicy::Always, ProcessMode::Execute)
            .process(&temp.path().join("missing.cs"), &mut stats)
            .unwrap_err();

        assert!(matches!(err, CritFixError::Filesystem { .. }));
        assert_eq!(stats, Statistics::new());
    }
}
