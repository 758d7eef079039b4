use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::processor::{FileProcessor, FileReport, FileStatus, ProcessMode};
use super::stats::Statistics;
use crate::config::BatchConfig;
use crate::core::error::{CritFixError, Result};
use crate::rules::RuleKind;

/// Which files in a directory are candidates
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Extensions without the leading dot
    pub extensions: Vec<String>,

    /// Names ending in any of these are never input
    pub excluded_suffixes: Vec<String>,

    pub recursive: bool,
}

impl Discovery {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excluded_suffixes: config.skip_suffixes(),
            recursive: config.recursive,
        }
    }

    /// Collect candidate files under `root` in lexicographic order
    pub fn collect_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !Self::is_ignored_dir(e.path(), e.file_type().is_dir()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                // Only an unreadable root stops discovery
                Err(e) if e.depth() > 0 => {
                    tracing::warn!(
                        "Skipping {}: {}",
                        e.path().unwrap_or(root).display(),
                        e
                    );
                    continue;
                }
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    return Err(CritFixError::filesystem(path, e.into()));
                }
            };

            if entry.file_type().is_file() && self.is_candidate(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Check whether a file should be handed to the processor
    pub fn is_candidate(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if self.excluded_suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())) {
            return false;
        }

        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Build output and tooling directories are never descended into
    fn is_ignored_dir(path: &Path, is_dir: bool) -> bool {
        if !is_dir {
            return false;
        }

        let ignore_dirs = [".git", ".vs", "bin", "obj", "node_modules", "packages"];
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| ignore_dirs.contains(&name))
            .unwrap_or(false)
    }
}

/// Everything a batch produced
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub root: PathBuf,
    pub mode: ProcessMode,
    pub rules: Vec<RuleKind>,
    pub stats: Statistics,
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.stats.is_success()
    }

    pub fn changed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.status == FileStatus::Changed)
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.status == FileStatus::Failed)
    }
}

/// Discovers files in a directory and processes them one after another
pub struct BatchRunner {
    root: PathBuf,
    discovery: Discovery,
    processor: FileProcessor,
}

impl BatchRunner {
    pub fn new(root: PathBuf, discovery: Discovery, processor: FileProcessor) -> Self {
        Self {
            root,
            discovery,
            processor,
        }
    }

    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        self.discovery.collect_files(&self.root)
    }

    /// Discover and process every candidate file.
    ///
    /// Only an unreadable root fails the whole batch.
    pub fn run(&self) -> Result<BatchReport> {
        let files = self.collect_files()?;
        Ok(self.run_files(&files, |_| {}))
    }

    /// Process `files` in the order given, calling `on_file` after each
    pub fn run_files<F>(&self, files: &[PathBuf], mut on_file: F) -> BatchReport
    where
        F: FnMut(&Path),
    {
        tracing::info!("Found {} candidate file(s) in {}", files.len(), self.root.display());

        let mut stats = Statistics::new();
        let mut reports = Vec::with_capacity(files.len());

        for path in files {
            stats.files_scanned += 1;
            tracing::debug!("Processing: {}", path.display());

            let report = match self.processor.process(path, &mut stats) {
                Ok(report) => report,
                Err(e) => {
                    if e.is_backup_failure() {
                        tracing::error!("Backup failed, file left untouched: {}: {}", path.display(), e);
                    } else {
                        tracing::warn!("Failed to process {}: {}", path.display(), e);
                    }
                    stats.record_error(e.is_backup_failure());
                    FileReport::failed(path, &e)
                }
            };

            reports.push(report);
            on_file(path);
        }

        BatchReport {
            root: self.root.clone(),
            mode: self.processor.mode(),
            rules: self.processor.rules().kinds(),
            stats,
            files: reports,
        }
    }
}
