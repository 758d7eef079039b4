use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use critfix::core::{OutputFormat, OutputWriter};
use critfix::engine::{self, ProcessMode};
use critfix::rules::RuleKind;
use critfix::Config;

pub struct RunOptions {
    pub path: PathBuf,
    pub dry_run: bool,
    pub recursive: bool,
    pub enable: Vec<RuleKind>,
    pub disable: Vec<RuleKind>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// Run a batch; returns false when any file failed
pub fn run(options: RunOptions, format: OutputFormat) -> Result<bool> {
    let mut config = Config::load(options.config.as_deref())?;
    for kind in &options.enable {
        config.rules.set(*kind, true);
    }
    for kind in &options.disable {
        config.rules.set(*kind, false);
    }
    if options.recursive {
        config.batch.recursive = true;
    }

    let mode = if options.dry_run {
        ProcessMode::DryRun
    } else {
        ProcessMode::Execute
    };

    let runner = engine::batch_from_config(&config, options.path.clone(), mode)?;
    let files = runner
        .collect_files()
        .with_context(|| format!("Failed to scan {}", options.path.display()))?;

    // Per-file log lines replace the bar in verbose mode
    let progress = if options.verbose || format == OutputFormat::Json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.green} {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        bar
    };

    let report = runner.run_files(&files, |path| {
        progress.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        progress.inc(1);
    });
    progress.finish_and_clear();

    OutputWriter::new(format).write_batch_report(&report)?;

    Ok(report.is_success())
}
