use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::engine::{BatchReport, FileReport, FileStatus, ProcessMode};
use crate::rules::RuleKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

/// Outcome of restoring files from their backups
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    pub restored: Vec<PathBuf>,
    pub pending: Vec<PathBuf>,
    pub errors: Vec<String>,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn write_batch_report(&self, report: &BatchReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
            OutputFormat::Text => print!("{}", format_batch_text(report)),
            OutputFormat::Markdown => print!("{}", format_batch_markdown(report)),
        }
        Ok(())
    }

    pub fn write_restore_report(&self, report: &RestoreReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text | OutputFormat::Markdown => {
                if !report.pending.is_empty() {
                    println!("{} file(s) would be restored:", report.pending.len());
                    for path in &report.pending {
                        println!("  • {}", path.display());
                    }
                    println!("\n💡 Run with --yes to restore them");
                }
                if !report.restored.is_empty() {
                    println!("✓ Restored {} file(s):", report.restored.len());
                    for path in &report.restored {
                        println!("  • {}", path.display());
                    }
                }
                if report.pending.is_empty() && report.restored.is_empty() && report.errors.is_empty() {
                    println!("No backups found.");
                }
                if !report.errors.is_empty() {
                    println!("\nErrors:");
                    for error in &report.errors {
                        println!("  ⚠️  {}", error);
                    }
                }
            }
        }
        Ok(())
    }
}

fn rule_lines(report: &BatchReport) -> Vec<(RuleKind, usize)> {
    RuleKind::ALL
        .iter()
        .map(|kind| (*kind, report.stats.rule_count(*kind)))
        .collect()
}

fn rule_summary(file: &FileReport) -> String {
    let mut summary = file
        .rules
        .iter()
        .filter(|r| r.matches > 0)
        .map(|r| format!("{} ×{}", r.rule, r.matches))
        .collect::<Vec<_>>()
        .join(", ");
    if let Some(lines) = file.lines {
        summary.push_str(&format!("; +{} -{} lines", lines.inserted, lines.deleted));
    }
    summary
}

/// Format a batch report for the terminal
pub fn format_batch_text(report: &BatchReport) -> String {
    let stats = &report.stats;
    let mut output = String::new();

    output.push_str("============================================================\n");
    output.push_str(if report.mode == ProcessMode::DryRun {
        "📊 FINAL STATISTICS (dry run, nothing written)\n"
    } else {
        "📊 FINAL STATISTICS\n"
    });
    output.push_str("============================================================\n");
    output.push_str(&format!("📁 Directory: {}\n", report.root.display()));
    output.push_str(&format!("📄 Files scanned: {}\n", stats.files_scanned));
    output.push_str(&format!("✅ Files processed: {}\n", stats.files_processed));
    for (kind, count) in rule_lines(report) {
        let marker = if report.rules.contains(&kind) { "🔧" } else { "  " };
        output.push_str(&format!("{} {}: {}\n", marker, kind.label(), count));
    }
    if report.mode == ProcessMode::Execute {
        output.push_str(&format!("💾 Backups created: {}\n", stats.backups_created));
    }
    output.push_str(&format!("❌ Errors: {}\n", stats.errors));
    if stats.backup_failures > 0 {
        output.push_str(&format!("⚠️  Backup failures: {}\n", stats.backup_failures));
    }

    let changed: Vec<&FileReport> = report.changed_files().collect();
    if !changed.is_empty() {
        output.push_str("\nChanged files:\n");
        for file in &changed {
            output.push_str(&format!("  • {} ({})\n", file.path.display(), rule_summary(file)));
        }
    }

    for file in &changed {
        if let Some(diff) = &file.diff {
            output.push('\n');
            output.push_str(diff);
        }
    }

    let failed: Vec<&FileReport> = report.failed_files().collect();
    if !failed.is_empty() {
        output.push_str("\nErrors:\n");
        for file in failed {
            output.push_str(&format!(
                "  ⚠️  {}: {}\n",
                file.path.display(),
                file.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    output.push_str("============================================================\n");
    if report.is_success() {
        output.push_str("\n✅ Completed successfully!\n");
    } else {
        output.push_str(&format!("\n⚠️  Completed with {} error(s)\n", stats.errors));
    }

    output
}

/// Format a batch report as markdown
pub fn format_batch_markdown(report: &BatchReport) -> String {
    let stats = &report.stats;
    let mut output = String::new();

    output.push_str("# critfix report\n\n");
    output.push_str(&format!("Directory: `{}`\n\n", report.root.display()));
    if report.mode == ProcessMode::DryRun {
        output.push_str("_Dry run: no files were written._\n\n");
    }

    output.push_str("| Counter | Value |\n|---|---|\n");
    output.push_str(&format!("| Files scanned | {} |\n", stats.files_scanned));
    output.push_str(&format!("| Files processed | {} |\n", stats.files_processed));
    for (kind, count) in rule_lines(report) {
        output.push_str(&format!("| {} | {} |\n", kind.label(), count));
    }
    output.push_str(&format!("| Backups created | {} |\n", stats.backups_created));
    output.push_str(&format!("| Errors | {} |\n", stats.errors));

    if report.files.is_empty() {
        return output;
    }

    output.push_str("\n## Files\n\n");
    for file in &report.files {
        let status = match file.status {
            FileStatus::Changed => "changed",
            FileStatus::Unchanged => "unchanged",
            FileStatus::Failed => "failed",
        };
        output.push_str(&format!("- `{}`: {}", file.path.display(), status));
        let summary = rule_summary(file);
        if !summary.is_empty() {
            output.push_str(&format!(" ({})", summary));
        }
        if let Some(error) = &file.error {
            output.push_str(&format!(": {}", error));
        }
        output.push('\n');

        if let Some(diff) = &file.diff {
            output.push_str("\n```diff\n");
            output.push_str(diff);
            output.push_str("```\n\n");
        }
    }

    output
}
