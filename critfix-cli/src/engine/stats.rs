use serde::Serialize;

use crate::rules::RuleKind;

/// Counters aggregated over one batch.
///
/// Zeroed at batch start and passed by `&mut` into every processing call.
/// Nothing outside the running batch holds a reference to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Candidate files handed to the processor
    pub files_scanned: usize,

    /// Files whose content changed (and, outside dry runs, was written)
    pub files_processed: usize,

    pub timestamp_fixed: usize,
    pub debug_guards_added: usize,
    pub loggers_injected: usize,

    /// Backups newly created during this batch
    pub backups_created: usize,

    /// Per-file failures of any kind, backup failures included
    pub errors: usize,

    /// Subset of `errors` where the backup could not be made
    pub backup_failures: usize,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rule(&mut self, kind: RuleKind, matches: usize) {
        *self.rule_counter(kind) += matches;
    }

    pub fn rule_count(&self, kind: RuleKind) -> usize {
        match kind {
            RuleKind::TimestampNormalization => self.timestamp_fixed,
            RuleKind::DebugGuarding => self.debug_guards_added,
            RuleKind::LoggerInjection => self.loggers_injected,
        }
    }

    fn rule_counter(&mut self, kind: RuleKind) -> &mut usize {
        match kind {
            RuleKind::TimestampNormalization => &mut self.timestamp_fixed,
            RuleKind::DebugGuarding => &mut self.debug_guards_added,
            RuleKind::LoggerInjection => &mut self.loggers_injected,
        }
    }

    pub fn record_error(&mut self, backup_failure: bool) {
        self.errors += 1;
        if backup_failure {
            self.backup_failures += 1;
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}
