mod debug_guard;
mod logger_injection;
mod timestamp;

pub use debug_guard::DebugGuardRule;
pub use logger_injection::LoggerInjectionRule;
pub use timestamp::TimestampRule;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RulesConfig;
use crate::core::error::Result;

/// Identifies a rule for configuration, statistics and reporting
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// DateTime.Now -> DateTime.UtcNow
    #[value(name = "timestamp")]
    TimestampNormalization,

    /// Wrap single-line Console.WriteLine calls in #if DEBUG
    #[value(name = "debug-guard")]
    DebugGuarding,

    /// Add an ILogger field and constructor parameter to controllers
    #[value(name = "logger")]
    LoggerInjection,
}

impl RuleKind {
    pub const ALL: [RuleKind; 3] = [
        RuleKind::TimestampNormalization,
        RuleKind::DebugGuarding,
        RuleKind::LoggerInjection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::TimestampNormalization => "timestamp",
            RuleKind::DebugGuarding => "debug-guard",
            RuleKind::LoggerInjection => "logger",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::TimestampNormalization => "DateTime.Now fixed",
            RuleKind::DebugGuarding => "Console.WriteLine guarded",
            RuleKind::LoggerInjection => "Loggers injected",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a rule left content unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Skip {
    /// Nothing in the content matched the rule's pattern
    NoMatch,

    /// The change the rule would make is already in place
    AlreadyPresent,

    /// A precondition for a structural edit does not hold
    PreconditionUnmet(String),

    /// A structural edit could not find a confident insertion point
    AnchorNotFound(String),
}

/// Result of applying one rule to a piece of content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutput {
    pub content: String,
    pub matches: usize,
    pub skip: Option<Skip>,
}

impl RuleOutput {
    pub fn changed(content: String, matches: usize) -> Self {
        Self {
            content,
            matches,
            skip: None,
        }
    }

    /// The identity result: input returned untouched with zero matches
    pub fn unchanged(content: &str, skip: Skip) -> Self {
        Self {
            content: content.to_string(),
            matches: 0,
            skip: Some(skip),
        }
    }
}

/// A stateless text-in/text-out rewrite paired with a match counter.
///
/// Implementations must return the input unchanged with `matches == 0`
/// whenever their pattern does not occur.
pub trait Rule {
    fn kind(&self) -> RuleKind;

    fn apply(&self, content: &str) -> RuleOutput;
}

/// Ordered collection of enabled rules.
///
/// Later rules observe the output of earlier ones.
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Later rules see the output of earlier ones
    const ORDER: [RuleKind; 3] = [
        RuleKind::TimestampNormalization,
        RuleKind::LoggerInjection,
        RuleKind::DebugGuarding,
    ];

    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Build the enabled rules in their fixed application order
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();

        for kind in Self::ORDER {
            if !config.is_enabled(kind) {
                continue;
            }
            let rule: Box<dyn Rule> = match kind {
                RuleKind::TimestampNormalization => Box::new(TimestampRule::new()),
                RuleKind::LoggerInjection => Box::new(LoggerInjectionRule::new()?),
                RuleKind::DebugGuarding => Box::new(DebugGuardRule::new()?),
            };
            rules.push(rule);
        }

        Ok(Self::new(rules))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn kinds(&self) -> Vec<RuleKind> {
        self.iter().map(|rule| rule.kind()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// Detect the line ending a file predominantly uses
pub(crate) fn line_ending(content: &str) -> &'static str {
    if content.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}
