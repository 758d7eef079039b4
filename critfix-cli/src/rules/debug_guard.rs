use regex::Regex;

use super::{Rule, RuleKind, RuleOutput, Skip};
use crate::core::error::Result;

const DEBUG_DIRECTIVE: &str = "#if DEBUG";
const END_DIRECTIVE: &str = "#endif";

/// Wraps single-line `Console.WriteLine(...);` statements in `#if DEBUG`.
///
/// Only a statement that sits alone on its line is wrapped. Calls spanning
/// several lines, or with a closing parenthesis inside the argument list,
/// are left as they are, and so is anything already inside an `#if DEBUG`
/// branch.
pub struct DebugGuardRule {
    statement: Regex,
}

impl DebugGuardRule {
    pub fn new() -> Result<Self> {
        Ok(Self {
            statement: Regex::new(r"^(\s*)Console\.WriteLine\([^)]*\);(\r?)$")?,
        })
    }
}

/// Open preprocessor conditionals while walking the file top to bottom
#[derive(Default)]
struct Conditionals {
    /// One entry per open `#if`, true while inside its `#if DEBUG` branch
    open: Vec<bool>,
}

impl Conditionals {
    fn observe(&mut self, line: &str) {
        let directive = line.trim();
        if directive.starts_with("#if") {
            self.open.push(directive == DEBUG_DIRECTIVE);
        } else if directive.starts_with("#else") || directive.starts_with("#elif") {
            if let Some(top) = self.open.last_mut() {
                *top = false;
            }
        } else if directive.starts_with(END_DIRECTIVE) {
            self.open.pop();
        }
    }

    fn in_debug(&self) -> bool {
        self.open.iter().any(|debug| *debug)
    }
}

impl Rule for DebugGuardRule {
    fn kind(&self) -> RuleKind {
        RuleKind::DebugGuarding
    }

    fn apply(&self, content: &str) -> RuleOutput {
        if !content.contains("Console.WriteLine") {
            return RuleOutput::unchanged(content, Skip::NoMatch);
        }

        let mut output = Vec::new();
        let mut conditionals = Conditionals::default();
        let mut wrapped = 0;
        let mut already_guarded = 0;

        for line in content.split('\n') {
            let Some(caps) = self.statement.captures(line) else {
                conditionals.observe(line);
                output.push(line.to_string());
                continue;
            };

            if conditionals.in_debug() {
                already_guarded += 1;
                output.push(line.to_string());
                continue;
            }

            let indent = &caps[1];
            let cr = &caps[2];
            output.push(format!("{indent}{DEBUG_DIRECTIVE}{cr}"));
            output.push(line.to_string());
            output.push(format!("{indent}{END_DIRECTIVE}{cr}"));
            wrapped += 1;
        }

        if wrapped == 0 {
            let skip = if already_guarded > 0 {
                Skip::AlreadyPresent
            } else {
                Skip::NoMatch
            };
            return RuleOutput::unchanged(content, skip);
        }

        RuleOutput::changed(output.join("\n"), wrapped)
    }
}
