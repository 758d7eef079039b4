use regex::Regex;

use super::{line_ending, Rule, RuleKind, RuleOutput, Skip};
use crate::core::error::{CritFixError, Result};

const LOGGING_IMPORT: &str = "using Microsoft.Extensions.Logging;";

/// Adds an `ILogger<T>` dependency to a controller that prints to the console.
///
/// The edit is textual and anchored on regex matches:
/// 1. the logging `using` directive after the last existing one
/// 2. a `_logger` field after the last `private readonly` field of the controller
/// 3. a `logger` parameter at the end of the constructor's parameter list
/// 4. `_logger = logger;` as the first statement of the constructor body
///
/// Fields and the constructor are only looked up inside the controller's
/// own braces. Every anchor is located before anything is written. If one is missing or
/// ambiguous the content comes back unchanged.
pub struct LoggerInjectionRule {
    class_decl: Regex,
    readonly_field: Regex,
    using_directive: Regex,
}

/// A pending insertion at a byte offset of the original content
struct Insertion {
    at: usize,
    text: String,
}

/// Controller class declaration; `body_start` is just past its `{`
struct Controller<'a> {
    name: &'a str,
    body_start: usize,
}

/// Offset of the `}` closing a block whose `{` ends right before `from`
fn matching_brace(content: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, ch) in content.get(from..)?.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + offset);
                }
            }
            _ => {}
        }
    }
    None
}

impl LoggerInjectionRule {
    pub fn new() -> Result<Self> {
        Ok(Self {
            class_decl: Regex::new(
                r"public\s+(?:(?:sealed|partial|abstract)\s+)*class\s+(\w+)([^{]*)\{",
            )?,
            readonly_field: Regex::new(r"(?m)^([ \t]*)private\s+readonly\s+[^;=(){}\n]+;")?,
            using_directive: Regex::new(r"(?m)^using\s+[\w.]+\s*;")?,
        })
    }

    /// Find the controller class, if the file declares one
    fn find_controller<'a>(&self, content: &'a str) -> Option<Controller<'a>> {
        self.class_decl.captures_iter(content).find_map(|caps| {
            let name = caps.get(1)?.as_str();
            let bases = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let body_start = caps.get(0)?.end();
            (name.ends_with("Controller") || bases.contains("Controller")).then_some(Controller {
                name,
                body_start,
            })
        })
    }

    /// Locate every anchor and compute the insertions, or fail without edits
    fn plan(&self, content: &str, controller: &Controller<'_>) -> Result<Vec<Insertion>> {
        let class_name = controller.name;
        let nl = line_ending(content);
        let logger_type = format!("ILogger<{class_name}>");
        let mut insertions = Vec::with_capacity(4);

        // Fields and constructor must come from the controller's own body
        let body_end = matching_brace(content, controller.body_start).ok_or_else(|| {
            CritFixError::PatternAnchorNotFound(format!("closing brace of {class_name}"))
        })?;
        let body_start = controller.body_start;
        let body = content.get(body_start..body_end).unwrap_or("");

        if !content.contains(LOGGING_IMPORT) {
            let at = self
                .using_directive
                .find_iter(content)
                .last()
                .map(|m| m.end());
            insertions.push(match at {
                Some(at) => Insertion {
                    at,
                    text: format!("{nl}{LOGGING_IMPORT}"),
                },
                None => Insertion {
                    at: 0,
                    text: format!("{LOGGING_IMPORT}{nl}"),
                },
            });
        }

        let field = self
            .readonly_field
            .captures_iter(body)
            .last()
            .ok_or_else(|| CritFixError::PatternAnchorNotFound("private readonly field".to_string()))?;
        let field_indent = field.get(1).map(|m| m.as_str()).unwrap_or("");
        let field_end = field.get(0).map(|m| m.end()).unwrap_or(0);
        insertions.push(Insertion {
            at: body_start + field_end,
            text: format!("{nl}{field_indent}private readonly {logger_type} _logger;"),
        });

        let constructor = Regex::new(&format!(
            r"(?m)^([ \t]*)public\s+{}\s*\(([^)]*)\)\s*\{{",
            regex::escape(class_name)
        ))?;
        let mut matches = constructor.captures_iter(body);
        let ctor = matches
            .next()
            .ok_or_else(|| CritFixError::PatternAnchorNotFound(format!("constructor of {class_name}")))?;
        if matches.next().is_some() {
            return Err(CritFixError::PatternAnchorNotFound(format!(
                "single constructor of {class_name}"
            )));
        }

        let (Some(whole), Some(indent), Some(params)) = (ctor.get(0), ctor.get(1), ctor.get(2))
        else {
            return Err(CritFixError::PatternAnchorNotFound(format!(
                "constructor of {class_name}"
            )));
        };

        let param_text = params.as_str();
        let trimmed = param_text.trim_end();
        insertions.push(if trimmed.trim().is_empty() {
            Insertion {
                at: body_start + params.start(),
                text: format!("{logger_type} logger"),
            }
        } else {
            Insertion {
                at: body_start + params.start() + trimmed.len(),
                text: format!(", {logger_type} logger"),
            }
        });

        insertions.push(Insertion {
            at: body_start + whole.end(),
            text: format!("{nl}{}    _logger = logger;", indent.as_str()),
        });

        Ok(insertions)
    }
}

impl Rule for LoggerInjectionRule {
    fn kind(&self) -> RuleKind {
        RuleKind::LoggerInjection
    }

    fn apply(&self, content: &str) -> RuleOutput {
        if !content.contains("Console.WriteLine") {
            return RuleOutput::unchanged(content, Skip::NoMatch);
        }

        if content.contains("_logger") || content.contains("ILogger") {
            return RuleOutput::unchanged(content, Skip::AlreadyPresent);
        }

        let Some(controller) = self.find_controller(content) else {
            return RuleOutput::unchanged(
                content,
                Skip::PreconditionUnmet("no controller class".to_string()),
            );
        };

        let mut insertions = match self.plan(content, &controller) {
            Ok(insertions) => insertions,
            Err(CritFixError::PatternAnchorNotFound(anchor)) => {
                tracing::debug!("Logger injection skipped, anchor not found: {}", anchor);
                return RuleOutput::unchanged(content, Skip::AnchorNotFound(anchor));
            }
            Err(e) => {
                tracing::warn!("Logger injection skipped: {}", e);
                return RuleOutput::unchanged(content, Skip::AnchorNotFound(e.to_string()));
            }
        };

        // Apply back to front so earlier offsets stay valid
        insertions.sort_by(|a, b| b.at.cmp(&a.at));
        let mut rewritten = content.to_string();
        for insertion in insertions {
            rewritten.insert_str(insertion.at, &insertion.text);
        }

        RuleOutput::changed(rewritten, 1)
    }
}
