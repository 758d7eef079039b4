use super::{Rule, RuleKind, RuleOutput, Skip};

/// Local-time accessor that gets rewritten
pub const LOCAL_TIMESTAMP: &str = "DateTime.Now";

/// UTC accessor it is rewritten to
pub const UTC_TIMESTAMP: &str = "DateTime.UtcNow";

/// Replaces every literal `DateTime.Now` with `DateTime.UtcNow`.
///
/// Plain substring matching: occurrences inside comments and string
/// literals are rewritten too. The replacement does not contain the
/// search token, so applying the rule twice is the same as applying it once.
#[derive(Debug, Default)]
pub struct TimestampRule;

impl TimestampRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for TimestampRule {
    fn kind(&self) -> RuleKind {
        RuleKind::TimestampNormalization
    }

    fn apply(&self, content: &str) -> RuleOutput {
        let count = content.matches(LOCAL_TIMESTAMP).count();
        if count == 0 {
            return RuleOutput::unchanged(content, Skip::NoMatch);
        }

        RuleOutput::changed(content.replace(LOCAL_TIMESTAMP, UTC_TIMESTAMP), count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_occurrence() {
        let output = TimestampRule::new().apply("var t = DateTime.Now;");
        assert_eq!(output.content, "var t = DateTime.UtcNow;");
        assert_eq!(output.matches, 1);
        assert_eq!(output.skip, None);
    }

    #[test]
    fn test_counts_every_occurrence() {
        let input = "// DateTime.Now in a comment\nvar a = DateTime.Now;\nvar s = \"DateTime.Now\";\n";
        let output = TimestampRule::new().apply(input);
        assert_eq!(output.matches, 3);
        assert_eq!(
            output.content,
            "// DateTime.UtcNow in a comment\nvar a = DateTime.UtcNow;\nvar s = \"DateTime.UtcNow\";\n"
        );
    }

    #[test]
    fn test_not_boundary_aware() {
        // DateTime.NowOffset is not a real member, but the match is textual
        let output = TimestampRule::new().apply("x = DateTime.NowOffset;");
        assert_eq!(output.content, "x = DateTime.UtcNowOffset;");
        assert_eq!(output.matches, 1);
    }

    #[test]
    fn test_case_sensitive() {
        let output = TimestampRule::new().apply("var t = datetime.now;");
        assert_eq!(output.content, "var t = datetime.now;");
        assert_eq!(output.matches, 0);
        assert_eq!(output.skip, Some(Skip::NoMatch));
    }

    #[test]
    fn test_idempotent() {
        let rule = TimestampRule::new();
        let first = rule.apply("a = DateTime.Now; b = DateTime.Now;");
        let second = rule.apply(&first.content);
        assert_eq!(second.content, first.content);
        assert_eq!(second.matches, 0);
    }
}
