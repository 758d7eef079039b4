use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::path::Path;

/// Lines inserted and deleted by a rewrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineDelta {
    pub inserted: usize,
    pub deleted: usize,
}

/// Unified diff of a file's rewrite, for dry-run output
pub fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let name = path.display().to_string();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(2)
        .header(&name, &name)
        .to_string()
}

/// Number of lines inserted and deleted between two versions
pub fn line_delta(old: &str, new: &str) -> LineDelta {
    let mut delta = LineDelta::default();

    for change in TextDiff::from_lines(old, new).iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => delta.inserted += 1,
            ChangeTag::Delete => delta.deleted += 1,
            ChangeTag::Equal => {}
        }
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff_modification() {
        let diff = unified_diff(
            Path::new("Foo.cs"),
            "a\nvar t = DateTime.Now;\nb\n",
            "a\nvar t = DateTime.UtcNow;\nb\n",
        );

        assert!(diff.contains("--- Foo.cs"));
        assert!(diff.contains("+++ Foo.cs"));
        assert!(diff.contains("-var t = DateTime.Now;"));
        assert!(diff.contains("+var t = DateTime.UtcNow;"));
    }

    #[test]
    fn test_unified_diff_no_change() {
        let diff = unified_diff(Path::new("Foo.cs"), "same\n", "same\n");
        assert!(!diff.contains("+same"));
        assert!(!diff.contains("-same"));
    }

    #[test]
    fn test_line_delta() {
        let old = "x\n    Console.WriteLine(1);\n";
        let new = "x\n    #if DEBUG\n    Console.WriteLine(1);\n    #endif\n";
        assert_eq!(
            line_delta(old, new),
            LineDelta {
                inserted: 2,
                deleted: 0
            }
        );
        assert_eq!(
            line_delta("a\n", "b\n"),
            LineDelta {
                inserted: 1,
                deleted: 1
            }
        );
    }
}
