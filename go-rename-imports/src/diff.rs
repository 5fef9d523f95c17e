//! Unified diffs for `--diff`.

use std::path::Path;

use similar::{ChangeTag, TextDiff};

const CONTEXT_LINES: usize = 3;

/// The rendered change to one file.
#[derive(Debug)]
pub struct FileDiff {
    /// `--- path` / `+++ path` headers followed by the hunks
    pub unified: String,
    pub lines_added: usize,
    pub lines_removed: usize,
}

/// Running totals over every file diffed in a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files: usize,
    pub lines_added: usize,
    pub lines_removed: usize,
}

impl DiffStats {
    pub fn record(&mut self, diff: &FileDiff) {
        self.files += 1;
        self.lines_added += diff.lines_added;
        self.lines_removed += diff.lines_removed;
    }
}

/// Diff `original` against `rendered`, or `None` if the file did not change.
pub fn file_diff(path: &Path, original: &str, rendered: &str) -> Option<FileDiff> {
    if original == rendered {
        return None;
    }

    let diff = TextDiff::from_lines(original, rendered);
    let (mut lines_added, mut lines_removed) = (0, 0);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => lines_added += 1,
            ChangeTag::Delete => lines_removed += 1,
            ChangeTag::Equal => {}
        }
    }

    let name = path.display().to_string();
    let unified = diff
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&name, &name)
        .to_string();

    Some(FileDiff {
        unified,
        lines_added,
        lines_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_of_renamed_import() {
        let original = "package main\n\nimport (\n\t\"fmt\"\n\t\"old/path\"\n)\n";
        let rendered = "package main\n\nimport (\n\t\"fmt\"\n\t\"new/path\"\n)\n";

        let diff = file_diff(Path::new("cmd/main.go"), original, rendered).unwrap();

        assert!(diff.unified.starts_with("--- cmd/main.go\n+++ cmd/main.go\n"));
        assert!(diff.unified.contains("-\t\"old/path\""));
        assert!(diff.unified.contains("+\t\"new/path\""));
        assert_eq!((diff.lines_added, diff.lines_removed), (1, 1));
    }

    #[test]
    fn test_unchanged_file_has_no_diff() {
        assert!(file_diff(Path::new("a.go"), "package main\n", "package main\n").is_none());
    }

    #[test]
    fn test_stats_count_files_and_lines() {
        let mut stats = DiffStats::default();
        stats.record(&file_diff(Path::new("a.go"), "a\n", "b\nc\n").unwrap());
        stats.record(&file_diff(Path::new("b.go"), "x\ny\n", "x\n").unwrap());

        assert_eq!(
            stats,
            DiffStats {
                files: 2,
                lines_added: 2,
                lines_removed: 2,
            }
        );
    }
}
