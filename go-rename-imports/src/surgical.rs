/// Surgical edit module for making minimal, targeted changes to Go source.
///
/// Tree-sitter gives us byte ranges but no printer, so every import rewrite is
/// expressed as a set of byte-range replacements against the original text.
/// Everything outside those ranges (comments, blank lines, code layout) is
/// copied through untouched.

use std::cmp::Ordering;
use std::ops::Range;

use crate::error::SourceError;

/// Represents a single textual replacement in the source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Byte range in the original text (start inclusive, end exclusive)
    pub range: Range<usize>,
    /// The text to replace with
    pub new_text: String,
}

impl Replacement {
    pub fn new(range: Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// A pure insertion at `at`.
    pub fn insert(at: usize, new_text: impl Into<String>) -> Self {
        Self::new(at..at, new_text)
    }

    /// A pure deletion of `range`.
    pub fn delete(range: Range<usize>) -> Self {
        Self::new(range, String::new())
    }
}

impl Ord for Replacement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.range
            .start
            .cmp(&other.range.start)
            .then(self.range.end.cmp(&other.range.end))
    }
}

impl PartialOrd for Replacement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Apply surgical edits to source code, preserving all formatting.
///
/// Replacements are sorted by position first. Two replacements may touch
/// (one ends where the next starts) but must not overlap.
///
/// # Example
/// ```
/// use go_rename_imports::surgical::{apply_surgical_edits, Replacement};
///
/// let source = "import \"fmt\"\n";
/// let result = apply_surgical_edits(source, vec![Replacement::new(7..12, "\"log\"")]).unwrap();
/// assert_eq!(result, "import \"log\"\n");
/// ```
pub fn apply_surgical_edits(
    original_source: &str,
    mut replacements: Vec<Replacement>,
) -> Result<String, SourceError> {
    if replacements.is_empty() {
        return Ok(original_source.to_string());
    }

    replacements.sort();

    for pair in replacements.windows(2) {
        if pair[0].range.end > pair[1].range.start {
            return Err(SourceError::OverlappingEdits {
                first: pair[0].range.clone(),
                second: pair[1].range.clone(),
            });
        }
    }

    let mut result = String::with_capacity(original_source.len());
    let mut cursor = 0usize;

    for replacement in replacements {
        let Range { start, end } = replacement.range;
        if end > original_source.len()
            || !original_source.is_char_boundary(start)
            || !original_source.is_char_boundary(end)
        {
            return Err(SourceError::EditOutOfBounds { range: start..end });
        }
        result.push_str(&original_source[cursor..start]);
        result.push_str(&replacement.new_text);
        cursor = end;
    }

    result.push_str(&original_source[cursor..]);
    Ok(result)
}

/// Byte offset of the first character of the line containing `pos`.
pub fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Byte offset of the newline ending the line containing `pos` (or EOF).
pub fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len())
}

/// Like [`line_end`], but past the newline.
pub fn line_end_inclusive(text: &str, pos: usize) -> usize {
    let end = line_end(text, pos);
    if end < text.len() {
        end + 1
    } else {
        end
    }
}

/// Leading whitespace of the line containing `pos`.
pub fn indentation(text: &str, pos: usize) -> &str {
    let start = line_start(text, pos);
    let line = &text[start..line_end(text, pos)];
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

pub fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c == ' ' || c == '\t' || c == '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_replacement() {
        let source = "import \"fmt\"\n";
        let result = apply_surgical_edits(source, vec![Replacement::new(7..12, "\"os\"")]).unwrap();
        assert_eq!(result, "import \"os\"\n");
    }

    #[test]
    fn test_multiple_replacements() {
        let source = "a = 1\nb = 2";
        let replacements = vec![
            Replacement::new(4..5, "10"),
            Replacement::new(10..11, "20"),
        ];

        let result = apply_surgical_edits(source, replacements).unwrap();
        assert_eq!(result, "a = 10\nb = 20");
    }

    #[test]
    fn test_replacement_sorting() {
        let source = "a = 1; b = 2;";
        let replacements = vec![
            Replacement::new(11..12, "20"),
            Replacement::new(4..5, "10"),
        ];

        let result = apply_surgical_edits(source, replacements).unwrap();
        assert_eq!(result, "a = 10; b = 20;");
    }

    #[test]
    fn test_insert_and_delete() {
        let source = "one\ntwo\nthree\n";
        let replacements = vec![
            Replacement::delete(4..8),
            Replacement::insert(0, "zero\n"),
        ];

        let result = apply_surgical_edits(source, replacements).unwrap();
        assert_eq!(result, "zero\none\nthree\n");
    }

    #[test]
    fn test_no_replacements() {
        let source = "package main\n";
        assert_eq!(apply_surgical_edits(source, vec![]).unwrap(), source);
    }

    #[test]
    fn test_overlap_is_rejected() {
        let source = "abcdef";
        let err = apply_surgical_edits(
            source,
            vec![Replacement::new(0..3, "x"), Replacement::new(2..4, "y")],
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::OverlappingEdits { .. }));
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let err = apply_surgical_edits("abc", vec![Replacement::new(2..9, "x")]).unwrap_err();
        assert!(matches!(err, SourceError::EditOutOfBounds { .. }));
    }

    #[test]
    fn test_line_helpers() {
        let text = "package main\n\timport \"fmt\"\nend";
        let pos = text.find("import").unwrap();
        assert_eq!(line_start(text, pos), 13);
        assert_eq!(&text[line_end(text, pos)..line_end(text, pos) + 1], "\n");
        assert_eq!(&text[line_end_inclusive(text, pos)..], "end");
        assert_eq!(indentation(text, pos), "\t");
        assert_eq!(line_end_inclusive(text, text.len() - 1), text.len());
        assert!(is_blank(" \t"));
        assert!(!is_blank(" x"));
    }
}
