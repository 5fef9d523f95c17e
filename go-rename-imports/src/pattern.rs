//! Parsing of `-e` / `-p` import patterns.

use std::fmt;

use crate::error::PatternError;

/// The mutating subcommands. Each decides how many `|` segments a pattern has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportCommand {
    Add,
    Delete,
    Rename,
}

impl ImportCommand {
    fn segments(self) -> usize {
        match self {
            ImportCommand::Add | ImportCommand::Delete => 1,
            ImportCommand::Rename => 2,
        }
    }
}

impl fmt::Display for ImportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportCommand::Add => write!(f, "add"),
            ImportCommand::Delete => write!(f, "delete"),
            ImportCommand::Rename => write!(f, "rename"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Matches one import path in full
    Exact,
    /// Matches every import path starting with the given string
    Prefix,
}

/// One validated import pattern, e.g. `old/pkg|new/pkg` or `fmt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    kind: PatternKind,
    raw: String,
    path: String,
    replacement: Option<String>,
}

impl Pattern {
    /// Parse and validate one raw CLI argument for `command`.
    pub fn parse(raw: &str, kind: PatternKind, command: ImportCommand) -> Result<Self, PatternError> {
        let segments: Vec<&str> = raw.split('|').collect();

        for segment in &segments {
            validate_segment(raw, segment)?;
        }

        let expected = command.segments();
        if segments.len() != expected {
            return Err(PatternError::SegmentCount {
                pattern: raw.to_string(),
                expected,
                found: segments.len(),
            });
        }

        Ok(Self {
            kind,
            raw: raw.to_string(),
            path: segments[0].to_string(),
            replacement: segments.get(1).map(|s| s.to_string()),
        })
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn is_prefix(&self) -> bool {
        self.kind == PatternKind::Prefix
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The import path (or prefix) the pattern matches.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The new path (or prefix) for rename patterns.
    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }
}

fn validate_segment(raw: &str, segment: &str) -> Result<(), PatternError> {
    if segment.is_empty() {
        return Err(PatternError::Empty {
            pattern: raw.to_string(),
        });
    }
    if segment.starts_with('"') || segment.ends_with('"') {
        return Err(PatternError::Quoted {
            pattern: raw.to_string(),
            segment: segment.to_string(),
        });
    }
    if segment.trim() != segment || segment.split_whitespace().count() != 1 {
        return Err(PatternError::Whitespace {
            pattern: raw.to_string(),
            segment: segment.to_string(),
        });
    }
    Ok(())
}

/// Parse patterns that arrive tagged with their position on the command line,
/// returning them in command-line order.
pub fn parse_ordered<'a, I>(args: I, command: ImportCommand) -> Result<Vec<Pattern>, PatternError>
where
    I: IntoIterator<Item = (usize, PatternKind, &'a str)>,
{
    let mut indexed: Vec<(usize, PatternKind, &str)> = args.into_iter().collect();
    indexed.sort_by_key(|(index, _, _)| *index);

    indexed
        .into_iter()
        .map(|(_, kind, raw)| Pattern::parse(raw, kind, command))
        .collect()
}
