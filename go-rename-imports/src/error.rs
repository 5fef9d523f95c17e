use std::ops::Range;

use thiserror::Error;

/// Errors raised while parsing or editing a Go source file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to load the Go grammar: {0}")]
    Grammar(String),

    #[error("parser returned no syntax tree")]
    NoTree,

    #[error("{line}:{column}: syntax error near `{snippet}`")]
    Syntax {
        line: usize,
        column: usize,
        snippet: String,
    },

    #[error("expected 'package' clause")]
    MissingPackageClause,

    #[error("overlapping edits at bytes {first:?} and {second:?}")]
    OverlappingEdits {
        first: Range<usize>,
        second: Range<usize>,
    },

    #[error("edit range {range:?} is outside the source text")]
    EditOutOfBounds { range: Range<usize> },
}

/// A malformed `-e` / `-p` argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern `{pattern}`: empty import path")]
    Empty { pattern: String },

    #[error("pattern `{pattern}`: import path `{segment}` must not be quoted")]
    Quoted { pattern: String, segment: String },

    #[error("pattern `{pattern}`: import path `{segment}` contains whitespace")]
    Whitespace { pattern: String, segment: String },

    #[error("pattern `{pattern}`: expected {expected} `|`-separated segment(s), found {found}")]
    SegmentCount {
        pattern: String,
        expected: usize,
        found: usize,
    },
}

/// Failures while applying patterns to one file.
#[derive(Debug, Error)]
pub enum MutateError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("internal error: import `{path}` matched prefix `{prefix}` but could not be rewritten")]
    PrefixRewriteMissed { path: String, prefix: String },
}
