//! Applies an ordered pattern list to one Go file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::MutateError;
use crate::pattern::{ImportCommand, Pattern, PatternKind};
use crate::source::GoSource;

/// One file run through the mutator: its original text, the rendered result
/// and whether any pattern changed it.
#[derive(Debug, Clone)]
pub struct TargetFile {
    pub path: PathBuf,
    pub original: String,
    pub rendered: String,
    pub modified: bool,
}

/// Apply every pattern, in order, to `source`. Returns whether anything changed.
///
/// Prefix renames work from a snapshot of the file's imports taken before the
/// first pattern. A path is dropped from the snapshot as soon as a pattern has
/// rewritten it, so with `internal/syscall/|export/syscall/` listed before
/// `internal/|special/`, `internal/syscall/x` ends up as `export/syscall/x`.
///
/// Specs are tracked by position, not by path: a spec a rename has already
/// rewritten is never picked up by a later prefix match, even when its new
/// path equals one still waiting in the snapshot.
pub fn mutate_imports(
    source: &mut GoSource,
    command: ImportCommand,
    patterns: &[Pattern],
) -> Result<bool, MutateError> {
    let mut working_set = source.import_set();
    let mut rewritten = vec![false; source.specs().len()];
    let mut modified = false;

    for pattern in patterns {
        let path = pattern.path();

        match command {
            ImportCommand::Add => {
                source.add_import(path)?;
                modified = true;
            }
            ImportCommand::Delete => {
                if source.delete_import(path)? {
                    modified = true;
                }
            }
            ImportCommand::Rename => {
                // Pattern::parse guarantees rename patterns carry a replacement.
                let replacement = pattern.replacement().unwrap_or(path);
                let specs = source.specs();
                let mut rewrites = Vec::new();

                match pattern.kind() {
                    PatternKind::Exact => {
                        rewrites.extend(
                            specs
                                .iter()
                                .enumerate()
                                .filter(|(_, spec)| spec.path == path)
                                .map(|(index, _)| (index, replacement.to_string())),
                        );
                        working_set.remove(path);
                    }
                    PatternKind::Prefix => {
                        let matched: Vec<String> = working_set
                            .iter()
                            .filter(|import| import.starts_with(path))
                            .cloned()
                            .collect();

                        for old in matched {
                            let new = format!("{}{}", replacement, &old[path.len()..]);
                            let before = rewrites.len();
                            rewrites.extend(
                                specs
                                    .iter()
                                    .enumerate()
                                    .filter(|(index, spec)| spec.path == old && !rewritten[*index])
                                    .map(|(index, _)| (index, new.clone())),
                            );
                            if rewrites.len() == before {
                                return Err(MutateError::PrefixRewriteMissed {
                                    path: old,
                                    prefix: path.to_string(),
                                });
                            }
                            working_set.remove(&old);
                        }
                    }
                }

                for (index, _) in &rewrites {
                    rewritten[*index] = true;
                }
                if source.rewrite_specs(&rewrites)? {
                    modified = true;
                }
            }
        }
    }

    Ok(modified)
}

/// Read, parse and mutate one file. Nothing is written here.
pub fn modify_file(path: &Path, command: ImportCommand, patterns: &[Pattern]) -> Result<TargetFile> {
    let original = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut source = GoSource::parse(&original)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let modified = mutate_imports(&mut source, command, patterns)
        .with_context(|| format!("failed to {} imports in {}", command, path.display()))?;

    debug!(file = %path.display(), modified, "processed");

    Ok(TargetFile {
        path: path.to_path_buf(),
        original,
        rendered: source.render(),
        modified,
    })
}
