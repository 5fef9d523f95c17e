use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

pub const GO_SUFFIX: &str = ".go";
pub const TEST_SUFFIX: &str = "_test.go";
/// Directories with this name hold fixtures, never package sources.
pub const EXCLUDED_DIR: &str = "testdata";

/// Every non-test `.go` file below `root`, depth-first in file-name order.
///
/// `testdata` subtrees are skipped entirely, symlinks are neither followed
/// nor returned, and unreadable entries are skipped.
pub fn find_go_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == EXCLUDED_DIR)
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(root = %root.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if name.ends_with(GO_SUFFIX) && !name.ends_with(TEST_SUFFIX) {
            let path = entry.path();
            // `.` as root yields `./a.go`; report `a.go` like a joined path would.
            files.push(path.strip_prefix(".").unwrap_or(path).to_path_buf());
        }
    }

    files
}

/// Expand CLI inputs: directories through [`find_go_files`], anything else
/// passed through as given. A path that cannot be stat'ed is an error.
pub fn resolve_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    anyhow::ensure!(!paths.is_empty(), "missing <file/dir> ...");

    let mut files = Vec::new();
    for path in paths {
        let metadata = fs::metadata(path)
            .with_context(|| format!("cannot stat {}", path.display()))?;

        if metadata.is_dir() {
            files.extend(find_go_files(path));
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}
