use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::source::GoSource;

/// Import paths of one file, in source order, without `"C"`.
///
/// Only the package clause and import declarations need to parse.
pub fn list_file_imports(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let source = GoSource::parse_imports_only(&text)
        .with_context(|| format!("file {}", path.display()))?;
    Ok(source.imports())
}

/// One output line per import: the path, optionally followed by the file.
pub fn format_import_line(import: &str, file: &Path, show_path: bool) -> String {
    if show_path {
        format!("{} {}", import, file.display())
    } else {
        import.to_string()
    }
}
