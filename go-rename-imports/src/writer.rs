use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::mutator::TargetFile;

/// `<path>.tmp`, next to the file so the final rename stays on one filesystem.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
///
/// The original is untouched until the rename. A temp file left behind by a
/// failed write is not cleaned up.
pub fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let temp_path = temp_path_for(path);
    let permissions = fs::metadata(path).ok().map(|metadata| metadata.permissions());

    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("write {}", temp_path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("write {}", temp_path.display()))?;
    drop(file);

    if let Some(permissions) = permissions {
        fs::set_permissions(&temp_path, permissions)
            .with_context(|| format!("set permissions on {}", temp_path.display()))?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("rename {} -> {}", temp_path.display(), path.display()))?;
    Ok(())
}

/// Write `target` back if `write` was requested and something changed.
/// Returns whether the file was written.
pub fn commit(target: &TargetFile, write: bool) -> Result<bool> {
    if !(write && target.modified) {
        return Ok(false);
    }

    write_atomically(&target.path, &target.rendered)?;
    info!(file = %target.path.display(), "rewrote imports");
    Ok(true)
}
