use std::path::Path;

use crate::error::RotateError;

/// Copy `source` to `dest`, byte-exact.
///
/// An existing destination is overwritten after an advisory warning; no
/// backup is taken. I/O failure (permissions, disk full) aborts the job.
pub fn duplicate(source: &Path, dest: &Path) -> Result<(), RotateError> {
    if dest.exists() {
        eprintln!(
            "  warning: {} already exists, it will be overwritten",
            dest.display()
        );
    }
    std::fs::copy(source, dest).map_err(|source_err| RotateError::CopyFailed {
        src: source.to_path_buf(),
        dest: dest.to_path_buf(),
        source: source_err,
    })?;
    Ok(())
}
