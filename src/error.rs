//! Rotation failure taxonomy.
//!
//! Hard variants abort the current job; the runner converts them into the
//! per-job ERROR flag and moves on to the next job. Soft conditions
//! (pattern-not-found, refresh timeout) are not errors and never appear here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RotateError {
    #[error("folder not found: {0}")]
    NotFound(PathBuf),

    #[error("no artifact matching '{pattern}' in {folder}")]
    NoCandidate { pattern: String, folder: PathBuf },

    #[error("no artifact with a parseable week number in {folder} (candidates: {candidates:?})")]
    NoValidOrdinal {
        folder: PathBuf,
        candidates: Vec<String>,
    },

    #[error("copy {src} -> {dest} failed: {source}")]
    CopyFailed {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {sheet}!{cell}: {cause}")]
    WriteFailed {
        sheet: String,
        cell: String,
        cause: String,
    },

    #[error("cell {sheet}!{cell} does not hold a usable date (got {value})")]
    InvalidDate {
        sheet: String,
        cell: String,
        value: String,
    },

    #[error("query '{name}' not found; available: {available:?}")]
    QueryNotFound {
        name: String,
        available: Vec<String>,
    },
}
