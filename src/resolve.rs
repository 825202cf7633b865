//! Period resolution over a versioned filename series.
//!
//! Artifacts are named `{prefix}_S{week}{ext}` with a zero-padded week
//! number. The current artifact is the one with the numerically highest
//! week; its successor is week + 1. Week numbers are unbounded: past S99
//! the tag simply grows to three digits (`S100`), it is never truncated.

use std::path::{Path, PathBuf};

use globset::Glob;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::RotateError;

/// Latest artifact of a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    pub ordinal: u32,
}

/// Format a week ordinal as its filename tag: `S07`, `S13`, `S100`.
pub fn week_tag(ordinal: u32) -> String {
    format!("S{:02}", ordinal)
}

/// Build an artifact filename: `SUIVI_KPIS_S21.xlsx`.
pub fn artifact_name(prefix: &str, ordinal: u32, ext: &str) -> String {
    format!("{}_{}{}", prefix, week_tag(ordinal), ext)
}

/// Find the artifact with the highest week number in `folder`.
///
/// Scans entries matching `{prefix}_S*{ext}`, extracts each week number
/// from the file stem, and keeps the maximum (first seen wins on a tie).
pub fn resolve(folder: &Path, prefix: &str, ext: &str) -> Result<Resolved, RotateError> {
    if !folder.is_dir() {
        return Err(RotateError::NotFound(folder.to_path_buf()));
    }

    let pattern = format!("{}_S*{}", globset::escape(prefix), globset::escape(ext));
    let matcher = Glob::new(&pattern)
        .expect("escaped glob pattern is valid")
        .compile_matcher();

    let mut candidates = Vec::new();
    for entry in WalkDir::new(folder).max_depth(1).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if matcher.is_match(&name) {
            candidates.push(entry.path().to_path_buf());
        }
    }

    if candidates.is_empty() {
        return Err(RotateError::NoCandidate {
            pattern: format!("{}_S*{}", prefix, ext),
            folder: folder.to_path_buf(),
        });
    }

    let stem_re = Regex::new(&format!(r"{}_S(\d+)", regex::escape(prefix)))
        .expect("week extraction pattern is valid");

    let mut best: Option<Resolved> = None;
    for path in &candidates {
        let stem = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().to_string(),
            None => continue,
        };
        let ordinal = stem_re
            .captures(&stem)
            .and_then(|caps| caps[1].parse::<u32>().ok());
        if let Some(ordinal) = ordinal {
            let better = match &best {
                Some(current) => ordinal > current.ordinal,
                None => true,
            };
            if better {
                best = Some(Resolved {
                    path: path.clone(),
                    ordinal,
                });
            }
        }
    }

    best.ok_or_else(|| RotateError::NoValidOrdinal {
        folder: folder.to_path_buf(),
        candidates: candidates
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect(),
    })
}

/// Names in `folder` starting with `prefix`, sorted. Used to diagnose a
/// failed resolution for the operator.
pub fn similar_names(folder: &Path, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.starts_with(prefix).then_some(name)
        })
        .collect();
    names.sort();
    names
}
