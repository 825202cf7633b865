//! Remote document-library client.
//!
//! One job family lives in a shared document library rather than in the
//! locally managed folders: its source artifact is fetched before rotation
//! and the produced artifact is published back afterwards. The library is
//! an opaque collaborator behind [`LibraryClient`]; the in-tree
//! [`FolderLibrary`] works against a locally synced mirror directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::Glob;
use walkdir::WalkDir;

use crate::config::LibraryConfig;

/// Metadata of one remote file.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub name: String,
    /// Library-relative path, usable with [`LibraryClient::download`].
    pub path: String,
    pub modified_secs: i64,
}

pub trait LibraryClient {
    /// Find the most recently modified file matching `pattern` under
    /// `folder`. `None` when nothing matches.
    fn find(&self, folder: &str, pattern: &str) -> Result<Option<RemoteFile>>;

    /// Download `remote_path` to `dest`.
    fn download(&self, remote_path: &str, dest: &Path) -> Result<()>;

    /// Upload `src` as `remote_folder`/`name`, overwriting.
    fn upload(&self, src: &Path, remote_folder: &str, name: &str) -> Result<()>;
}

/// Library client over a locally synced mirror directory.
pub struct FolderLibrary {
    root: PathBuf,
}

impl FolderLibrary {
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            root: config.root.clone(),
        }
    }

    fn resolve_path(&self, remote: &str) -> PathBuf {
        self.root.join(remote.trim_start_matches('/'))
    }
}

impl LibraryClient for FolderLibrary {
    fn find(&self, folder: &str, pattern: &str) -> Result<Option<RemoteFile>> {
        let dir = self.resolve_path(folder);
        if !dir.is_dir() {
            return Ok(None);
        }
        let matcher = Glob::new(pattern)
            .with_context(|| format!("invalid library pattern: {}", pattern))?
            .compile_matcher();

        let mut best: Option<RemoteFile> = None;
        for entry in WalkDir::new(&dir).max_depth(1).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !matcher.is_match(&name) {
                continue;
            }
            let modified_secs = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            let candidate = RemoteFile {
                path: format!("{}/{}", folder.trim_end_matches('/'), name),
                name,
                modified_secs,
            };
            let newer = match &best {
                Some(current) => candidate.modified_secs > current.modified_secs,
                None => true,
            };
            if newer {
                best = Some(candidate);
            }
        }
        Ok(best)
    }

    fn download(&self, remote_path: &str, dest: &Path) -> Result<()> {
        let src = self.resolve_path(remote_path);
        std::fs::copy(&src, dest).with_context(|| {
            format!("Failed to download {} -> {}", src.display(), dest.display())
        })?;
        Ok(())
    }

    fn upload(&self, src: &Path, remote_folder: &str, name: &str) -> Result<()> {
        let dir = self.resolve_path(remote_folder);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create library folder: {}", dir.display()))?;
        let dest = dir.join(name);
        std::fs::copy(src, &dest)
            .with_context(|| format!("Failed to upload {} -> {}", src.display(), dest.display()))?;
        Ok(())
    }
}

/// Instantiate the library client for the configuration.
pub fn create_client(config: &LibraryConfig) -> Box<dyn LibraryClient> {
    Box::new(FolderLibrary::new(config))
}
