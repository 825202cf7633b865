//! Removal of generated artifacts.
//!
//! Deletes each job's newest artifact so the rotation can be re-run
//! against the previous week. This lives in the CLI layer only; the
//! rotation core never deletes anything.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::resolve::resolve;

pub fn clean(config: &Config, only: Option<&str>) -> Result<()> {
    if let Some(name) = only {
        if !config.jobs.iter().any(|j| j.name == name) {
            anyhow::bail!("unknown job: '{}'", name);
        }
    }

    for job in &config.jobs {
        if only.is_some_and(|name| name != job.name) {
            continue;
        }
        let folder = config.base_dir.join(&job.folder);
        if !folder.is_dir() {
            println!("{}: folder missing", job.name);
            continue;
        }
        match resolve(&folder, &job.prefix, &job.ext) {
            Ok(resolved) => {
                std::fs::remove_file(&resolved.path).with_context(|| {
                    format!("failed to remove {}", resolved.path.display())
                })?;
                println!(
                    "{}: removed {}",
                    job.name,
                    resolved.path.file_name().unwrap_or_default().to_string_lossy()
                );
            }
            Err(_) => println!("{}: no artifact found", job.name),
        }
    }
    Ok(())
}
