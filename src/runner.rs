//! Job orchestration.
//!
//! Runs the configured jobs strictly in sequence against one driver
//! instance. Each job is isolated: a hard failure is caught here, reported,
//! and recorded as ERROR without stopping the remaining jobs. The workbook
//! is released best-effort on every exit path; only the release's own
//! error is swallowed, never the original failure.

use std::path::Path;

use anyhow::{Context, Result};

use crate::advance::advance_date;
use crate::config::{Config, JobConfig, RemoteConfig};
use crate::driver::{create_driver, WorkbookDriver};
use crate::duplicate::duplicate;
use crate::error::RotateError;
use crate::library::{create_client, LibraryClient};
use crate::models::WEEK_STEP_DAYS;
use crate::patch::{patch_query, repoint_links};
use crate::refresh::{refresh_all, RefreshOptions};
use crate::resolve::{artifact_name, resolve, similar_names, week_tag, Resolved};

/// Rotate every selected job. Returns one `(name, success)` entry per job,
/// in execution order.
pub fn run_jobs(
    config: &Config,
    only: Option<&str>,
    dry_run: bool,
) -> Result<Vec<(String, bool)>> {
    let selected: Vec<&JobConfig> = match only {
        Some(name) => vec![config
            .jobs
            .iter()
            .find(|j| j.name == name)
            .with_context(|| format!("unknown job: '{}'", name))?],
        None => config.jobs.iter().collect(),
    };

    let mut driver = create_driver(&config.driver)?;
    let library = config.library.as_ref().map(|c| create_client(c));

    let mut results = Vec::new();
    for job in selected {
        println!();
        println!("=== {} ===", job.name);
        let success = match run_job(config, job, driver.as_mut(), library.as_deref(), dry_run) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("  ERROR: {:#}", e);
                // Release the workbook so the next job can open its own.
                let _ = driver.close(false);
                false
            }
        };
        results.push((job.name.clone(), success));
    }
    Ok(results)
}

/// Print the final OK/ERROR summary for a run.
pub fn print_summary(results: &[(String, bool)]) {
    println!();
    println!("=== summary ===");
    for (name, ok) in results {
        println!("  {}: {}", name, if *ok { "OK" } else { "ERROR" });
    }
    let failed: Vec<&str> = results
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name.as_str())
        .collect();
    if failed.is_empty() {
        println!("  all jobs completed successfully");
    } else {
        println!("  {} job(s) failed: {}", failed.len(), failed.join(", "));
    }
}

fn run_job(
    config: &Config,
    job: &JobConfig,
    driver: &mut dyn WorkbookDriver,
    library: Option<&dyn LibraryClient>,
    dry_run: bool,
) -> Result<()> {
    let folder = config.base_dir.join(&job.folder);
    if !folder.is_dir() {
        return Err(RotateError::NotFound(folder).into());
    }

    if let Some(remote) = &job.remote {
        let client = library.context("[library] section is not configured")?;
        stage_from_library(client, remote, &folder)?;
    }

    println!("  [1/5] resolving latest {}_S*{}", job.prefix, job.ext);
    let resolved = resolve_with_diagnosis(&folder, job)?;
    let next = resolved.ordinal + 1;
    let source_name = resolved
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    println!(
        "  found {} ({} -> {})",
        source_name,
        week_tag(resolved.ordinal),
        week_tag(next)
    );

    let new_name = artifact_name(&job.prefix, next, &job.ext);
    let dest = folder.join(&new_name);

    if dry_run {
        println!("  dry-run: would duplicate {} -> {}", source_name, new_name);
        return Ok(());
    }

    println!("  [2/5] duplicating {} -> {}", source_name, new_name);
    duplicate(&resolved.path, &dest)?;

    println!("  [3/5] opening {} and patching", new_name);
    driver
        .open(&dest)
        .with_context(|| format!("failed to open {}", dest.display()))?;

    if let Some(cell) = &job.date_cell {
        let (old, new) = advance_date(driver, &cell.sheet, &cell.cell, WEEK_STEP_DAYS)?;
        println!(
            "  date {}!{}: {} -> {}",
            cell.sheet,
            cell.cell,
            old.format("%d/%m/%Y"),
            new.format("%d/%m/%Y")
        );
    }

    if !job.linked_prefixes.is_empty() {
        repoint_links(driver, &job.linked_prefixes, resolved.ordinal, next)?;
    }

    for rule in &job.queries {
        // Query-level problems are warnings; later rules still run.
        if let Err(e) = patch_query(driver, rule, resolved.ordinal, next) {
            eprintln!("  warning: {:#}", e);
        }
    }

    println!("  [4/5] refreshing data connections");
    let options = RefreshOptions::from_config(&config.driver, job.refresh_timeout());
    if !refresh_all(driver, &options)? {
        eprintln!("  warning: refresh may be incomplete, saving anyway");
    }

    println!("  [5/5] saving {}", new_name);
    driver.save()?;
    driver.close(false)?;

    if let Some(remote) = &job.remote {
        let client = library.context("[library] section is not configured")?;
        println!("  uploading {} to {}", new_name, remote.folder);
        client.upload(&dest, &remote.folder, &new_name)?;
    }

    println!("  {}: done", new_name);
    Ok(())
}

fn resolve_with_diagnosis(folder: &Path, job: &JobConfig) -> Result<Resolved> {
    resolve(folder, &job.prefix, &job.ext).map_err(|e| {
        if matches!(e, RotateError::NoCandidate { .. }) {
            let names = similar_names(folder, &job.prefix);
            if names.is_empty() {
                eprintln!("  no {}* files in {}", job.prefix, folder.display());
            } else {
                eprintln!("  available files:");
                for name in names {
                    eprintln!("    - {}", name);
                }
            }
        }
        e.into()
    })
}

fn stage_from_library(
    client: &dyn LibraryClient,
    remote: &RemoteConfig,
    folder: &Path,
) -> Result<()> {
    let found = client
        .find(&remote.folder, &remote.pattern)?
        .ok_or_else(|| {
            RotateError::NotFound(
                std::path::PathBuf::from(&remote.folder).join(&remote.pattern),
            )
        })?;
    println!("  downloading {} from the library", found.name);
    client.download(&found.path, &folder.join(&found.name))?;
    Ok(())
}
