use anyhow::Result;

use crate::config::Config;
use crate::resolve::{resolve, week_tag};

/// Print configured jobs with folder health and the latest resolved week.
pub fn list_jobs(config: &Config) -> Result<()> {
    println!("{:<16} {:<20} {:<12} LATEST", "JOB", "FOLDER", "STATUS");
    for job in &config.jobs {
        let folder = config.base_dir.join(&job.folder);
        let (status, latest) = if !folder.is_dir() {
            ("MISSING", "-".to_string())
        } else {
            match resolve(&folder, &job.prefix, &job.ext) {
                Ok(resolved) => ("OK", week_tag(resolved.ordinal)),
                Err(_) => ("NO ARTIFACT", "-".to_string()),
            }
        };
        println!("{:<16} {:<20} {:<12} {}", job.name, job.folder, status, latest);
    }
    Ok(())
}
