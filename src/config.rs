use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Root directory containing one sub-folder per job.
    pub base_dir: PathBuf,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub library: Option<LibraryConfig>,
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DriverConfig {
    #[serde(default = "default_driver_kind")]
    pub kind: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_resettle_pause")]
    pub resettle_pause_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: default_driver_kind(),
            poll_interval_secs: default_poll_interval(),
            resettle_pause_secs: default_resettle_pause(),
        }
    }
}

fn default_driver_kind() -> String {
    "json".to_string()
}
fn default_poll_interval() -> u64 {
    2
}
fn default_resettle_pause() -> u64 {
    5
}

/// Local mirror of the remote document library. Jobs carrying a `[jobs.remote]`
/// section fetch their source artifact from here and publish the result back.
#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JobConfig {
    pub name: String,
    pub folder: String,
    pub prefix: String,
    #[serde(default = "default_ext")]
    pub ext: String,
    #[serde(default)]
    pub date_cell: Option<DateCell>,
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_secs: u64,
    #[serde(default)]
    pub queries: Vec<QueryRule>,
    #[serde(default)]
    pub linked_prefixes: Vec<String>,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

fn default_ext() -> String {
    ".xlsx".to_string()
}
fn default_refresh_timeout() -> u64 {
    300
}

/// Location of the cell holding the reporting-period date.
#[derive(Debug, Deserialize, Clone)]
pub struct DateCell {
    pub sheet: String,
    pub cell: String,
}

/// One embedded query to patch, and how.
#[derive(Debug, Deserialize, Clone)]
pub struct QueryRule {
    pub name: String,
    pub rule: RuleKind,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Rewrite `YYYY_Sxx` week tokens embedded in storage paths.
    #[serde(rename = "ordinal")]
    Ordinal,
    /// Shift every ISO date literal by one week.
    #[serde(rename = "date-shift")]
    DateShift,
}

/// Remote document-library round-trip for one job.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    pub folder: String,
    pub pattern: String,
}

impl JobConfig {
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.jobs.is_empty() {
        anyhow::bail!("at least one [[jobs]] entry is required");
    }

    let mut seen = std::collections::HashSet::new();
    for job in &config.jobs {
        if job.name.is_empty() {
            anyhow::bail!("jobs.name must not be empty");
        }
        if !seen.insert(job.name.as_str()) {
            anyhow::bail!("duplicate job name: '{}'", job.name);
        }
        if !job.ext.starts_with('.') {
            anyhow::bail!(
                "jobs.ext must start with '.' (job '{}' has '{}')",
                job.name,
                job.ext
            );
        }
        if job.prefix.is_empty() {
            anyhow::bail!("jobs.prefix must not be empty (job '{}')", job.name);
        }
        if let Some(cell) = &job.date_cell {
            if cell.sheet.is_empty() || cell.cell.is_empty() {
                anyhow::bail!("jobs.date_cell needs both sheet and cell (job '{}')", job.name);
            }
        }
        if job.remote.is_some() && config.library.is_none() {
            anyhow::bail!(
                "job '{}' has [jobs.remote] but no [library] section is configured",
                job.name
            );
        }
    }

    match config.driver.kind.as_str() {
        "json" => {}
        other => anyhow::bail!("Unknown driver kind: '{}'. Must be json.", other),
    }

    Ok(config)
}
