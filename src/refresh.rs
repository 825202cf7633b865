//! Refresh orchestration for live data connections.
//!
//! Recompute-all is triggered twice: once with a bounded settlement wait,
//! then a second unconditional pass. The first pass can settle before
//! downstream dependent formulas re-evaluate, so the re-trigger plus a
//! short pause is required before the final status report.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::config::DriverConfig;
use crate::driver::WorkbookDriver;

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// Upper bound on the settlement wait.
    pub timeout: Duration,
    /// Cadence of connection-status polls.
    pub poll_interval: Duration,
    /// Pause after the second recompute pass.
    pub resettle_pause: Duration,
}

impl RefreshOptions {
    pub fn from_config(driver: &DriverConfig, timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_secs(driver.poll_interval_secs),
            resettle_pause: Duration::from_secs(driver.resettle_pause_secs),
        }
    }
}

/// Recompute all live queries and wait for settlement.
///
/// Returns `false` when connections were still in progress at `timeout`.
/// That is non-fatal: partial data is preferred over blocking forever, and
/// the caller proceeds to save with a warning.
pub fn refresh_all(driver: &mut dyn WorkbookDriver, options: &RefreshOptions) -> Result<bool> {
    let enabled = driver.enable_connections()?;
    println!("  {} connection(s) enabled", enabled);

    driver.recompute_all()?;

    let started = Instant::now();
    let settled = loop {
        let in_progress = driver
            .connection_status()?
            .iter()
            .filter(|c| c.in_progress)
            .count();
        if in_progress == 0 {
            break true;
        }
        if started.elapsed() > options.timeout {
            eprintln!(
                "  warning: {} connection(s) still in progress after {:?}",
                in_progress, options.timeout
            );
            break false;
        }
        std::thread::sleep(options.poll_interval);
    };

    // Second pass: dependent formulas can lag the first one.
    driver.recompute_all()?;
    std::thread::sleep(options.resettle_pause);

    for status in driver.connection_status()? {
        let state = if status.in_progress { "in progress" } else { "OK" };
        println!("  connection '{}': {}", status.name, state);
    }

    Ok(settled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver_json::{ConnectionModel, JsonDriver, WorkbookModel};

    fn driver_with_connection(settle_polls: u32) -> (tempfile::TempDir, JsonDriver) {
        let mut model = WorkbookModel::default();
        model.connections.push(ConnectionModel {
            name: "Query - feed".to_string(),
            enabled: false,
            settle_polls,
            in_flight: 0,
        });
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("WB_S01.xlsx");
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        let mut driver = JsonDriver::new();
        driver.open(&path).unwrap();
        (tmp, driver)
    }

    fn fast_options(timeout_ms: u64) -> RefreshOptions {
        RefreshOptions {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(1),
            resettle_pause: Duration::from_millis(1),
        }
    }

    #[test]
    fn settles_within_timeout() {
        let (_tmp, mut driver) = driver_with_connection(3);
        assert!(refresh_all(&mut driver, &fast_options(5_000)).unwrap());
    }

    #[test]
    fn times_out_and_reports_unsettled() {
        let (_tmp, mut driver) = driver_with_connection(10_000);
        assert!(!refresh_all(&mut driver, &fast_options(10)).unwrap());
    }

    #[test]
    fn no_connections_settles_immediately() {
        let mut model = WorkbookModel::default();
        model.connections.clear();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("WB_S01.xlsx");
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        let mut driver = JsonDriver::new();
        driver.open(&path).unwrap();

        assert!(refresh_all(&mut driver, &fast_options(100)).unwrap());
    }
}
