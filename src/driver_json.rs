//! JSON-backed [`WorkbookDriver`] implementation.
//!
//! Workbook state (sheets, embedded query text, external links, data
//! connections) lives as a JSON document inside the artifact file itself.
//! This is the in-tree reference driver: integration tests rotate real
//! files with it, and it doubles as the development stand-in where no
//! desktop spreadsheet application is available.
//!
//! Refresh is simulated deterministically: `recompute_all` puts every
//! enabled connection in flight for its `settle_polls` count, and each
//! `connection_status` call ticks the countdown down by one. A connection
//! with `settle_polls = 0` settles before the first poll; a large count
//! exercises the orchestrator's timeout path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::driver::WorkbookDriver;
use crate::models::{CellValue, ConnectionStatus};

/// Serialized workbook state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkbookModel {
    /// Sheet name → cell reference → value.
    #[serde(default)]
    pub sheets: BTreeMap<String, BTreeMap<String, CellValue>>,
    /// Embedded query name → query text.
    #[serde(default)]
    pub queries: BTreeMap<String, String>,
    /// External file-reference link paths.
    #[serde(default)]
    pub external_links: Vec<String>,
    #[serde(default)]
    pub connections: Vec<ConnectionModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionModel {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    /// How many status polls a recompute stays in progress for.
    #[serde(default)]
    pub settle_polls: u32,
    /// Remaining in-flight polls; runtime state, never persisted.
    #[serde(skip)]
    pub in_flight: u32,
}

struct OpenWorkbook {
    path: PathBuf,
    model: WorkbookModel,
}

/// File-backed driver over [`WorkbookModel`] JSON artifacts.
pub struct JsonDriver {
    open: Option<OpenWorkbook>,
}

impl JsonDriver {
    pub fn new() -> Self {
        Self { open: None }
    }

    fn workbook(&mut self) -> Result<&mut OpenWorkbook> {
        self.open.as_mut().context("no workbook open")
    }

    fn find_query(&mut self, name: &str) -> Result<Option<String>> {
        let wb = self.workbook()?;
        Ok(wb
            .model
            .queries
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned())
    }
}

impl Default for JsonDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookDriver for JsonDriver {
    fn open(&mut self, path: &Path) -> Result<()> {
        if let Some(open) = &self.open {
            bail!(
                "a workbook is already open: {} (close it first)",
                open.path.display()
            );
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workbook: {}", path.display()))?;
        let model: WorkbookModel = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse workbook model: {}", path.display()))?;
        self.open = Some(OpenWorkbook {
            path: path.to_path_buf(),
            model,
        });
        Ok(())
    }

    fn read_cell(&mut self, sheet: &str, cell: &str) -> Result<CellValue> {
        let wb = self.workbook()?;
        let cells = wb
            .model
            .sheets
            .get(sheet)
            .with_context(|| format!("sheet '{}' not found", sheet))?;
        Ok(cells.get(cell).cloned().unwrap_or(CellValue::Empty))
    }

    fn write_cell(&mut self, sheet: &str, cell: &str, value: CellValue) -> Result<()> {
        let wb = self.workbook()?;
        let cells = wb
            .model
            .sheets
            .get_mut(sheet)
            .with_context(|| format!("sheet '{}' not found", sheet))?;
        cells.insert(cell.to_string(), value);
        Ok(())
    }

    fn query_names(&mut self) -> Result<Vec<String>> {
        let wb = self.workbook()?;
        Ok(wb.model.queries.keys().cloned().collect())
    }

    fn query_text(&mut self, name: &str) -> Result<Option<String>> {
        let key = self.find_query(name)?;
        let wb = self.workbook()?;
        Ok(key.and_then(|k| wb.model.queries.get(&k).cloned()))
    }

    fn set_query_text(&mut self, name: &str, text: &str) -> Result<()> {
        let key = self
            .find_query(name)?
            .with_context(|| format!("query '{}' not found", name))?;
        let wb = self.workbook()?;
        wb.model.queries.insert(key, text.to_string());
        Ok(())
    }

    fn external_links(&mut self) -> Result<Vec<String>> {
        let wb = self.workbook()?;
        Ok(wb.model.external_links.clone())
    }

    fn repoint_link(&mut self, old: &str, new: &str) -> Result<()> {
        let wb = self.workbook()?;
        let link = wb
            .model
            .external_links
            .iter_mut()
            .find(|l| l.as_str() == old)
            .with_context(|| format!("external link not found: {}", old))?;
        *link = new.to_string();
        Ok(())
    }

    fn enable_connections(&mut self) -> Result<usize> {
        let wb = self.workbook()?;
        for conn in &mut wb.model.connections {
            conn.enabled = true;
        }
        Ok(wb.model.connections.len())
    }

    fn recompute_all(&mut self) -> Result<()> {
        let wb = self.workbook()?;
        for conn in &mut wb.model.connections {
            if conn.enabled {
                conn.in_flight = conn.settle_polls;
            }
        }
        Ok(())
    }

    fn connection_status(&mut self) -> Result<Vec<ConnectionStatus>> {
        let wb = self.workbook()?;
        let statuses = wb
            .model
            .connections
            .iter()
            .map(|c| ConnectionStatus {
                name: c.name.clone(),
                in_progress: c.in_flight > 0,
            })
            .collect();
        // Each observation is one poll tick.
        for conn in &mut wb.model.connections {
            conn.in_flight = conn.in_flight.saturating_sub(1);
        }
        Ok(statuses)
    }

    fn save(&mut self) -> Result<()> {
        let wb = self.workbook()?;
        let content = serde_json::to_string_pretty(&wb.model)?;
        std::fs::write(&wb.path, content)
            .with_context(|| format!("Failed to save workbook: {}", wb.path.display()))?;
        Ok(())
    }

    fn close(&mut self, save_changes: bool) -> Result<()> {
        if self.open.is_none() {
            return Ok(());
        }
        if save_changes {
            self.save()?;
        }
        self.open = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_model() -> WorkbookModel {
        let mut model = WorkbookModel::default();
        let mut cells = BTreeMap::new();
        cells.insert(
            "A1".to_string(),
            CellValue::DateTime(
                NaiveDate::from_ymd_opt(2026, 1, 5)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
        );
        model.sheets.insert("REPORT_HEBDO".to_string(), cells);
        model
            .queries
            .insert("selligent_all".to_string(), "Source/2026_S03.csv".to_string());
        model.connections.push(ConnectionModel {
            name: "Query - selligent_all".to_string(),
            enabled: false,
            settle_polls: 2,
            in_flight: 0,
        });
        model
    }

    fn open_driver(model: &WorkbookModel) -> (tempfile::TempDir, JsonDriver, PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("WB_S03.xlsx");
        std::fs::write(&path, serde_json::to_string(model).unwrap()).unwrap();
        let mut driver = JsonDriver::new();
        driver.open(&path).unwrap();
        (tmp, driver, path)
    }

    #[test]
    fn read_write_roundtrip_through_save() {
        let (_tmp, mut driver, path) = open_driver(&sample_model());
        driver
            .write_cell("REPORT_HEBDO", "B2", CellValue::Text("hello".into()))
            .unwrap();
        driver.close(true).unwrap();

        let mut reopened = JsonDriver::new();
        reopened.open(&path).unwrap();
        assert_eq!(
            reopened.read_cell("REPORT_HEBDO", "B2").unwrap(),
            CellValue::Text("hello".into())
        );
    }

    #[test]
    fn missing_cell_reads_empty_missing_sheet_errors() {
        let (_tmp, mut driver, _path) = open_driver(&sample_model());
        assert_eq!(
            driver.read_cell("REPORT_HEBDO", "Z99").unwrap(),
            CellValue::Empty
        );
        assert!(driver.read_cell("NO_SUCH_SHEET", "A1").is_err());
    }

    #[test]
    fn query_lookup_is_case_insensitive() {
        let (_tmp, mut driver, _path) = open_driver(&sample_model());
        let text = driver.query_text("SELLIGENT_ALL").unwrap();
        assert_eq!(text.as_deref(), Some("Source/2026_S03.csv"));
        assert!(driver.query_text("unknown").unwrap().is_none());

        driver
            .set_query_text("Selligent_All", "Source/2026_S04.csv")
            .unwrap();
        assert_eq!(
            driver.query_text("selligent_all").unwrap().as_deref(),
            Some("Source/2026_S04.csv")
        );
    }

    #[test]
    fn open_while_open_is_rejected_close_is_idempotent() {
        let (_tmp, mut driver, path) = open_driver(&sample_model());
        assert!(driver.open(&path).is_err());
        driver.close(false).unwrap();
        driver.close(false).unwrap();
        assert!(driver.read_cell("REPORT_HEBDO", "A1").is_err());
    }

    #[test]
    fn refresh_ticks_down_per_status_poll() {
        let (_tmp, mut driver, _path) = open_driver(&sample_model());
        assert_eq!(driver.enable_connections().unwrap(), 1);
        driver.recompute_all().unwrap();

        let first = driver.connection_status().unwrap();
        assert!(first[0].in_progress);
        let second = driver.connection_status().unwrap();
        assert!(second[0].in_progress);
        let third = driver.connection_status().unwrap();
        assert!(!third[0].in_progress);
    }

    #[test]
    fn disabled_connections_never_go_in_flight() {
        let (_tmp, mut driver, _path) = open_driver(&sample_model());
        driver.recompute_all().unwrap();
        let statuses = driver.connection_status().unwrap();
        assert!(!statuses[0].in_progress);
    }
}
