//! Workbook driver abstraction.
//!
//! The [`WorkbookDriver`] trait is the seam between the rotation engine and
//! whatever actually opens spreadsheets: a COM-automated desktop
//! application in production, the JSON-backed [`JsonDriver`] in this tree.
//! One driver instance holds at most one open workbook at a time; the job
//! runner owns the instance and is the only component that opens or closes
//! it.
//!
//! # Session contract
//!
//! | Rule | Behavior |
//! |------|----------|
//! | `open` while a workbook is open | error |
//! | any workbook operation with nothing open | error |
//! | `close` with nothing open | no-op `Ok` (safe for cleanup paths) |
//!
//! [`JsonDriver`]: crate::driver_json::JsonDriver

use anyhow::Result;
use std::path::Path;

use crate::config::DriverConfig;
use crate::driver_json::JsonDriver;
use crate::models::{CellValue, ConnectionStatus};

/// Exclusive session against one spreadsheet artifact.
pub trait WorkbookDriver {
    /// Open the workbook at `path`. Errors if a workbook is already open.
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Read a cell value (e.g. `read_cell("REPORT_HEBDO", "A1")`).
    fn read_cell(&mut self, sheet: &str, cell: &str) -> Result<CellValue>;

    /// Write a cell value.
    fn write_cell(&mut self, sheet: &str, cell: &str, value: CellValue) -> Result<()>;

    /// Names of all embedded queries, in a stable order.
    fn query_names(&mut self) -> Result<Vec<String>>;

    /// Text of the named embedded query. Name match is case-insensitive;
    /// `None` when no query carries the name.
    fn query_text(&mut self, name: &str) -> Result<Option<String>>;

    /// Replace the text of the named embedded query (case-insensitive match).
    fn set_query_text(&mut self, name: &str, text: &str) -> Result<()>;

    /// Paths of all external file-reference links.
    fn external_links(&mut self) -> Result<Vec<String>>;

    /// Repoint one external link from `old` to `new`.
    fn repoint_link(&mut self, old: &str, new: &str) -> Result<()>;

    /// Enable every data-connection gate; returns how many connections are
    /// now enabled. Some connections start disabled and will not recompute
    /// until this is called.
    fn enable_connections(&mut self) -> Result<usize>;

    /// Trigger recomputation of all live queries. Returns immediately;
    /// completion is observed via [`connection_status`](Self::connection_status).
    fn recompute_all(&mut self) -> Result<()>;

    /// Current refresh state of every data connection.
    fn connection_status(&mut self) -> Result<Vec<ConnectionStatus>>;

    /// Persist the open workbook in place.
    fn save(&mut self) -> Result<()>;

    /// Close the open workbook, optionally saving first. No-op when nothing
    /// is open.
    fn close(&mut self, save_changes: bool) -> Result<()>;
}

/// Instantiate the driver selected by the configuration.
pub fn create_driver(config: &DriverConfig) -> Result<Box<dyn WorkbookDriver>> {
    match config.kind.as_str() {
        "json" => Ok(Box::new(JsonDriver::new())),
        other => anyhow::bail!("Unknown driver kind: '{}'. Must be json.", other),
    }
}
