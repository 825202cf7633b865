//! Core data models shared across the rotation pipeline.
//!
//! These types represent the values that flow between the resolver, the
//! workbook driver, and the refresh orchestrator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fixed rotation step: one reporting period is one week.
pub const WEEK_STEP_DAYS: i64 = 7;

/// Textual format accepted when a date cell holds text instead of a native
/// datetime value.
pub const CELL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A spreadsheet cell value as seen through the workbook driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    #[serde(rename = "datetime")]
    DateTime(NaiveDateTime),
    #[serde(rename = "number")]
    Number(f64),
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "empty")]
    Empty,
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(CELL_DATE_FORMAT)),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Empty => write!(f, "<empty>"),
        }
    }
}

/// Refresh state of one data connection inside an open workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub name: String,
    pub in_progress: bool,
}
