use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};

use crate::driver::WorkbookDriver;
use crate::error::RotateError;
use crate::models::{CellValue, CELL_DATE_FORMAT};

/// Advance the date held in `sheet`!`cell` by `delta_days` calendar days.
///
/// A native datetime value is used directly; text is parsed against
/// `YYYY-MM-DD HH:MM:SS`. Anything else aborts the job with no partial
/// write. Returns the old and new values.
pub fn advance_date(
    driver: &mut dyn WorkbookDriver,
    sheet: &str,
    cell: &str,
    delta_days: i64,
) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let value = driver
        .read_cell(sheet, cell)
        .with_context(|| format!("failed to read {}!{}", sheet, cell))?;

    let old = match &value {
        CellValue::DateTime(dt) => *dt,
        CellValue::Text(s) => NaiveDateTime::parse_from_str(s.trim(), CELL_DATE_FORMAT).map_err(
            |_| RotateError::InvalidDate {
                sheet: sheet.to_string(),
                cell: cell.to_string(),
                value: value.to_string(),
            },
        )?,
        _ => {
            return Err(RotateError::InvalidDate {
                sheet: sheet.to_string(),
                cell: cell.to_string(),
                value: value.to_string(),
            }
            .into())
        }
    };

    // Pure calendar offset: no timezone, no DST.
    let new = old + Duration::days(delta_days);

    driver
        .write_cell(sheet, cell, CellValue::DateTime(new))
        .map_err(|e| RotateError::WriteFailed {
            sheet: sheet.to_string(),
            cell: cell.to_string(),
            cause: format!("{:#}", e),
        })?;

    Ok((old, new))
}
