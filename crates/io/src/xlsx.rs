// Excel discrepancy report (xlsx only)
//
// Writes a `RenderPlan` to a single sheet. Marked cells get a solid fill per
// error code; everything else is written as a plain typed value.

use std::path::Path;

use datarecon_recon::{ErrorCode, Value};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

use crate::error::{IoError, Result};
use crate::render::{RenderCell, RenderPlan};

pub const SHEET_NAME: &str = "Discrepancies";

/// Largest integer Excel stores without losing digits.
const EXCEL_MAX_EXACT: u64 = 999_999_999_999_999;

/// Fill color for each error code.
pub fn fill_color(code: ErrorCode) -> u32 {
    match code {
        ErrorCode::ValueMismatch => 0xFF0000,
        ErrorCode::DuplicateInActual | ErrorCode::DuplicateInExpected => 0xEBAE34,
        ErrorCode::MissingFromActual => 0x8A0000,
        ErrorCode::ExcessInActual => 0x108A00,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub rows_written: usize,
    pub marked_rows: usize,
    pub marked_cells: usize,
}

pub fn export(plan: &RenderPlan, path: &Path) -> Result<ExportResult> {
    let mut result = ExportResult::default();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(SHEET_NAME)?;

    let header = Format::new().set_bold();
    for (col, name) in plan.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col_index(col)?, name, &header)?;
    }
    if !plan.headers.is_empty() {
        worksheet.set_freeze_panes(1, 0)?;
    }

    let message_col = col_index(plan.headers.len().saturating_sub(1))?;
    for (idx, row) in plan.rows.iter().enumerate() {
        let row32 = u32::try_from(idx + 1)
            .map_err(|_| IoError::Shape(format!("too many rows for Excel: {}", plan.rows.len())))?;

        for (col, cell) in row.cells.iter().enumerate() {
            let col16 = col_index(col)?;
            match cell.style {
                Some(code) => {
                    let format = Format::new().set_background_color(Color::RGB(fill_color(code)));
                    write_cell(worksheet, row32, col16, cell, &format)?;
                    result.marked_cells += 1;
                }
                None => write_cell(worksheet, row32, col16, cell, &Format::new())?,
            }
        }

        if let Some(message) = &row.message {
            worksheet.write_string(row32, message_col, message)?;
            result.marked_rows += 1;
        }
        result.rows_written += 1;
    }

    workbook.save(path)?;
    tracing::debug!(path = %path.display(), rows = result.rows_written, "wrote Excel report");
    Ok(result)
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &RenderCell, format: &Format) -> Result<()> {
    if let Some(note) = &cell.note {
        worksheet.write_string_with_format(row, col, note, format)?;
        return Ok(());
    }
    match &cell.value {
        v if v.is_missing() => {
            worksheet.write_blank(row, col, format)?;
        }
        Value::Bool(b) => {
            worksheet.write_boolean_with_format(row, col, *b, format)?;
        }
        Value::Int(i) if i.unsigned_abs() <= EXCEL_MAX_EXACT => {
            worksheet.write_number_with_format(row, col, *i as f64, format)?;
        }
        Value::Float(f) => {
            worksheet.write_number_with_format(row, col, *f, format)?;
        }
        other => {
            worksheet.write_string_with_format(row, col, other.to_text(), format)?;
        }
    }
    Ok(())
}

fn col_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| IoError::Shape(format!("too many columns for Excel: {col}")))
}
