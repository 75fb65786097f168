//! Spreadsheet export.
//!
//! One worksheet named `Sheet1`, a bold header row, then one row per result.
//! Cell text longer than the spreadsheet limit of 32 767 characters is cut
//! at that limit.

use super::table_rows;
use crate::error::ExportError;
use crate::models::PageResult;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::{debug, instrument};

const SHEET_NAME: &str = "Sheet1";
const MAX_CELL_CHARS: usize = 32_767;
const URL_COLUMN_WIDTH: f64 = 60.0;
const CONTENT_COLUMN_WIDTH: f64 = 120.0;

/// Serialize results to an `.xlsx` workbook held in memory.
#[instrument(level = "info", skip_all, fields(rows = results.len()))]
pub fn write_workbook(results: &[PageResult]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;
        worksheet.set_column_width(0, URL_COLUMN_WIDTH)?;
        worksheet.set_column_width(1, CONTENT_COLUMN_WIDTH)?;

        for (row, cells) in table_rows(results).into_iter().enumerate() {
            let row = u32::try_from(row).map_err(|_| XlsxError::RowColumnLimitError)?;
            for (col, text) in (0u16..).zip(cells) {
                let text = clamp_cell(text);
                if row == 0 {
                    worksheet.write_string_with_format(row, col, text, &header)?;
                } else {
                    worksheet.write_string(row, col, text)?;
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(bytes = bytes.len(), "Built workbook");
    Ok(bytes)
}

/// Cut `text` to the maximum cell length on a char boundary.
fn clamp_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
