//! Output side of a run: the spreadsheet and the optional raw-response dump.
//!
//! [`write_xlsx`] writes one header row plus one row per [`FlatRow`](crate::response::FlatRow)
//! in the table's column order. Numbers stay numeric, empty cells stay blank.
//! The raw dump ([`write_responses_json`]) keeps the unflattened responses so a
//! run can be re-flattened later without uploading again.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

use crate::response::{CellValue, RawResponse, Table};

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

#[derive(Debug, Clone)]
pub struct SheetOptions {
    /// Write a leading positional index column (0-based, unnamed header).
    pub include_index: bool,
    pub sheet_name: String,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            include_index: false,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to write spreadsheet {path}: {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },
    #[error("table does not fit in a worksheet: {0}")]
    TooLarge(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid response dump {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Writes `table` to an `.xlsx` file at `path`, replacing any existing file.
pub fn write_xlsx(table: &Table, path: &Path, options: &SheetOptions) -> Result<(), SheetError> {
    let xlsx_err = |source| SheetError::Xlsx {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&options.sheet_name).map_err(xlsx_err)?;

    let offset: u16 = if options.include_index { 1 } else { 0 };
    let bold = Format::new().set_bold();

    for (index, column) in table.columns.iter().enumerate() {
        let col = column_index(index, offset)?;
        worksheet
            .write_string_with_format(0, col, column.as_str(), &bold)
            .map_err(xlsx_err)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let sheet_row = u32::try_from(index + 1)
            .map_err(|_| SheetError::TooLarge(format!("{} rows", table.rows.len())))?;
        if options.include_index {
            worksheet
                .write_number(sheet_row, 0, index as f64)
                .map_err(xlsx_err)?;
        }
        for (col_index, column) in table.columns.iter().enumerate() {
            let col = column_index(col_index, offset)?;
            if let Some(cell) = row.get(column) {
                write_cell(worksheet, sheet_row, col, cell).map_err(xlsx_err)?;
            }
        }
    }

    workbook.save(path).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to save spreadsheet");
        xlsx_err(e)
    })?;
    info!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.columns.len(),
        "Spreadsheet written"
    );
    Ok(())
}

fn column_index(index: usize, offset: u16) -> Result<u16, SheetError> {
    u16::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(offset))
        .ok_or_else(|| SheetError::TooLarge(format!("{} columns", index + 1)))
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<(), XlsxError> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

/// Saves raw responses as a pretty-printed JSON array.
pub fn write_responses_json(responses: &[RawResponse], path: &Path) -> Result<(), SheetError> {
    let json = serde_json::to_string_pretty(responses).map_err(|source| SheetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| SheetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), responses = responses.len(), "Raw responses written");
    Ok(())
}

/// Loads a dump written by [`write_responses_json`].
pub fn read_responses_json(path: &Path) -> Result<Vec<RawResponse>, SheetError> {
    let content = fs::read_to_string(path).map_err(|source| SheetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SheetError::Json {
        path: path.to_path_buf(),
        source,
    })
}
