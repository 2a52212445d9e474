//! Spreadsheet import (first worksheet or CSV) and test-plan export.

use crate::domain::error::{AppError, Result};
use crate::domain::project::ValidationProject;
use calamine::{open_workbook_auto, Reader};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::path::Path;
use tracing::{debug, info};

pub const EXPORT_HEADERS: [&str; 7] = [
    "Test Case ID",
    "Requirement ID",
    "Test Title",
    "Step #",
    "Action",
    "Expected Result",
    "Status",
];

/// One data row keyed by the header row, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    cells: Vec<(String, String)>,
}

impl SheetRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }

    /// Case-sensitive header lookup; blank cells count as missing.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, value)| name == header && !value.trim().is_empty())
            .map(|(_, value)| value.as_str())
    }

    /// Value of the first column, blank or not.
    pub fn first_value(&self) -> Option<&str> {
        self.cells.first().map(|(_, value)| value.as_str())
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.trim().is_empty())
    }
}

pub fn read_rows(path: &Path) -> Result<Vec<SheetRow>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" => read_csv_rows(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook_rows(path)?,
        other => {
            return Err(AppError::ParseError(format!(
                "Unsupported spreadsheet type: .{}",
                other
            )))
        }
    };

    info!(path = %path.display(), rows = rows.len(), "Spreadsheet rows read");
    Ok(rows)
}

fn read_workbook_rows(path: &Path) -> Result<Vec<SheetRow>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::ParseError(format!("Failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
        .map_err(|e| AppError::ParseError(format!("Failed to read worksheet: {}", e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let parsed = rows
        .map(|row| {
            SheetRow::new(
                headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|cell| cell.to_string()))
                    .collect(),
            )
        })
        .filter(|row| !row.is_blank())
        .collect();
    Ok(parsed)
}

fn read_csv_rows(path: &Path) -> Result<Vec<SheetRow>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)
        .map_err(|e| AppError::ParseError(format!("Failed to open CSV file: {}", e)))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
        })?;
        let row = SheetRow::new(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect(),
        );
        if row.is_blank() {
            debug!(row = index + 1, "Skipping blank CSV row");
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// One row per (test case, step). Returns the number of data rows written.
pub fn write_test_plan(path: &Path, project: &ValidationProject) -> Result<usize> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|e| AppError::ExportError(format!("Failed to create spreadsheet: {}", e)))?;

    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| AppError::ExportError(format!("Failed to write header row: {}", e)))?;

    let mut written = 0;
    for case in &project.test_cases {
        let status = case.status.to_string();
        for step in &case.steps {
            let step_number = step.step_number.to_string();
            writer
                .write_record([
                    case.id.as_str(),
                    case.requirement_id.as_str(),
                    case.title.as_str(),
                    step_number.as_str(),
                    step.action.as_str(),
                    step.expected_result.as_str(),
                    status.as_str(),
                ])
                .map_err(|e| AppError::ExportError(format!("Failed to write row: {}", e)))?;
            written += 1;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::ExportError(format!("Failed to flush spreadsheet: {}", e)))?;
    Ok(written)
}
