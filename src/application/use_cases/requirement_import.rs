use crate::domain::error::{AppError, Result};
use crate::domain::requirement::{Priority, Requirement, RequirementCategory};
use crate::infrastructure::spreadsheet::{read_rows, SheetRow};
use std::path::Path;
use tracing::{info, warn};

const DESCRIPTION_HEADERS: [&str; 3] = ["Description", "Requirement", "desc"];
const CATEGORY_HEADERS: [&str; 2] = ["Type", "Category"];
const PRIORITY_HEADER: &str = "Priority";
const FALLBACK_PROJECT_NAME: &str = "Imported Project";

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRequirements {
    pub project_name: String,
    pub requirements: Vec<Requirement>,
}

pub fn import_requirements(path: &Path) -> Result<ImportedRequirements> {
    let rows = read_rows(path)?;
    let requirements = requirements_from_rows(&rows);
    if requirements.is_empty() {
        warn!(path = %path.display(), rows = rows.len(), "No requirements found in spreadsheet");
        return Err(AppError::ParseError(
            "The spreadsheet contains no requirement descriptions".to_string(),
        ));
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let project_name = project_name_from_filename(file_name);
    info!(count = requirements.len(), name = %project_name, "Requirements imported");
    Ok(ImportedRequirements {
        project_name,
        requirements,
    })
}

fn first_of<'a>(row: &'a SheetRow, headers: &[&str]) -> Option<&'a str> {
    headers.iter().find_map(|header| row.get(header))
}

/// First non-blank aliased description cell, else the first column's value.
fn description_of(row: &SheetRow) -> Option<&str> {
    first_of(row, &DESCRIPTION_HEADERS).or_else(|| row.first_value())
}

/// Rows without a usable description are skipped; ids follow the kept rows.
pub fn requirements_from_rows(rows: &[SheetRow]) -> Vec<Requirement> {
    rows.iter()
        .filter_map(|row| {
            let description = description_of(row)?.trim();
            if description.is_empty() {
                return None;
            }
            let category = first_of(row, &CATEGORY_HEADERS)
                .map(RequirementCategory::from_label)
                .unwrap_or(RequirementCategory::Functional);
            let priority = row
                .get(PRIORITY_HEADER)
                .map(Priority::from_label)
                .unwrap_or(Priority::Medium);
            Some((category, description.to_string(), priority))
        })
        .enumerate()
        .map(|(index, (category, description, priority))| {
            Requirement::new(index, category, description, priority)
        })
        .collect()
}

/// `checkout_flow-v2.xlsx` becomes `Checkout flow v2`.
pub fn project_name_from_filename(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or_default();
    let spaced = stem.replace(['_', '-'], " ");
    let trimmed = spaced.trim();

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => FALLBACK_PROJECT_NAME.to_string(),
    }
}
