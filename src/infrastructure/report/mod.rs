//! Validation report documents.
//!
//! The primary renderer writes a `.docx` with a summary page followed by one
//! page per test case. When that fails the same content is written as a
//! plain-text printable report next to it.

use crate::domain::error::{AppError, Result};
use crate::domain::project::ValidationProject;
use crate::domain::report::ReportSummary;
use crate::domain::test_case::{Evidence, TestCase};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use docx_rs::{BreakType, Docx, Paragraph, Pic, Run, Table, TableCell, TableRow};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const TITLE_SIZE: usize = 36;
const HEADING_SIZE: usize = 28;
const EMU_PER_PIXEL: u32 = 9525;
const EVIDENCE_DISPLAY_WIDTH_PX: u32 = 480;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Docx,
    PrintableText,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportExport {
    pub path: PathBuf,
    pub format: ReportFormat,
}

pub fn export_report(dir: &Path, file_stem: &str, project: &ValidationProject) -> Result<ReportExport> {
    let summary = ReportSummary::from_project(project);
    let docx_path = dir.join(format!("{}_report.docx", file_stem));

    match write_docx(&docx_path, project, &summary) {
        Ok(()) => {
            info!(path = %docx_path.display(), "Report document written");
            Ok(ReportExport {
                path: docx_path,
                format: ReportFormat::Docx,
            })
        }
        Err(e) => {
            warn!(error = %e, "Document renderer failed, writing printable report instead");
            if docx_path.is_file() {
                if let Err(remove_err) = fs::remove_file(&docx_path) {
                    warn!(
                        path = %docx_path.display(),
                        error = %remove_err,
                        "Failed to remove partial report document"
                    );
                }
            }
            let text_path = dir.join(format!("{}_report.txt", file_stem));
            fs::write(&text_path, render_printable(project, &summary)).map_err(|e| {
                AppError::ExportError(format!("Failed to write printable report: {}", e))
            })?;
            info!(path = %text_path.display(), "Printable report written");
            Ok(ReportExport {
                path: text_path,
                format: ReportFormat::PrintableText,
            })
        }
    }
}

fn write_docx(path: &Path, project: &ValidationProject, summary: &ReportSummary) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| AppError::ExportError(format!("Failed to create report file: {}", e)))?;
    build_docx(project, summary)
        .build()
        .pack(file)
        .map_err(|e| AppError::ExportError(format!("Failed to pack report document: {}", e)))
}

fn build_docx(project: &ValidationProject, summary: &ReportSummary) -> Docx {
    let mut docx = Docx::new()
        .add_paragraph(heading(&format!("Validation Report: {}", project.name), TITLE_SIZE))
        .add_paragraph(plain(&format!("Platform version: {}", project.platform_version)))
        .add_paragraph(plain(&format!("Generated: {}", generated_at())))
        .add_table(key_value_table(&[
            ("Status", summary.status.to_string()),
            ("Total test cases", summary.total.to_string()),
            ("Passed", summary.passed.to_string()),
            ("Failed", summary.failed.to_string()),
            ("Pending", summary.pending.to_string()),
            ("Pass rate", format!("{}%", summary.pass_rate)),
        ]));

    if !summary.uncovered_requirements.is_empty() {
        docx = docx.add_paragraph(plain(&format!(
            "Requirements without test cases: {}",
            summary.uncovered_requirements.join(", ")
        )));
    }

    if let Some(env) = project.env_config.as_deref().filter(|env| !env.trim().is_empty()) {
        docx = docx
            .add_paragraph(heading("Environment", HEADING_SIZE))
            .add_paragraph(plain(env));
    }

    for case in &project.test_cases {
        docx = docx
            .add_paragraph(page_break())
            .add_paragraph(heading(&format!("{}: {}", case.id, case.title), HEADING_SIZE))
            .add_paragraph(plain(&format!(
                "Requirement: {}    Status: {}",
                case.requirement_id, case.status
            )));

        if let Some(reason) = &case.failure_reason {
            let step = case
                .failed_step_number
                .map(|n| format!(" (step {})", n))
                .unwrap_or_default();
            docx = docx.add_paragraph(plain(&format!("Failure{}: {}", step, reason)));
        }

        docx = docx.add_table(steps_table(case));

        if let Some(picture) = case.evidence.as_ref().and_then(evidence_picture) {
            docx = docx
                .add_paragraph(plain("Evidence"))
                .add_paragraph(Paragraph::new().add_run(Run::new().add_image(picture)));
        }
    }

    docx
}

fn heading(text: &str, size: usize) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).bold().size(size))
}

fn plain(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}

fn cell(text: &str) -> TableCell {
    TableCell::new().add_paragraph(plain(text))
}

fn header_cell(text: &str) -> TableCell {
    TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text).bold()))
}

fn key_value_table(rows: &[(&str, String)]) -> Table {
    Table::new(
        rows.iter()
            .map(|(key, value)| TableRow::new(vec![header_cell(key), cell(value)]))
            .collect(),
    )
}

fn steps_table(case: &TestCase) -> Table {
    let mut rows = vec![TableRow::new(vec![
        header_cell("#"),
        header_cell("Action"),
        header_cell("Expected Result"),
    ])];
    rows.extend(case.steps.iter().map(|step| {
        TableRow::new(vec![
            cell(&step.step_number.to_string()),
            cell(&step.action),
            cell(&step.expected_result),
        ])
    }));
    Table::new(rows)
}

fn evidence_picture(evidence: &Evidence) -> Option<Pic> {
    let bytes = STANDARD.decode(&evidence.data).ok()?;
    if evidence.width == 0 {
        return None;
    }
    let display_height = EVIDENCE_DISPLAY_WIDTH_PX * evidence.height / evidence.width;
    Some(
        Pic::new_with_dimensions(bytes, evidence.width, evidence.height).size(
            EVIDENCE_DISPLAY_WIDTH_PX * EMU_PER_PIXEL,
            display_height * EMU_PER_PIXEL,
        ),
    )
}

fn generated_at() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Plain-text rendering with form feeds between pages.
pub fn render_printable(project: &ValidationProject, summary: &ReportSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "VALIDATION REPORT: {}", project.name);
    let _ = writeln!(out, "Platform version: {}", project.platform_version);
    let _ = writeln!(out, "Generated: {}", generated_at());
    let _ = writeln!(out);
    let _ = writeln!(out, "Status:           {}", summary.status);
    let _ = writeln!(out, "Total test cases: {}", summary.total);
    let _ = writeln!(out, "Passed:           {}", summary.passed);
    let _ = writeln!(out, "Failed:           {}", summary.failed);
    let _ = writeln!(out, "Pending:          {}", summary.pending);
    let _ = writeln!(out, "Pass rate:        {}%", summary.pass_rate);
    if !summary.uncovered_requirements.is_empty() {
        let _ = writeln!(
            out,
            "Requirements without test cases: {}",
            summary.uncovered_requirements.join(", ")
        );
    }
    if let Some(env) = project.env_config.as_deref().filter(|env| !env.trim().is_empty()) {
        let _ = writeln!(out, "\nEnvironment:\n{}", env);
    }

    for case in &project.test_cases {
        let _ = writeln!(out, "\x0c");
        let _ = writeln!(out, "{}: {}", case.id, case.title);
        let _ = writeln!(out, "Requirement: {}    Status: {}", case.requirement_id, case.status);
        if let Some(reason) = &case.failure_reason {
            match case.failed_step_number {
                Some(step) => {
                    let _ = writeln!(out, "Failure (step {}): {}", step, reason);
                }
                None => {
                    let _ = writeln!(out, "Failure: {}", reason);
                }
            }
        }
        for step in &case.steps {
            let _ = writeln!(
                out,
                "  {}. {}\n     Expected: {}",
                step.step_number, step.action, step.expected_result
            );
        }
        if case.evidence.is_some() {
            let _ = writeln!(out, "  [evidence attached]");
        }
    }

    out
}
