use crate::domain::project::{ProjectStatus, ValidationProject};
use crate::domain::test_case::TestCaseStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub project_id: String,
    pub project_name: String,
    pub platform_version: String,
    pub status: ProjectStatus,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    /// Whole percent of passed cases, 0 for an empty plan.
    pub pass_rate: u32,
    pub uncovered_requirements: Vec<String>,
}

impl ReportSummary {
    pub fn from_project(project: &ValidationProject) -> Self {
        let total = project.test_cases.len();
        let passed = project.count_with_status(TestCaseStatus::Passed);
        let failed = project.count_with_status(TestCaseStatus::Failed);
        let pass_rate = if total == 0 {
            0
        } else {
            ((passed as f64 / total as f64) * 100.0).round() as u32
        };

        Self {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            platform_version: project.platform_version.clone(),
            status: project.status,
            total,
            passed,
            failed,
            pending: total - passed - failed,
            pass_rate,
            uncovered_requirements: project.uncovered_requirements(),
        }
    }
}
