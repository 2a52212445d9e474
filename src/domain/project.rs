use crate::domain::chat::ChatMessage;
use crate::domain::requirement::Requirement;
use crate::domain::test_case::{TestCase, TestCaseStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectStatus {
    Draft,
    #[serde(rename = "In Progress")]
    InProgress,
    Validated,
    #[serde(rename = "Partly Validated")]
    PartlyValidated,
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "Draft",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Validated => "Validated",
            ProjectStatus::PartlyValidated => "Partly Validated",
            ProjectStatus::Failed => "Failed",
        }
    }

    /// Statuses only reachable through a completed execution pass.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Validated | ProjectStatus::PartlyValidated | ProjectStatus::Failed
        )
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationProject {
    pub id: String,
    pub name: String,
    pub platform_version: String,
    pub status: ProjectStatus,
    pub created_at: i64,
    pub requirements: Vec<Requirement>,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub env_config: Option<String>,
}

impl ValidationProject {
    pub fn new_draft(
        name: impl Into<String>,
        platform_version: impl Into<String>,
        requirements: Vec<Requirement>,
        test_cases: Vec<TestCase>,
        chat_history: Vec<ChatMessage>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            platform_version: platform_version.into(),
            status: ProjectStatus::Draft,
            created_at: chrono::Utc::now().timestamp_millis(),
            requirements,
            test_cases,
            chat_history,
            env_config: None,
        }
    }

    pub fn test_case(&self, test_case_id: &str) -> Option<&TestCase> {
        self.test_cases.iter().find(|case| case.id == test_case_id)
    }

    pub fn test_case_mut(&mut self, test_case_id: &str) -> Option<&mut TestCase> {
        self.test_cases.iter_mut().find(|case| case.id == test_case_id)
    }

    /// Requirement ids that no test case claims.
    pub fn uncovered_requirements(&self) -> Vec<String> {
        self.requirements
            .iter()
            .filter(|requirement| {
                !self
                    .test_cases
                    .iter()
                    .any(|case| case.requirement_id == requirement.id)
            })
            .map(|requirement| requirement.id.clone())
            .collect()
    }

    pub fn count_with_status(&self, status: TestCaseStatus) -> usize {
        self.test_cases
            .iter()
            .filter(|case| case.status == status)
            .count()
    }
}

/// Project verdict after an execution pass.
///
/// No failures is `Validated`; failures up to half of all cases is
/// `PartlyValidated`; more than half is `Failed`.
pub fn aggregate_status(test_cases: &[TestCase]) -> ProjectStatus {
    let total = test_cases.len();
    let failed = test_cases.iter().filter(|case| case.is_failed()).count();

    if failed == 0 {
        ProjectStatus::Validated
    } else if failed * 2 <= total {
        ProjectStatus::PartlyValidated
    } else {
        ProjectStatus::Failed
    }
}
