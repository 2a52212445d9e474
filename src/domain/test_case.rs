use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub step_number: u32,
    pub action: String,
    pub expected_result: String,
}

impl TestStep {
    pub fn new(step_number: u32, action: impl Into<String>, expected_result: impl Into<String>) -> Self {
        Self {
            step_number,
            action: action.into(),
            expected_result: expected_result.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestCaseStatus {
    Pending,
    Running,
    Passed,
    Failed,
}

impl fmt::Display for TestCaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCaseStatus::Pending => write!(f, "Pending"),
            TestCaseStatus::Running => write!(f, "Running"),
            TestCaseStatus::Passed => write!(f, "Passed"),
            TestCaseStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    SyntheticPlaceholder,
    RealCapture,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub media_type: String,
    /// Base64 encoded image bytes.
    pub data: String,
    pub width: u32,
    pub height: u32,
    pub captured_at: i64,
}

impl Evidence {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub requirement_id: String,
    pub title: String,
    pub steps: Vec<TestStep>,
    pub status: TestCaseStatus,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub evidence: Option<Evidence>,
    #[serde(default)]
    pub failed_step_number: Option<u32>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl TestCase {
    pub fn new(
        id: impl Into<String>,
        requirement_id: impl Into<String>,
        title: impl Into<String>,
        steps: Vec<TestStep>,
    ) -> Self {
        Self {
            id: id.into(),
            requirement_id: requirement_id.into(),
            title: title.into(),
            steps: renumber_steps(steps),
            status: TestCaseStatus::Pending,
            logs: Vec::new(),
            evidence: None,
            failed_step_number: None,
            failure_reason: None,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == TestCaseStatus::Passed
    }

    pub fn is_failed(&self) -> bool {
        self.status == TestCaseStatus::Failed
    }

    /// Wholesale replacement from a manual edit.
    pub fn replace(&mut self, title: impl Into<String>, steps: Vec<TestStep>) {
        self.title = title.into();
        self.steps = renumber_steps(steps);
    }

    pub fn add_step(&mut self, action: impl Into<String>, expected_result: impl Into<String>) {
        let next = self.steps.len() as u32 + 1;
        self.steps.push(TestStep::new(next, action, expected_result));
        self.steps = renumber_steps(std::mem::take(&mut self.steps));
    }

    /// Returns false when no step carries `step_number`.
    pub fn remove_step(&mut self, step_number: u32) -> bool {
        let before = self.steps.len();
        let kept: Vec<TestStep> = std::mem::take(&mut self.steps)
            .into_iter()
            .filter(|step| step.step_number != step_number)
            .collect();
        let removed = kept.len() != before;
        self.steps = renumber_steps(kept);
        removed
    }

    /// Queues the case for another execution pass.
    pub fn reset_for_rerun(&mut self) {
        self.status = TestCaseStatus::Pending;
        self.logs.clear();
        self.evidence = None;
        self.failed_step_number = None;
        self.failure_reason = None;
    }
}

/// Keeps step order and rewrites numbers to 1..=n.
pub fn renumber_steps(steps: Vec<TestStep>) -> Vec<TestStep> {
    steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| TestStep {
            step_number: index as u32 + 1,
            ..step
        })
        .collect()
}

/// Zero-based index to `TC-001` style identifiers.
pub fn test_case_id(index: usize) -> String {
    format!("TC-{:03}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(case: &TestCase) -> Vec<u32> {
        case.steps.iter().map(|step| step.step_number).collect()
    }

    fn sample_case() -> TestCase {
        TestCase::new(
            "TC-001",
            "REQ-001",
            "Login",
            vec![
                TestStep::new(4, "Open login page", "Form visible"),
                TestStep::new(9, "Enter credentials", "Fields filled"),
                TestStep::new(2, "Submit", "Dashboard shown"),
            ],
        )
    }

    #[test]
    fn test_new_case_renumbers_steps() {
        let case = sample_case();
        assert_eq!(numbers(&case), vec![1, 2, 3]);
        assert_eq!(case.steps[2].action, "Submit");
        assert_eq!(case.status, TestCaseStatus::Pending);
    }

    #[test]
    fn test_add_step_appends_contiguously() {
        let mut case = sample_case();
        case.add_step("Log out", "Login page shown");
        assert_eq!(numbers(&case), vec![1, 2, 3, 4]);
        assert_eq!(case.steps[3].action, "Log out");
    }

    #[test]
    fn test_remove_step_renumbers_remaining() {
        let mut case = sample_case();
        assert!(case.remove_step(2));
        assert_eq!(numbers(&case), vec![1, 2]);
        assert_eq!(case.steps[1].action, "Submit");

        assert!(!case.remove_step(7));
        assert_eq!(numbers(&case), vec![1, 2]);
    }

    #[test]
    fn test_remove_then_add_stays_contiguous() {
        let mut case = sample_case();
        case.remove_step(1);
        case.remove_step(1);
        case.add_step("Refresh", "Still logged in");
        case.add_step("Close", "Closed");
        assert_eq!(numbers(&case), vec![1, 2, 3]);
    }

    #[test]
    fn test_reset_for_rerun_clears_failure_fields() {
        let mut case = sample_case();
        case.status = TestCaseStatus::Failed;
        case.logs = vec!["Step 1".to_string()];
        case.failed_step_number = Some(2);
        case.failure_reason = Some("Timeout".to_string());
        case.evidence = Some(Evidence {
            kind: EvidenceKind::SyntheticPlaceholder,
            media_type: "image/png".to_string(),
            data: "AAAA".to_string(),
            width: 1,
            height: 1,
            captured_at: 0,
        });

        case.reset_for_rerun();

        assert_eq!(case.status, TestCaseStatus::Pending);
        assert!(case.logs.is_empty());
        assert!(case.evidence.is_none());
        assert!(case.failed_step_number.is_none());
        assert!(case.failure_reason.is_none());
    }

    #[test]
    fn test_evidence_data_url() {
        let evidence = Evidence {
            kind: EvidenceKind::SyntheticPlaceholder,
            media_type: "image/png".to_string(),
            data: "iVBO".to_string(),
            width: 2,
            height: 2,
            captured_at: 0,
        };
        assert_eq!(evidence.data_url(), "data:image/png;base64,iVBO");
    }
}
