use crate::domain::requirement::Requirement;
use crate::domain::test_case::{renumber_steps, TestStep};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExtractionOutput {
    #[serde(default)]
    pub(crate) requirements: Vec<RequirementInput>,
    #[serde(default)]
    pub(crate) suggested_project_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequirementInput {
    #[serde(rename = "type", default)]
    pub(crate) category: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) priority: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StepInput {
    #[serde(default)]
    pub(crate) action: String,
    #[serde(default)]
    pub(crate) expected_result: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TestCaseInput {
    #[serde(default)]
    pub(crate) requirement_id: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) steps: Vec<StepInput>,
}

/// Models occasionally wrap the array in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TestCasesOutput {
    List(Vec<TestCaseInput>),
    Wrapped {
        #[serde(rename = "testCases")]
        test_cases: Vec<TestCaseInput>,
    },
}

impl TestCasesOutput {
    pub(crate) fn into_cases(self) -> Vec<TestCaseInput> {
        match self {
            TestCasesOutput::List(cases) => cases,
            TestCasesOutput::Wrapped { test_cases } => test_cases,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FixOutput {
    #[serde(default)]
    pub(crate) steps: Vec<StepInput>,
    #[serde(default)]
    pub(crate) explanation: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefineOutput {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) steps: Vec<StepInput>,
}

/// Steps in model order, blank actions dropped, numbered from 1.
pub(crate) fn into_steps(inputs: Vec<StepInput>) -> Vec<TestStep> {
    renumber_steps(
        inputs
            .into_iter()
            .filter(|step| !step.action.trim().is_empty())
            .map(|step| TestStep::new(0, step.action.trim(), step.expected_result.trim()))
            .collect(),
    )
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRequirements {
    pub requirements: Vec<Requirement>,
    pub suggested_name: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TestCaseFix {
    pub steps: Vec<TestStep>,
    pub explanation: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TestCaseRefinement {
    pub title: String,
    pub steps: Vec<TestStep>,
}
