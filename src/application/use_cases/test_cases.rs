//! Edits to the test cases of the active project.
//!
//! Saving any manual edit on a failed case queues it for another run, the
//! same as an AI fix does.

use crate::application::use_cases::model_gateway::{TestCaseFix, TestCaseRefinement};
use crate::domain::error::{AppError, Result};
use crate::domain::project::ValidationProject;
use crate::domain::test_case::{TestCase, TestStep};
use tracing::info;

fn find_case<'a>(project: &'a mut ValidationProject, test_case_id: &str) -> Result<&'a mut TestCase> {
    project
        .test_case_mut(test_case_id)
        .ok_or_else(|| AppError::NotFound(format!("Test case {} not found", test_case_id)))
}

fn requeue_if_failed(test_case: &mut TestCase) {
    if test_case.is_failed() {
        test_case.reset_for_rerun();
        info!(test_case = %test_case.id, "Failed test case edited, queued for re-run");
    }
}

pub fn edit_test_case(
    project: &mut ValidationProject,
    test_case_id: &str,
    title: &str,
    steps: Vec<TestStep>,
) -> Result<TestCase> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::ValidationError(
            "Test case title must not be empty".to_string(),
        ));
    }
    let case = find_case(project, test_case_id)?;
    case.replace(title, steps);
    requeue_if_failed(case);
    Ok(case.clone())
}

pub fn add_step(
    project: &mut ValidationProject,
    test_case_id: &str,
    action: &str,
    expected_result: &str,
) -> Result<TestCase> {
    if action.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Step action must not be empty".to_string(),
        ));
    }
    let case = find_case(project, test_case_id)?;
    case.add_step(action.trim(), expected_result.trim());
    requeue_if_failed(case);
    Ok(case.clone())
}

pub fn remove_step(project: &mut ValidationProject, test_case_id: &str, step_number: u32) -> Result<TestCase> {
    let case = find_case(project, test_case_id)?;
    if !case.remove_step(step_number) {
        return Err(AppError::NotFound(format!(
            "Step {} not found in {}",
            step_number, test_case_id
        )));
    }
    requeue_if_failed(case);
    Ok(case.clone())
}

/// Title and steps only; status and logs stay as they are.
pub fn apply_refinement(
    project: &mut ValidationProject,
    test_case_id: &str,
    refinement: TestCaseRefinement,
) -> Result<TestCase> {
    let case = find_case(project, test_case_id)?;
    case.replace(refinement.title, refinement.steps);
    Ok(case.clone())
}

pub fn apply_fix(project: &mut ValidationProject, test_case_id: &str, fix: TestCaseFix) -> Result<TestCase> {
    let case = find_case(project, test_case_id)?;
    let title = case.title.clone();
    case.replace(title, fix.steps);
    case.reset_for_rerun();
    info!(test_case = %case.id, explanation = %fix.explanation, "AI fix applied");
    Ok(case.clone())
}
