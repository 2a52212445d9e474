//! Simulated test execution.
//!
//! Nothing is actually driven: each case gets one pass/fail draw up front,
//! the steps are walked with a fixed delay, and a failing case stops at a
//! randomly chosen step with a canned reason.

use crate::domain::error::Result;
use crate::domain::project::{aggregate_status, ProjectStatus};
use crate::domain::test_case::{TestCase, TestCaseStatus};
use crate::infrastructure::config::SimulatorSettings;
use crate::infrastructure::evidence::render_placeholder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info};

pub const FAILURE_REASONS: [&str; 5] = [
    "Element not found: the target selector did not match any element",
    "Timeout: the page did not respond within 30 seconds",
    "Assertion failed: displayed value did not match the expected result",
    "Unexpected error dialog appeared",
    "Network request failed with status 500",
];

/// How one test case will turn out, decided before any step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseVerdict {
    pub passed: bool,
    /// Zero-based; only meaningful when `passed` is false.
    pub failed_step_index: usize,
    pub reason_index: usize,
    pub capture_evidence: bool,
}

impl CaseVerdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            failed_step_index: 0,
            reason_index: 0,
            capture_evidence: false,
        }
    }

    pub fn fail_at(step_index: usize) -> Self {
        Self {
            passed: false,
            failed_step_index: step_index,
            reason_index: 0,
            capture_evidence: true,
        }
    }
}

pub trait OutcomeSource: Send {
    fn verdict(&mut self, step_count: usize) -> CaseVerdict;
}

pub struct RandomOutcomes {
    rng: StdRng,
    pass_probability: f64,
    pass_evidence_probability: f64,
}

impl RandomOutcomes {
    pub fn new(pass_probability: f64, pass_evidence_probability: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            pass_probability,
            pass_evidence_probability,
        }
    }

    pub fn from_settings(settings: &SimulatorSettings) -> Self {
        Self::new(
            settings.pass_probability,
            settings.pass_evidence_probability,
            settings.seed,
        )
    }
}

impl OutcomeSource for RandomOutcomes {
    fn verdict(&mut self, step_count: usize) -> CaseVerdict {
        let passed = self.rng.gen::<f64>() < self.pass_probability;
        let failed_step_index = if step_count > 0 {
            self.rng.gen_range(0..step_count)
        } else {
            0
        };
        let reason_index = self.rng.gen_range(0..FAILURE_REASONS.len());
        let capture_evidence = !passed || self.rng.gen::<f64>() < self.pass_evidence_probability;
        CaseVerdict {
            passed,
            failed_step_index,
            reason_index,
            capture_evidence,
        }
    }
}

/// Replays queued verdicts; passes once the queue runs dry.
#[derive(Debug, Default)]
pub struct ScriptedOutcomes {
    verdicts: VecDeque<CaseVerdict>,
    served: usize,
}

impl ScriptedOutcomes {
    pub fn new(verdicts: impl IntoIterator<Item = CaseVerdict>) -> Self {
        Self {
            verdicts: verdicts.into_iter().collect(),
            served: 0,
        }
    }

    /// `true` passes, `false` fails at the first step.
    pub fn from_passes(passes: impl IntoIterator<Item = bool>) -> Self {
        Self::new(passes.into_iter().map(|passed| {
            if passed {
                CaseVerdict::pass()
            } else {
                CaseVerdict::fail_at(0)
            }
        }))
    }

    pub fn served(&self) -> usize {
        self.served
    }
}

impl OutcomeSource for ScriptedOutcomes {
    fn verdict(&mut self, _step_count: usize) -> CaseVerdict {
        self.served += 1;
        self.verdicts.pop_front().unwrap_or_else(CaseVerdict::pass)
    }
}

pub struct ExecutionSimulator {
    step_delay: Duration,
    outcomes: Box<dyn OutcomeSource>,
}

impl ExecutionSimulator {
    pub fn new(step_delay: Duration, outcomes: Box<dyn OutcomeSource>) -> Self {
        Self {
            step_delay,
            outcomes,
        }
    }

    pub fn from_settings(settings: &SimulatorSettings) -> Self {
        Self::new(
            settings.step_delay(),
            Box::new(RandomOutcomes::from_settings(settings)),
        )
    }

    /// Indices of the cases a pass will run: everything not already passed.
    pub fn runnable_indices(test_cases: &[TestCase]) -> Vec<usize> {
        test_cases
            .iter()
            .enumerate()
            .filter(|(_, case)| !case.is_passed())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn start_case(test_case: &mut TestCase) {
        test_case.status = TestCaseStatus::Running;
        test_case.logs = vec![format!(
            "Starting test case {}: {}",
            test_case.id, test_case.title
        )];
        test_case.evidence = None;
        test_case.failed_step_number = None;
        test_case.failure_reason = None;
    }

    /// Runs one case to a final status. The case must already be started.
    pub async fn execute_case(&mut self, test_case: &mut TestCase) -> Result<()> {
        let verdict = self.outcomes.verdict(test_case.steps.len());
        let failure_index = if verdict.passed || test_case.steps.is_empty() {
            None
        } else {
            Some(verdict.failed_step_index.min(test_case.steps.len() - 1))
        };

        let mut logs = std::mem::take(&mut test_case.logs);
        let mut failed_step_number = None;
        for (index, step) in test_case.steps.iter().enumerate() {
            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            logs.push(format!("Step {}: {}", step.step_number, step.action));
            if failure_index == Some(index) {
                failed_step_number = Some(step.step_number);
                break;
            }
            logs.push(format!("  Verified: {}", step.expected_result));
        }

        if verdict.passed {
            test_case.status = TestCaseStatus::Passed;
            logs.push("Result: PASSED".to_string());
        } else {
            let reason = FAILURE_REASONS[verdict.reason_index % FAILURE_REASONS.len()];
            test_case.status = TestCaseStatus::Failed;
            test_case.failed_step_number = failed_step_number;
            test_case.failure_reason = Some(reason.to_string());
            logs.push(format!("Error: {}", reason));
            logs.push("Result: FAILED".to_string());
        }
        test_case.logs = logs;

        if !verdict.passed || verdict.capture_evidence {
            test_case.evidence = Some(render_placeholder(test_case, verdict.passed)?);
        }

        debug!(
            test_case = %test_case.id,
            status = %test_case.status,
            failed_step = ?test_case.failed_step_number,
            "Test case executed"
        );
        Ok(())
    }

    /// Runs every runnable case in order and returns the aggregate status.
    pub async fn run_all(&mut self, test_cases: &mut [TestCase]) -> Result<ProjectStatus> {
        for index in Self::runnable_indices(test_cases) {
            let case = &mut test_cases[index];
            Self::start_case(case);
            self.execute_case(case).await?;
        }
        let status = aggregate_status(test_cases);
        info!(cases = test_cases.len(), status = %status, "Execution pass finished");
        Ok(status)
    }
}
