//! The application's state machine.
//!
//! Owns the current view, the active project and the requirements chat.
//! Every accepted change to the active project is written to the store
//! before it becomes visible; a failed action leaves view and project as
//! they were.

use crate::application::use_cases::conversation::ConversationSession;
use crate::application::use_cases::model_gateway::ModelGateway;
use crate::application::use_cases::requirement_import;
use crate::application::use_cases::simulator::ExecutionSimulator;
use crate::application::use_cases::test_cases;
use crate::domain::automation::AutomationFramework;
use crate::domain::chat::ChatMessage;
use crate::domain::error::{AppError, Result};
use crate::domain::project::{aggregate_status, ProjectStatus, ValidationProject};
use crate::domain::report::ReportSummary;
use crate::domain::requirement::Requirement;
use crate::domain::test_case::{TestCase, TestCaseStatus, TestStep};
use crate::domain::view::View;
use crate::infrastructure::db::ProjectStore;
use crate::infrastructure::report::{export_report, ReportExport};
use crate::infrastructure::spreadsheet::write_test_plan;
use crate::infrastructure::storage::{ensure_project_exports_dir, export_file_stem};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

const RECENT_PROJECTS: usize = 5;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ControllerState {
    pub view: View,
    pub project: Option<ValidationProject>,
    pub chat: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    pub id: String,
    pub name: String,
    pub platform_version: String,
    pub status: ProjectStatus,
    pub created_at: i64,
    pub test_cases: usize,
    pub passed: usize,
    pub failed: usize,
}

impl From<&ValidationProject> for ProjectOverview {
    fn from(project: &ValidationProject) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            platform_version: project.platform_version.clone(),
            status: project.status,
            created_at: project.created_at,
            test_cases: project.test_cases.len(),
            passed: project.count_with_status(TestCaseStatus::Passed),
            failed: project.count_with_status(TestCaseStatus::Failed),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_projects: usize,
    pub draft: usize,
    pub in_progress: usize,
    pub validated: usize,
    pub partly_validated: usize,
    pub failed: usize,
    pub recent: Vec<ProjectOverview>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodeExport {
    pub path: PathBuf,
    pub framework: AutomationFramework,
    pub code: String,
}

pub struct ViewController {
    view: View,
    active_project: Option<ValidationProject>,
    session: Option<ConversationSession>,
    gateway: Arc<ModelGateway>,
    store: Arc<dyn ProjectStore>,
    simulator: ExecutionSimulator,
    platform_version: String,
    exports_dir: PathBuf,
}

impl ViewController {
    pub fn new(
        gateway: Arc<ModelGateway>,
        store: Arc<dyn ProjectStore>,
        simulator: ExecutionSimulator,
        platform_version: impl Into<String>,
        exports_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            view: View::Dashboard,
            active_project: None,
            session: None,
            gateway,
            store,
            simulator,
            platform_version: platform_version.into(),
            exports_dir: exports_dir.into(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn active_project(&self) -> Option<&ValidationProject> {
        self.active_project.as_ref()
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    pub fn state(&self) -> ControllerState {
        ControllerState {
            view: self.view,
            project: self.active_project.clone(),
            chat: self
                .session
                .as_ref()
                .map(|session| session.messages().to_vec())
                .unwrap_or_default(),
        }
    }

    fn check_transition(&self, next: View) -> Result<()> {
        if !self.view.can_transition_to(next) {
            return Err(AppError::InvalidTransition(format!(
                "Cannot go from {} to {}",
                self.view, next
            )));
        }
        Ok(())
    }

    fn require_view(&self, allowed: &[View], action: &str) -> Result<()> {
        if allowed.contains(&self.view) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition(format!(
                "Cannot {} while in {}",
                action, self.view
            )))
        }
    }

    fn project(&self) -> Result<&ValidationProject> {
        self.active_project
            .as_ref()
            .ok_or_else(|| AppError::InvalidTransition("No active project".to_string()))
    }

    /// Persists first; only a stored project becomes the active one.
    async fn commit(&mut self, project: ValidationProject) -> Result<()> {
        self.store.save_project(&project).await?;
        self.active_project = Some(project);
        Ok(())
    }

    pub fn go_to_dashboard(&mut self) {
        if self.session.take().is_some() {
            info!("Requirements conversation abandoned");
        }
        self.active_project = None;
        self.view = View::Dashboard;
    }

    pub async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        let projects = self.store.list_projects().await?;
        let count = |status: ProjectStatus| projects.iter().filter(|p| p.status == status).count();
        Ok(DashboardSummary {
            total_projects: projects.len(),
            draft: count(ProjectStatus::Draft),
            in_progress: count(ProjectStatus::InProgress),
            validated: count(ProjectStatus::Validated),
            partly_validated: count(ProjectStatus::PartlyValidated),
            failed: count(ProjectStatus::Failed),
            recent: projects.iter().take(RECENT_PROJECTS).map(ProjectOverview::from).collect(),
        })
    }

    pub async fn open_history(&mut self) -> Result<Vec<ProjectOverview>> {
        self.check_transition(View::History)?;
        let projects = self.store.list_projects().await?;
        self.view = View::History;
        Ok(projects.iter().map(ProjectOverview::from).collect())
    }

    pub fn start_new_project(&mut self) -> Result<Vec<ChatMessage>> {
        self.check_transition(View::GatherRequirements)?;
        let session = ConversationSession::new();
        let messages = session.messages().to_vec();
        self.session = Some(session);
        self.active_project = None;
        self.view = View::GatherRequirements;
        info!("New requirements conversation started");
        Ok(messages)
    }

    pub async fn send_chat_message(&mut self, text: &str) -> Result<ChatMessage> {
        self.require_view(&[View::GatherRequirements], "chat")?;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| AppError::InvalidTransition("No conversation in progress".to_string()))?;
        session.send(&self.gateway, text).await
    }

    /// Extracts requirements from the chat, generates the plan and opens it for review.
    pub async fn finish_gathering(&mut self) -> Result<ValidationProject> {
        self.check_transition(View::ReviewPlan)?;
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| AppError::InvalidTransition("No conversation in progress".to_string()))?;
        if !session.has_user_input() {
            return Err(AppError::ValidationError(
                "Describe the project in the chat before extracting requirements".to_string(),
            ));
        }
        let transcript = session.transcript();
        let chat_history = session.messages().to_vec();

        let extracted = self.gateway.extract_requirements(&transcript).await?;
        if extracted.requirements.is_empty() {
            return Err(AppError::ValidationError(
                "No requirements were found in the conversation".to_string(),
            ));
        }

        let project = self
            .create_project(extracted.suggested_name, extracted.requirements, chat_history)
            .await?;
        self.session = None;
        Ok(project)
    }

    pub async fn import_requirements(&mut self, path: &Path) -> Result<ValidationProject> {
        self.check_transition(View::ReviewPlan)?;
        self.require_view(&[View::GatherRequirements], "import requirements")?;
        let imported = requirement_import::import_requirements(path)?;
        let project = self
            .create_project(imported.project_name, imported.requirements, Vec::new())
            .await?;
        self.session = None;
        Ok(project)
    }

    async fn create_project(
        &mut self,
        name: String,
        requirements: Vec<Requirement>,
        chat_history: Vec<ChatMessage>,
    ) -> Result<ValidationProject> {
        let test_cases = self.gateway.generate_test_cases(&requirements).await?;
        let project = ValidationProject::new_draft(
            name,
            self.platform_version.clone(),
            requirements,
            test_cases,
            chat_history,
        );

        let uncovered = project.uncovered_requirements();
        if !uncovered.is_empty() {
            warn!(requirements = ?uncovered, "Generated plan leaves requirements without test cases");
        }

        self.commit(project.clone()).await?;
        self.view = View::ReviewPlan;
        info!(
            project = %project.id,
            name = %project.name,
            requirements = project.requirements.len(),
            test_cases = project.test_cases.len(),
            "Draft project created"
        );
        Ok(project)
    }

    /// Draft or empty projects reopen for review; finished ones open on their report.
    pub async fn select_history_project(&mut self, project_id: &str) -> Result<ValidationProject> {
        self.require_view(&[View::History], "open a stored project")?;
        let project = self.store.get_project(project_id).await?;
        let target = if project.status.is_terminal() && !project.test_cases.is_empty() {
            View::Report
        } else {
            View::ReviewPlan
        };
        self.check_transition(target)?;
        self.active_project = Some(project.clone());
        self.view = target;
        Ok(project)
    }

    async fn edit_project<F>(&mut self, action: &str, edit: F) -> Result<TestCase>
    where
        F: FnOnce(&mut ValidationProject) -> Result<TestCase>,
    {
        self.require_view(&[View::ReviewPlan, View::Report], action)?;
        let mut project = self.project()?.clone();
        let case = edit(&mut project)?;
        self.commit(project).await?;
        Ok(case)
    }

    fn test_case_snapshot(&self, test_case_id: &str) -> Result<TestCase> {
        self.project()?
            .test_case(test_case_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Test case {} not found", test_case_id)))
    }

    pub async fn edit_test_case(
        &mut self,
        test_case_id: &str,
        title: &str,
        steps: Vec<TestStep>,
    ) -> Result<TestCase> {
        self.edit_project("edit test cases", |project| {
            test_cases::edit_test_case(project, test_case_id, title, steps)
        })
        .await
    }

    pub async fn add_step(&mut self, test_case_id: &str, action: &str, expected_result: &str) -> Result<TestCase> {
        self.edit_project("edit test cases", |project| {
            test_cases::add_step(project, test_case_id, action, expected_result)
        })
        .await
    }

    pub async fn remove_step(&mut self, test_case_id: &str, step_number: u32) -> Result<TestCase> {
        self.edit_project("edit test cases", |project| {
            test_cases::remove_step(project, test_case_id, step_number)
        })
        .await
    }

    pub async fn refine_test_case(&mut self, test_case_id: &str, instruction: &str) -> Result<TestCase> {
        self.require_view(&[View::ReviewPlan, View::Report], "refine test cases")?;
        let case = self.test_case_snapshot(test_case_id)?;
        let refinement = self.gateway.refine_test_case(&case, instruction).await?;
        self.edit_project("refine test cases", |project| {
            test_cases::apply_refinement(project, test_case_id, refinement)
        })
        .await
    }

    pub async fn fix_test_case(&mut self, test_case_id: &str) -> Result<(TestCase, String)> {
        self.require_view(&[View::ReviewPlan, View::Report], "fix test cases")?;
        let case = self.test_case_snapshot(test_case_id)?;
        let fix = self.gateway.analyze_and_fix_test_case(&case).await?;
        let explanation = fix.explanation.clone();
        let fixed = self
            .edit_project("fix test cases", |project| {
                test_cases::apply_fix(project, test_case_id, fix)
            })
            .await?;
        Ok((fixed, explanation))
    }

    pub async fn set_env_config(&mut self, env_config: Option<String>) -> Result<ValidationProject> {
        self.require_view(&[View::ReviewPlan, View::Report], "change the environment")?;
        let mut project = self.project()?.clone();
        project.env_config = env_config.filter(|env| !env.trim().is_empty());
        self.commit(project.clone()).await?;
        Ok(project)
    }

    pub async fn start_execution(&mut self) -> Result<ValidationProject> {
        self.require_view(&[View::ReviewPlan], "start execution")?;
        self.check_transition(View::Execution)?;
        let project = self.project()?.clone();
        self.execute(project).await
    }

    /// Failed cases go back to pending; passed ones are left alone.
    pub async fn retry_execution(&mut self) -> Result<ValidationProject> {
        self.require_view(&[View::Report], "retry execution")?;
        self.check_transition(View::Execution)?;
        let mut project = self.project()?.clone();
        for case in project.test_cases.iter_mut().filter(|case| case.is_failed()) {
            case.reset_for_rerun();
        }
        self.execute(project).await
    }

    async fn execute(&mut self, mut project: ValidationProject) -> Result<ValidationProject> {
        let previous_view = self.view;
        let previous_project = self.active_project.clone();

        match self.run_pass(&mut project).await {
            Ok(()) => {
                self.view = View::Report;
                Ok(project)
            }
            Err(e) => {
                error!(error = %e, project = %project.id, "Execution aborted");
                self.view = previous_view;
                if let Some(previous) = previous_project {
                    if let Err(restore_err) = self.store.save_project(&previous).await {
                        warn!(error = %restore_err, "Failed to restore project after aborted run");
                    }
                    self.active_project = Some(previous);
                }
                Err(e)
            }
        }
    }

    async fn run_pass(&mut self, project: &mut ValidationProject) -> Result<()> {
        project.status = ProjectStatus::InProgress;
        self.commit(project.clone()).await?;
        self.view = View::Execution;

        let runnable = ExecutionSimulator::runnable_indices(&project.test_cases);
        info!(project = %project.id, cases = runnable.len(), "Execution started");
        for index in runnable {
            ExecutionSimulator::start_case(&mut project.test_cases[index]);
            self.commit(project.clone()).await?;
            self.simulator
                .execute_case(&mut project.test_cases[index])
                .await?;
            self.commit(project.clone()).await?;
        }

        project.status = aggregate_status(&project.test_cases);
        self.commit(project.clone()).await?;
        info!(project = %project.id, status = %project.status, "Execution finished");
        Ok(())
    }

    pub fn report_summary(&self) -> Result<ReportSummary> {
        self.require_view(&[View::Report], "view the report")?;
        Ok(ReportSummary::from_project(self.project()?))
    }

    fn export_dir(&self, project: &ValidationProject) -> Result<PathBuf> {
        ensure_project_exports_dir(&self.exports_dir, &project.id).map_err(|e| {
            AppError::ExportError(format!("Failed to create export folder: {}", e))
        })
    }

    pub fn export_spreadsheet(&self) -> Result<PathBuf> {
        let project = self.project()?;
        let path = self
            .export_dir(project)?
            .join(format!("{}_test_cases.csv", export_file_stem(&project.name)));
        let rows = write_test_plan(&path, project)?;
        info!(path = %path.display(), rows, "Spreadsheet exported");
        Ok(path)
    }

    pub fn export_document(&self) -> Result<ReportExport> {
        let project = self.project()?;
        let dir = self.export_dir(project)?;
        export_report(&dir, &export_file_stem(&project.name), project)
    }

    pub async fn export_code(&self, framework: AutomationFramework) -> Result<CodeExport> {
        let project = self.project()?;
        if project.test_cases.is_empty() {
            return Err(AppError::ValidationError(
                "The project has no test cases to export".to_string(),
            ));
        }

        let code = self
            .gateway
            .generate_test_suite_code(&project.test_cases, framework, project.env_config.as_deref())
            .await?;
        let path = self.export_dir(project)?.join(format!(
            "{}_suite.{}",
            export_file_stem(&project.name),
            framework.file_extension()
        ));
        fs::write(&path, &code)
            .map_err(|e| AppError::ExportError(format!("Failed to write test suite: {}", e)))?;
        info!(path = %path.display(), framework = %framework, "Test suite exported");
        Ok(CodeExport {
            path,
            framework,
            code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::retry::RetryPolicy;
    use crate::application::use_cases::simulator::ScriptedOutcomes;
    use crate::application::use_cases::test_support::ScriptedLlm;
    use crate::domain::chat::ChatRole;
    use crate::domain::llm_config::LLMConfig;
    use crate::domain::requirement::{Priority, RequirementCategory};
    use crate::infrastructure::db::ProjectRepository;
    use crate::infrastructure::report::ReportFormat;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    const LOGIN_EXTRACTION: &str = r#"{"requirements":[{"type":"Functional Requirement","description":"Login works","priority":"High"}],"suggestedProjectName":"Login"}"#;
    const LOGIN_CASES: &str = r#"[{"requirementId":"REQ-001","title":"Valid login","steps":[{"stepNumber":1,"action":"Open login","expectedResult":"Form shown"},{"stepNumber":2,"action":"Submit","expectedResult":"Dashboard"}]}]"#;

    struct Harness {
        controller: ViewController,
        llm: Arc<ScriptedLlm>,
        store: Arc<ProjectRepository>,
        exports: TempDir,
    }

    async fn harness(llm: ScriptedLlm, outcomes: ScriptedOutcomes) -> Harness {
        let llm = Arc::new(llm);
        let store = Arc::new(ProjectRepository::in_memory().await.unwrap());
        let exports = tempfile::tempdir().unwrap();
        let gateway = Arc::new(ModelGateway::new(
            llm.clone(),
            LLMConfig::default(),
            RetryPolicy::no_delay(2),
        ));
        let controller = ViewController::new(
            gateway,
            store.clone(),
            ExecutionSimulator::new(Duration::ZERO, Box::new(outcomes)),
            "3.1.0",
            exports.path(),
        );
        Harness {
            controller,
            llm,
            store,
            exports,
        }
    }

    fn cases_reply(count: usize) -> String {
        let cases: Vec<_> = (0..count)
            .map(|index| {
                json!({
                    "requirementId": format!("REQ-{:03}", index + 1),
                    "title": format!("Case {}", index + 1),
                    "steps": [
                        {"stepNumber": 1, "action": "Open", "expectedResult": "Open"},
                        {"stepNumber": 2, "action": "Check", "expectedResult": "Checked"}
                    ]
                })
            })
            .collect();
        serde_json::to_string(&cases).unwrap()
    }

    async fn reviewed_project(harness: &mut Harness, cases: usize) {
        let csv = harness.exports.path().join("release_plan.csv");
        let mut body = String::from("Description,Priority\n");
        for index in 0..cases {
            body.push_str(&format!("Requirement {},High\n", index + 1));
        }
        fs::write(&csv, body).unwrap();
        harness.llm.push(Ok(cases_reply(cases)));

        harness.controller.start_new_project().unwrap();
        harness.controller.import_requirements(&csv).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_scenario_creates_draft_project() {
        let llm = ScriptedLlm::new()
            .reply("Who signs in?")
            .reply("What should happen after login?")
            .reply("Anything else?")
            .reply(LOGIN_EXTRACTION)
            .reply(LOGIN_CASES);
        let mut h = harness(llm, ScriptedOutcomes::default()).await;

        let greeting = h.controller.start_new_project().unwrap();
        assert_eq!(greeting.len(), 1);
        for text in ["We need a login page", "Customers with an email", "Show the dashboard"] {
            h.controller.send_chat_message(text).await.unwrap();
        }

        let project = h.controller.finish_gathering().await.unwrap();
        assert_eq!(h.controller.view(), View::ReviewPlan);
        assert_eq!(project.name, "Login");
        assert_eq!(project.status, ProjectStatus::Draft);
        assert_eq!(project.platform_version, "3.1.0");
        assert_eq!(project.requirements.len(), 1);
        assert_eq!(project.requirements[0].id, "REQ-001");
        assert_eq!(project.requirements[0].category, RequirementCategory::Functional);
        assert_eq!(project.requirements[0].priority, Priority::High);
        assert_eq!(project.chat_history.len(), 7);
        let users = project
            .chat_history
            .iter()
            .filter(|message| message.role == ChatRole::User)
            .count();
        assert_eq!(users, 3);

        let extraction = &h.llm.requests()[3].messages[0].text;
        for message in &project.chat_history[1..] {
            assert!(extraction.contains(&message.text), "missing: {}", message.text);
        }

        let stored = h.store.get_project(&project.id).await.unwrap();
        assert_eq!(stored, project);
        assert!(h.controller.state().chat.is_empty());
    }

    #[tokio::test]
    async fn test_failed_extraction_keeps_conversation() {
        let llm = ScriptedLlm::new().reply("Tell me more").fail("a").fail("b").fail("c");
        let mut h = harness(llm, ScriptedOutcomes::default()).await;
        h.controller.start_new_project().unwrap();
        h.controller.send_chat_message("A shop").await.unwrap();

        let err = h.controller.finish_gathering().await.unwrap_err();
        assert!(matches!(err, AppError::LLMError(_)));
        assert_eq!(h.controller.view(), View::GatherRequirements);
        assert_eq!(h.controller.state().chat.len(), 3);
        assert!(h.store.list_projects().await.unwrap().is_empty());
        assert_eq!(h.llm.call_count(), 4);
    }

    #[tokio::test]
    async fn test_extraction_needs_user_input() {
        let mut h = harness(ScriptedLlm::new(), ScriptedOutcomes::default()).await;
        h.controller.start_new_project().unwrap();
        assert!(matches!(
            h.controller.finish_gathering().await,
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(h.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_transitions_leave_state_untouched() {
        let mut h = harness(ScriptedLlm::new(), ScriptedOutcomes::default()).await;
        assert!(matches!(
            h.controller.start_execution().await,
            Err(AppError::InvalidTransition(_))
        ));
        assert!(matches!(
            h.controller.finish_gathering().await,
            Err(AppError::InvalidTransition(_))
        ));
        assert!(h.controller.report_summary().is_err());
        assert_eq!(h.controller.view(), View::Dashboard);

        h.controller.open_history().await.unwrap();
        assert!(matches!(
            h.controller.start_new_project(),
            Err(AppError::InvalidTransition(_))
        ));
        h.controller.go_to_dashboard();
        assert_eq!(h.controller.view(), View::Dashboard);
    }

    #[tokio::test]
    async fn test_execution_aggregates_and_retry_skips_passed() {
        let outcomes = ScriptedOutcomes::from_passes(
            [false, true, false, true, true, false, true, true, true, true]
                .into_iter()
                .chain([true, true, true]),
        );
        let mut h = harness(ScriptedLlm::new(), outcomes).await;
        reviewed_project(&mut h, 10).await;

        let project = h.controller.start_execution().await.unwrap();
        assert_eq!(h.controller.view(), View::Report);
        assert_eq!(project.status, ProjectStatus::PartlyValidated);
        assert_eq!(project.count_with_status(TestCaseStatus::Failed), 3);

        let stored = h.store.get_project(&project.id).await.unwrap();
        assert_eq!(stored.status, ProjectStatus::PartlyValidated);

        let summary = h.controller.report_summary().unwrap();
        assert_eq!(summary.pass_rate, 70);

        let passed_logs = project.test_cases[1].logs.clone();
        let retried = h.controller.retry_execution().await.unwrap();
        assert_eq!(retried.status, ProjectStatus::Validated);
        assert_eq!(retried.test_cases[1].logs, passed_logs);
        assert_eq!(h.controller.view(), View::Report);
    }

    #[tokio::test]
    async fn test_majority_failures_mark_project_failed() {
        let outcomes = ScriptedOutcomes::from_passes((0..10).map(|index| index >= 6));
        let mut h = harness(ScriptedLlm::new(), outcomes).await;
        reviewed_project(&mut h, 10).await;
        let project = h.controller.start_execution().await.unwrap();
        assert_eq!(project.status, ProjectStatus::Failed);
    }

    #[tokio::test]
    async fn test_fix_requeues_failed_case() {
        let mut h = harness(ScriptedLlm::new(), ScriptedOutcomes::from_passes([false])).await;
        reviewed_project(&mut h, 1).await;
        h.controller.start_execution().await.unwrap();

        h.llm.push(Ok(
            r#"{"steps":[{"stepNumber":1,"action":"Wait for page","expectedResult":"Loaded"}],"explanation":"Page was slow"}"#
                .to_string(),
        ));
        let (case, explanation) = h.controller.fix_test_case("TC-001").await.unwrap();
        assert_eq!(explanation, "Page was slow");
        assert_eq!(case.status, TestCaseStatus::Pending);
        assert!(case.evidence.is_none());

        let stored = h.store.list_projects().await.unwrap();
        assert_eq!(stored[0].test_cases[0].status, TestCaseStatus::Pending);
    }

    #[tokio::test]
    async fn test_manual_edits_are_persisted() {
        let mut h = harness(ScriptedLlm::new(), ScriptedOutcomes::default()).await;
        reviewed_project(&mut h, 2).await;

        h.controller.add_step("TC-002", "Log out", "Signed out").await.unwrap();
        let case = h.controller.remove_step("TC-002", 1).await.unwrap();
        assert_eq!(
            case.steps.iter().map(|s| s.step_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
        h.controller
            .set_env_config(Some("BASE_URL=http://localhost:8080".to_string()))
            .await
            .unwrap();

        let id = h.controller.active_project().unwrap().id.clone();
        let stored = h.store.get_project(&id).await.unwrap();
        assert_eq!(stored.test_cases[1].steps[1].action, "Log out");
        assert_eq!(stored.env_config.as_deref(), Some("BASE_URL=http://localhost:8080"));

        assert!(matches!(
            h.controller.remove_step("TC-002", 9).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_history_selection_routes_by_status() {
        let mut h = harness(ScriptedLlm::new(), ScriptedOutcomes::default()).await;
        reviewed_project(&mut h, 1).await;
        let finished_id = h.controller.active_project().unwrap().id.clone();
        h.controller.start_execution().await.unwrap();

        let mut draft = ValidationProject::new_draft("Later", "3.1.0", Vec::new(), Vec::new(), Vec::new());
        draft.created_at += 1;
        h.store.save_project(&draft).await.unwrap();

        h.controller.go_to_dashboard();
        let listed = h.controller.open_history().await.unwrap();
        assert_eq!(listed.len(), 2);

        h.controller.select_history_project(&finished_id).await.unwrap();
        assert_eq!(h.controller.view(), View::Report);

        h.controller.go_to_dashboard();
        h.controller.open_history().await.unwrap();
        h.controller.select_history_project(&draft.id).await.unwrap();
        assert_eq!(h.controller.view(), View::ReviewPlan);

        let summary = h.controller.dashboard_summary().await.unwrap();
        assert_eq!(summary.total_projects, 2);
        assert_eq!(summary.validated, 1);
        assert_eq!(summary.draft, 1);
        assert_eq!(summary.recent[0].name, "Later");
    }

    #[tokio::test]
    async fn test_exports_write_files() {
        let mut h = harness(ScriptedLlm::new(), ScriptedOutcomes::from_passes([true, false])).await;
        reviewed_project(&mut h, 2).await;
        h.controller.start_execution().await.unwrap();

        let csv = h.controller.export_spreadsheet().unwrap();
        assert!(csv.ends_with("release_plan_test_cases.csv"));
        assert_eq!(fs::read_to_string(&csv).unwrap().lines().count(), 5);

        let document = h.controller.export_document().unwrap();
        assert_eq!(document.format, ReportFormat::Docx);
        assert!(document.path.exists());

        h.llm.push(Ok("```python\ndef test_case_1():\n    pass\n```".to_string()));
        let code = h.controller.export_code(AutomationFramework::SeleniumPython).await.unwrap();
        assert_eq!(code.path.extension().and_then(|e| e.to_str()), Some("py"));
        assert_eq!(fs::read_to_string(&code.path).unwrap(), "def test_case_1():\n    pass");
    }
}
