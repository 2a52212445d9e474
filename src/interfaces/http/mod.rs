use crate::application::ViewController;
use crate::domain::automation::AutomationFramework;
use crate::domain::error::AppError;
use crate::domain::test_case::{TestCase, TestStep};
use crate::infrastructure::config::{ConfigService, API_KEY_PROVIDER};
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpResponse, HttpServer, Responder,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use validator::Validate;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

/// Every request goes through the one controller; actions run to completion
/// before the next one is accepted.
pub struct HttpState {
    pub controller: AsyncMutex<ViewController>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
    pub config_service: ConfigService,
}

impl HttpState {
    pub fn new(
        controller: ViewController,
        logs: Arc<Mutex<Vec<LogEntry>>>,
        config_service: ConfigService,
    ) -> Self {
        Self {
            controller: AsyncMutex::new(controller),
            logs,
            config_service,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(min = 1, message = "path must not be empty"))]
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPayload {
    pub action: String,
    #[serde(default)]
    pub expected_result: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditTestCaseRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub steps: Vec<StepPayload>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddStepRequest {
    #[validate(length(min = 1, message = "action must not be empty"))]
    pub action: String,
    #[serde(default)]
    pub expected_result: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefineRequest {
    #[validate(length(min = 1, message = "instruction must not be empty"))]
    pub instruction: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRequest {
    #[serde(default)]
    pub env_config: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CodeExportRequest {
    #[serde(default)]
    pub framework: AutomationFramework,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRequest {
    #[validate(length(min = 1, message = "apiKey must not be empty"))]
    pub api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FixResponse {
    test_case: TestCase,
    explanation: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PathResponse {
    path: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyResponse {
    configured: bool,
    persisted: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::ValidationError(_) | AppError::ParseError(_) => StatusCode::BAD_REQUEST,
        AppError::InvalidTransition(_) => StatusCode::CONFLICT,
        AppError::LLMError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &AppError) -> HttpResponse {
    HttpResponse::build(status_for(error)).json(ErrorBody {
        error: error.to_string(),
    })
}

fn checked<T: Validate>(req: &T) -> Result<(), AppError> {
    req.validate()
        .map_err(|e| AppError::ValidationError(format!("Invalid request: {}", e)))
}

/// JSON on success; failures are logged and mapped to a status code.
fn respond<T: Serialize>(
    logs: &Mutex<Vec<LogEntry>>,
    action: &str,
    result: Result<T, AppError>,
) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => {
            let level = if status_for(&e).is_server_error() {
                "ERROR"
            } else {
                "WARN"
            };
            add_log(logs, level, "HttpApi", &format!("{} failed: {}", action, e));
            error_response(&e)
        }
    }
}

#[get("/state")]
async fn get_state(data: web::Data<HttpState>) -> impl Responder {
    let controller = data.controller.lock().await;
    HttpResponse::Ok().json(controller.state())
}

#[get("/dashboard")]
async fn dashboard(data: web::Data<HttpState>) -> impl Responder {
    let controller = data.controller.lock().await;
    respond(&data.logs, "Dashboard", controller.dashboard_summary().await)
}

#[post("/navigate/dashboard")]
async fn navigate_dashboard(data: web::Data<HttpState>) -> impl Responder {
    let mut controller = data.controller.lock().await;
    controller.go_to_dashboard();
    HttpResponse::Ok().json(controller.state())
}

#[post("/navigate/history")]
async fn navigate_history(data: web::Data<HttpState>) -> impl Responder {
    let mut controller = data.controller.lock().await;
    respond(&data.logs, "Open history", controller.open_history().await)
}

#[post("/projects/new")]
async fn new_project(data: web::Data<HttpState>) -> impl Responder {
    add_log(&data.logs, "INFO", "HttpApi", "Starting requirements conversation");
    let mut controller = data.controller.lock().await;
    respond(&data.logs, "New project", controller.start_new_project())
}

#[post("/chat")]
async fn chat(data: web::Data<HttpState>, req: web::Json<ChatRequest>) -> impl Responder {
    if let Err(e) = checked(&*req) {
        return error_response(&e);
    }
    let mut controller = data.controller.lock().await;
    respond(&data.logs, "Chat", controller.send_chat_message(&req.message).await)
}

#[post("/requirements/extract")]
async fn extract_requirements(data: web::Data<HttpState>) -> impl Responder {
    add_log(&data.logs, "INFO", "HttpApi", "Extracting requirements from conversation");
    let mut controller = data.controller.lock().await;
    let result = controller.finish_gathering().await;
    if let Ok(project) = &result {
        add_log(
            &data.logs,
            "INFO",
            "HttpApi",
            &format!(
                "Project '{}' created with {} test cases",
                project.name,
                project.test_cases.len()
            ),
        );
    }
    respond(&data.logs, "Requirement extraction", result)
}

#[post("/requirements/import")]
async fn import_requirements(
    data: web::Data<HttpState>,
    req: web::Json<ImportRequest>,
) -> impl Responder {
    if let Err(e) = checked(&*req) {
        return error_response(&e);
    }
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Importing requirements from {}", req.path),
    );
    let mut controller = data.controller.lock().await;
    let path = PathBuf::from(&req.path);
    respond(&data.logs, "Import", controller.import_requirements(&path).await)
}

#[post("/history/{id}/open")]
async fn open_project(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let mut controller = data.controller.lock().await;
    respond(
        &data.logs,
        "Open project",
        controller.select_history_project(&path).await,
    )
}

#[put("/test-cases/{id}")]
async fn edit_test_case(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<EditTestCaseRequest>,
) -> impl Responder {
    if let Err(e) = checked(&*req) {
        return error_response(&e);
    }
    let req = req.into_inner();
    let steps = req
        .steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| TestStep::new(index as u32 + 1, step.action, step.expected_result))
        .collect();
    let mut controller = data.controller.lock().await;
    respond(
        &data.logs,
        "Edit test case",
        controller.edit_test_case(&path, &req.title, steps).await,
    )
}

#[post("/test-cases/{id}/steps")]
async fn add_step(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<AddStepRequest>,
) -> impl Responder {
    if let Err(e) = checked(&*req) {
        return error_response(&e);
    }
    let mut controller = data.controller.lock().await;
    respond(
        &data.logs,
        "Add step",
        controller
            .add_step(&path, &req.action, &req.expected_result)
            .await,
    )
}

#[delete("/test-cases/{id}/steps/{step}")]
async fn remove_step(
    data: web::Data<HttpState>,
    path: web::Path<(String, u32)>,
) -> impl Responder {
    let (test_case_id, step_number) = path.into_inner();
    let mut controller = data.controller.lock().await;
    respond(
        &data.logs,
        "Remove step",
        controller.remove_step(&test_case_id, step_number).await,
    )
}

#[post("/test-cases/{id}/refine")]
async fn refine_test_case(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<RefineRequest>,
) -> impl Responder {
    if let Err(e) = checked(&*req) {
        return error_response(&e);
    }
    let mut controller = data.controller.lock().await;
    respond(
        &data.logs,
        "Refine test case",
        controller.refine_test_case(&path, &req.instruction).await,
    )
}

#[post("/test-cases/{id}/fix")]
async fn fix_test_case(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    let mut controller = data.controller.lock().await;
    let result = controller
        .fix_test_case(&path)
        .await
        .map(|(test_case, explanation)| FixResponse {
            test_case,
            explanation,
        });
    respond(&data.logs, "Fix test case", result)
}

#[put("/project/environment")]
async fn set_environment(
    data: web::Data<HttpState>,
    req: web::Json<EnvironmentRequest>,
) -> impl Responder {
    let mut controller = data.controller.lock().await;
    respond(
        &data.logs,
        "Set environment",
        controller.set_env_config(req.into_inner().env_config).await,
    )
}

#[post("/execution/start")]
async fn start_execution(data: web::Data<HttpState>) -> impl Responder {
    add_log(&data.logs, "INFO", "Execution", "Execution started");
    let mut controller = data.controller.lock().await;
    let result = controller.start_execution().await;
    if let Ok(project) = &result {
        add_log(
            &data.logs,
            "INFO",
            "Execution",
            &format!("Execution finished: {}", project.status),
        );
    }
    respond(&data.logs, "Execution", result)
}

#[post("/execution/retry")]
async fn retry_execution(data: web::Data<HttpState>) -> impl Responder {
    add_log(&data.logs, "INFO", "Execution", "Re-running failed test cases");
    let mut controller = data.controller.lock().await;
    let result = controller.retry_execution().await;
    if let Ok(project) = &result {
        add_log(
            &data.logs,
            "INFO",
            "Execution",
            &format!("Retry finished: {}", project.status),
        );
    }
    respond(&data.logs, "Retry", result)
}

#[get("/report")]
async fn report(data: web::Data<HttpState>) -> impl Responder {
    let controller = data.controller.lock().await;
    respond(&data.logs, "Report", controller.report_summary())
}

#[post("/report/export/spreadsheet")]
async fn export_spreadsheet(data: web::Data<HttpState>) -> impl Responder {
    let controller = data.controller.lock().await;
    let result = controller
        .export_spreadsheet()
        .map(|path| PathResponse { path });
    respond(&data.logs, "Spreadsheet export", result)
}

#[post("/report/export/document")]
async fn export_document(data: web::Data<HttpState>) -> impl Responder {
    let controller = data.controller.lock().await;
    respond(&data.logs, "Document export", controller.export_document())
}

#[post("/report/export/code")]
async fn export_code(
    data: web::Data<HttpState>,
    req: Option<web::Json<CodeExportRequest>>,
) -> impl Responder {
    let framework = req.map(|req| req.framework).unwrap_or_default();
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Generating {} test suite", framework),
    );
    let controller = data.controller.lock().await;
    respond(&data.logs, "Code export", controller.export_code(framework).await)
}

#[post("/settings/api-key")]
async fn save_api_key(data: web::Data<HttpState>, req: web::Json<ApiKeyRequest>) -> impl Responder {
    if let Err(e) = checked(&*req) {
        return error_response(&e);
    }
    let key = req.into_inner().api_key;
    // A missing credential store still leaves the key usable for this run.
    let persisted = match data.config_service.save_api_key(API_KEY_PROVIDER, &key) {
        Ok(()) => true,
        Err(e) => {
            add_log(
                &data.logs,
                "WARN",
                "Settings",
                &format!("API key not stored in keyring: {}", e),
            );
            false
        }
    };

    let controller = data.controller.lock().await;
    controller.gateway().set_api_key(Some(key)).await;
    add_log(&data.logs, "INFO", "Settings", "API key updated");
    HttpResponse::Ok().json(ApiKeyResponse {
        configured: controller.gateway().has_api_key().await,
        persisted,
    })
}

#[delete("/settings/api-key")]
async fn delete_api_key(data: web::Data<HttpState>) -> impl Responder {
    if let Err(e) = data.config_service.delete_api_key(API_KEY_PROVIDER) {
        add_log(
            &data.logs,
            "WARN",
            "Settings",
            &format!("API key not removed from keyring: {}", e),
        );
    }
    let controller = data.controller.lock().await;
    controller.gateway().set_api_key(None).await;
    add_log(&data.logs, "INFO", "Settings", "API key removed");
    HttpResponse::Ok().json(ApiKeyResponse {
        configured: false,
        persisted: false,
    })
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = lock_logs(&data.logs);
    HttpResponse::Ok().json(&*logs)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(get_state)
            .service(dashboard)
            .service(navigate_dashboard)
            .service(navigate_history)
            .service(new_project)
            .service(chat)
            .service(extract_requirements)
            .service(import_requirements)
            .service(open_project)
            .service(edit_test_case)
            .service(add_step)
            .service(remove_step)
            .service(refine_test_case)
            .service(fix_test_case)
            .service(set_environment)
            .service(start_execution)
            .service(retry_execution)
            .service(report)
            .service(export_spreadsheet)
            .service(export_document)
            .service(export_code)
            .service(save_api_key)
            .service(delete_api_key)
            .service(get_logs),
    );
}

pub fn start_server(state: Arc<HttpState>, host: &str, port: u16) -> std::io::Result<Server> {
    let state = web::Data::from(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Local tool, any origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}

fn lock_logs(logs: &Mutex<Vec<LogEntry>>) -> MutexGuard<'_, Vec<LogEntry>> {
    logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = lock_logs(logs);
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}
