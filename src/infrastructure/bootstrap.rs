use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::application::{ExecutionSimulator, ModelGateway, RetryPolicy, ViewController};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::{AppConfig, ConfigService, API_KEY_PROVIDER};
use crate::infrastructure::db::connection::init_project_db;
use crate::infrastructure::db::ProjectRepository;
use crate::infrastructure::llm_clients::GeminiClient;
use crate::infrastructure::storage::ensure_data_dir;
use crate::interfaces::http::{add_log, HttpState, LogEntry};

/// Wires the controller and its collaborators into the shared HTTP state.
pub async fn setup(config: &AppConfig) -> Result<Arc<HttpState>> {
    let data_dir = ensure_data_dir(&config.data_dir).map_err(|e| {
        AppError::IoError(format!(
            "Failed to create data dir {}: {}",
            config.data_dir.display(),
            e
        ))
    })?;
    info!(data_dir = %data_dir.display(), "Data directory ready");

    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let config_service = ConfigService::new();

    let mut llm_config = config.llm.clone();
    if llm_config.api_key.is_none() {
        match config_service.get_api_key(API_KEY_PROVIDER) {
            Ok(key) => {
                info!("API key loaded from keyring");
                llm_config.api_key = Some(key);
            }
            Err(e) => warn!(error = %e, "No API key configured; model features need one"),
        }
    }

    let pool = init_project_db(&config.database_path()).await?;
    let store = Arc::new(ProjectRepository::new(pool));

    let gateway = Arc::new(ModelGateway::new(
        Arc::new(GeminiClient::new()),
        llm_config,
        RetryPolicy::from_settings(&config.retry),
    ));
    let simulator = ExecutionSimulator::from_settings(&config.simulator);
    let controller = ViewController::new(
        gateway,
        store,
        simulator,
        config.platform_version.clone(),
        config.exports_dir(),
    );

    add_log(
        &logs,
        "INFO",
        "System",
        &format!("Backend initialized (model={})", config.llm.model),
    );

    Ok(Arc::new(HttpState::new(controller, logs, config_service)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::view::View;

    #[tokio::test]
    async fn test_setup_creates_database_and_controller() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.data_dir = dir.path().join("data");
        config.llm.api_key = Some("test-key".to_string());

        let state = setup(&config).await.unwrap();

        assert!(config.database_path().exists());
        let controller = state.controller.lock().await;
        assert_eq!(controller.view(), View::Dashboard);
        assert!(controller.gateway().has_api_key().await);
        assert_eq!(state.logs.lock().unwrap().len(), 1);
    }
}
