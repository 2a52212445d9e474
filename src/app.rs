use crate::domain::error::{AppError, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::{add_log, start_server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub fn run() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = AppConfig::load().map_err(|e| {
        error!(error = %e, "Configuration rejected");
        e
    })?;

    actix_web::rt::System::new().block_on(async move {
        let state = bootstrap::setup(&config).await?;
        let server = start_server(state.clone(), &config.http_host, config.http_port)
            .map_err(|e| {
                AppError::IoError(format!(
                    "Failed to bind {}:{}: {}",
                    config.http_host, config.http_port, e
                ))
            })?;

        add_log(
            &state.logs,
            "INFO",
            "System",
            &format!(
                "HTTP server started on {}:{}",
                config.http_host, config.http_port
            ),
        );
        info!(host = %config.http_host, port = config.http_port, "HTTP server started");

        server
            .await
            .map_err(|e| AppError::IoError(format!("HTTP server stopped: {}", e)))
    })
}
