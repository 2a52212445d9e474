use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::security::keyring::KeyringManager;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

pub const CONFIG_FILE: &str = "validation-copilot.toml";
pub const ENV_PREFIX: &str = "VALCOPILOT_";
pub const API_KEY_PROVIDER: &str = "google";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    #[validate(length(min = 1))]
    pub http_host: String,
    #[validate(range(min = 1))]
    pub http_port: u16,
    #[validate(length(min = 1))]
    pub platform_version: String,
    pub llm: LLMConfig,
    pub retry: RetrySettings,
    pub simulator: SimulatorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    #[validate(range(min = 1.0))]
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulatorSettings {
    pub step_delay_ms: u64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub pass_probability: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub pass_evidence_probability: f64,
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".validation-copilot"),
            http_host: "127.0.0.1".to_string(),
            http_port: 3001,
            platform_version: "1.0.0".to_string(),
            llm: LLMConfig::default(),
            retry: RetrySettings::default(),
            simulator: SimulatorSettings::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
            multiplier: 1.5,
        }
    }
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            step_delay_ms: 800,
            pass_probability: 0.7,
            pass_evidence_probability: 0.2,
            seed: None,
        }
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl SimulatorSettings {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

impl AppConfig {
    /// Defaults, then `validation-copilot.toml`, then `VALCOPILOT_*` variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_figment(Self::figment())?;
        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {e}")))?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {e}")))?;
        self.retry
            .validate()
            .map_err(|e| AppError::ValidationError(format!("Invalid retry settings: {e}")))?;
        self.simulator
            .validate()
            .map_err(|e| AppError::ValidationError(format!("Invalid simulator settings: {e}")))?;
        if self.llm.model.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Model name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("validation_copilot.db")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

/// API keys kept in the OS credential store.
pub struct ConfigService {
    keyring: KeyringManager,
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new("ValidationCopilot"),
        }
    }

    pub fn save_api_key(&self, provider: &str, key: &str) -> Result<()> {
        self.keyring.set_secret(provider, key)
    }

    pub fn get_api_key(&self, provider: &str) -> Result<String> {
        self.keyring.get_secret(provider)
    }

    pub fn delete_api_key(&self, provider: &str) -> Result<()> {
        self.keyring.delete_secret(provider)
    }
}
