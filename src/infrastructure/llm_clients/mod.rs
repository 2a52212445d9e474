pub mod gemini;

use crate::domain::chat::ChatMessage;
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;

pub use gemini::GeminiClient;

/// A single call to the generative model.
#[derive(Debug, Clone, Default)]
pub struct LLMRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    /// When set, the model is constrained to JSON matching this schema.
    pub response_schema: Option<serde_json::Value>,
}

impl LLMRequest {
    pub fn prompt(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages: vec![ChatMessage::user(user)],
            response_schema: None,
        }
    }

    pub fn conversation(system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system: system.into(),
            messages,
            response_schema: None,
        }
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

#[async_trait]
pub trait LLMClient {
    async fn generate(&self, config: &LLMConfig, request: &LLMRequest) -> Result<String>;
}
