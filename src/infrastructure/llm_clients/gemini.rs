use super::{LLMClient, LLMRequest};
use crate::domain::chat::ChatRole;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

pub struct GeminiClient {
    client: reqwest::Client,
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn api_key(config: &LLMConfig) -> Result<String> {
        config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::ValidationError("Missing API key for Google provider".to_string())
            })
    }

    fn endpoint(config: &LLMConfig, api_key: &str) -> Result<Url> {
        let base_url = config.base_url.trim_end_matches('/');
        let model_id = config.model.trim();
        let mut url = Url::parse(&format!("{}/{}:generateContent", base_url, model_id))
            .map_err(|e| AppError::ValidationError(format!("Invalid model endpoint: {}", e)))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    fn build_body(config: &LLMConfig, request: &LLMRequest) -> GeminiRequest {
        let system_instruction = if request.system.trim().is_empty() {
            None
        } else {
            Some(GeminiContent {
                parts: vec![GeminiPart {
                    text: request.system.clone(),
                }],
                role: None,
            })
        };

        let contents = request
            .messages
            .iter()
            .filter(|message| !message.text.trim().is_empty())
            .map(|message| GeminiContent {
                parts: vec![GeminiPart {
                    text: message.text.clone(),
                }],
                role: Some(
                    match message.role {
                        ChatRole::User => "user",
                        ChatRole::Model => "model",
                    }
                    .to_string(),
                ),
            })
            .collect();

        let structured = request.response_schema.is_some();
        GeminiRequest {
            system_instruction,
            contents,
            generation_config: Some(GenerationConfig {
                temperature: config.temperature.unwrap_or(0.4) as f64,
                max_output_tokens: config.max_tokens,
                response_mime_type: structured.then(|| "application/json".to_string()),
                response_schema: request.response_schema.clone(),
            }),
        }
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, config: &LLMConfig, request: &LLMRequest) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let url = Self::endpoint(config, &api_key)?;
        let body = Self::build_body(config, request);

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        let text: String = json
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::LLMError("Empty response from model".to_string()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::ChatMessage;
    use serde_json::json;

    fn config() -> LLMConfig {
        LLMConfig {
            api_key: Some("secret".to_string()),
            ..LLMConfig::default()
        }
    }

    #[test]
    fn test_endpoint_appends_model_and_key() {
        let url = GeminiClient::endpoint(&config(), "secret").unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent?key=secret"
        );
    }

    #[test]
    fn test_missing_api_key_is_not_retryable() {
        let err = GeminiClient::api_key(&LLMConfig::default()).unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_structured_body_sets_schema_and_roles() {
        let request = LLMRequest::conversation(
            "system text",
            vec![ChatMessage::user("hi"), ChatMessage::model("hello"), ChatMessage::user("  ")],
        )
        .with_schema(json!({ "type": "OBJECT" }));

        let body = serde_json::to_value(GeminiClient::build_body(&config(), &request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "system text");
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_free_text_body_omits_schema() {
        let request = LLMRequest::prompt("", "write code");
        let body = serde_json::to_value(GeminiClient::build_body(&config(), &request)).unwrap();

        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].get("responseSchema").is_none());
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }
}
