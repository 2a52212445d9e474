mod prompts;
mod schemas;
mod types;

use crate::application::use_cases::conversation::REPLY_FAILED_MESSAGE;
use crate::application::use_cases::retry::RetryPolicy;
use crate::domain::automation::AutomationFramework;
use crate::domain::chat::{ChatMessage, ChatRole};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::requirement::{Priority, Requirement, RequirementCategory};
use crate::domain::test_case::{test_case_id, TestCase};
use crate::infrastructure::llm_clients::{LLMClient, LLMRequest};
use crate::infrastructure::response::{clean_llm_response, strip_code_fence};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use types::{into_steps, ExtractionOutput, FixOutput, RefineOutput, TestCasesOutput};
pub use types::{ExtractedRequirements, TestCaseFix, TestCaseRefinement};

const FALLBACK_PROJECT_NAME: &str = "New Validation Project";
const SNIPPET_CHARS: usize = 400;

/// Every model interaction goes through here: prompt, schema, retry, parse.
pub struct ModelGateway {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: RwLock<LLMConfig>,
    retry: RetryPolicy,
}

impl ModelGateway {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        config: LLMConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            llm_client,
            config: RwLock::new(config),
            retry,
        }
    }

    pub async fn set_api_key(&self, api_key: Option<String>) {
        self.config.write().await.api_key = api_key.filter(|key| !key.trim().is_empty());
    }

    pub async fn has_api_key(&self) -> bool {
        self.config.read().await.api_key.is_some()
    }

    pub async fn chat_reply(&self, history: &[ChatMessage]) -> Result<String> {
        // The conversation has to open with a user turn; drop the greeting.
        // Locally generated failure notices never reach the model.
        let messages: Vec<ChatMessage> = history
            .iter()
            .skip_while(|message| message.role == ChatRole::Model)
            .filter(|message| !is_failure_notice(message))
            .cloned()
            .collect();
        if messages.is_empty() {
            return Err(AppError::ValidationError(
                "Conversation has no user message yet".to_string(),
            ));
        }

        let request = LLMRequest::conversation(prompts::CHAT_SYSTEM_PROMPT, messages);
        self.request_text("chat_reply", &request).await
    }

    pub async fn extract_requirements(&self, transcript: &str) -> Result<ExtractedRequirements> {
        if transcript.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Transcript is empty".to_string(),
            ));
        }

        let request = LLMRequest::prompt(
            prompts::EXTRACTION_SYSTEM_PROMPT,
            prompts::build_extraction_prompt(transcript),
        )
        .with_schema(schemas::requirements_schema());
        let output: ExtractionOutput = self.request_json("extract_requirements", &request).await?;

        let requirements: Vec<Requirement> = output
            .requirements
            .into_iter()
            .filter(|input| !input.description.trim().is_empty())
            .enumerate()
            .map(|(index, input)| {
                Requirement::new(
                    index,
                    RequirementCategory::from_label(&input.category),
                    input.description.trim(),
                    Priority::from_label(&input.priority),
                )
            })
            .collect();

        let suggested_name = output
            .suggested_project_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_string());

        info!(count = requirements.len(), name = %suggested_name, "Requirements extracted");
        Ok(ExtractedRequirements {
            requirements,
            suggested_name,
        })
    }

    pub async fn generate_test_cases(&self, requirements: &[Requirement]) -> Result<Vec<TestCase>> {
        if requirements.is_empty() {
            return Err(AppError::ValidationError(
                "At least one requirement is needed to generate test cases".to_string(),
            ));
        }

        let request = LLMRequest::prompt(
            prompts::GENERATION_SYSTEM_PROMPT,
            prompts::build_generation_prompt(requirements),
        )
        .with_schema(schemas::test_cases_schema());
        let output: TestCasesOutput = self.request_json("generate_test_cases", &request).await?;

        let test_cases: Vec<TestCase> = output
            .into_cases()
            .into_iter()
            .filter(|input| !input.title.trim().is_empty())
            .enumerate()
            .map(|(index, input)| {
                TestCase::new(
                    test_case_id(index),
                    input.requirement_id.trim(),
                    input.title.trim(),
                    into_steps(input.steps),
                )
            })
            .collect();

        if test_cases.is_empty() {
            return Err(AppError::LLMError(
                "Model returned no test cases".to_string(),
            ));
        }
        info!(count = test_cases.len(), "Test cases generated");
        Ok(test_cases)
    }

    pub async fn analyze_and_fix_test_case(&self, test_case: &TestCase) -> Result<TestCaseFix> {
        let request = LLMRequest::prompt(prompts::FIX_SYSTEM_PROMPT, prompts::build_fix_prompt(test_case))
            .with_schema(schemas::fix_schema());
        let output: FixOutput = self.request_json("analyze_and_fix_test_case", &request).await?;

        let steps = into_steps(output.steps);
        if steps.is_empty() {
            return Err(AppError::LLMError(
                "Model returned a fix without steps".to_string(),
            ));
        }
        Ok(TestCaseFix {
            steps,
            explanation: output.explanation.trim().to_string(),
        })
    }

    pub async fn refine_test_case(
        &self,
        test_case: &TestCase,
        instruction: &str,
    ) -> Result<TestCaseRefinement> {
        if instruction.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Refinement instruction is empty".to_string(),
            ));
        }

        let request = LLMRequest::prompt(
            prompts::REFINE_SYSTEM_PROMPT,
            prompts::build_refine_prompt(test_case, instruction),
        )
        .with_schema(schemas::refine_schema());
        let output: RefineOutput = self.request_json("refine_test_case", &request).await?;

        let title = output.title.trim();
        Ok(TestCaseRefinement {
            title: if title.is_empty() {
                test_case.title.clone()
            } else {
                title.to_string()
            },
            steps: into_steps(output.steps),
        })
    }

    pub async fn generate_test_suite_code(
        &self,
        test_cases: &[TestCase],
        framework: AutomationFramework,
        env_config: Option<&str>,
    ) -> Result<String> {
        let request = LLMRequest::prompt(
            prompts::CODE_SYSTEM_PROMPT,
            prompts::build_code_prompt(test_cases, framework, env_config),
        );
        let code = self.request_text("generate_test_suite_code", &request).await?;
        Ok(strip_code_fence(&code))
    }

    async fn request_text(&self, label: &str, request: &LLMRequest) -> Result<String> {
        let config = self.config.read().await.clone();
        let config = &config;
        self.retry
            .run(label, || async move { self.generate_once(config, request).await })
            .await
    }

    async fn request_json<T: DeserializeOwned>(&self, label: &str, request: &LLMRequest) -> Result<T> {
        let config = self.config.read().await.clone();
        let config = &config;
        self.retry
            .run(label, || async move {
                let text = self.generate_once(config, request).await?;
                parse_structured(label, &text)
            })
            .await
    }

    async fn generate_once(&self, config: &LLMConfig, request: &LLMRequest) -> Result<String> {
        let raw = self.llm_client.generate(config, request).await?;
        let cleaned = clean_llm_response(&raw);
        if cleaned.is_empty() {
            return Err(AppError::LLMError("Empty response from model".to_string()));
        }
        Ok(cleaned)
    }
}

fn parse_structured<T: DeserializeOwned>(label: &str, text: &str) -> Result<T> {
    let payload = strip_code_fence(text);
    serde_json::from_str::<T>(&payload).map_err(|e| {
        let snippet: String = payload.chars().take(SNIPPET_CHARS).collect();
        warn!(operation = label, error = %e, "Malformed model output");
        AppError::LLMError(format!(
            "Malformed model output: {} | output_snippet={}",
            e, snippet
        ))
    })
}

fn is_failure_notice(message: &ChatMessage) -> bool {
    message.role == ChatRole::Model && message.text == REPLY_FAILED_MESSAGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::test_support::ScriptedLlm;
    use crate::domain::chat::transcript_text;
    use crate::domain::test_case::{TestCaseStatus, TestStep};

    fn gateway(llm: Arc<ScriptedLlm>) -> ModelGateway {
        ModelGateway::new(llm, LLMConfig::default(), RetryPolicy::no_delay(2))
    }

    #[tokio::test]
    async fn test_extract_login_scenario() {
        let llm = Arc::new(ScriptedLlm::new().reply(
            r#"{"requirements":[{"type":"Functional Requirement","description":"Login works","priority":"High"}],"suggestedProjectName":"Login"}"#,
        ));
        let extracted = gateway(llm.clone())
            .extract_requirements("user: I need a login page")
            .await
            .unwrap();

        assert_eq!(extracted.suggested_name, "Login");
        assert_eq!(extracted.requirements.len(), 1);
        let requirement = &extracted.requirements[0];
        assert_eq!(requirement.id, "REQ-001");
        assert_eq!(requirement.category, RequirementCategory::Functional);
        assert_eq!(requirement.priority, Priority::High);
        assert_eq!(requirement.description, "Login works");

        let requests = llm.requests();
        assert!(requests[0].response_schema.is_some());
        assert!(requests[0].messages[0].text.contains("I need a login page"));
    }

    #[tokio::test]
    async fn test_malformed_output_is_retried_then_surfaced() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply("not json")
                .reply("{\"requirements\": 3}")
                .reply(""),
        );
        let err = gateway(llm.clone())
            .extract_requirements("user: hi")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LLMError(_)));
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let llm = Arc::new(ScriptedLlm::new().fail("503").reply(
            "```json\n[{\"requirementId\":\"REQ-001\",\"title\":\"Valid login\",\"steps\":[{\"stepNumber\":3,\"action\":\"Open\",\"expectedResult\":\"Shown\"},{\"stepNumber\":7,\"action\":\"Submit\",\"expectedResult\":\"Done\"}]}]\n```",
        ));
        let requirements = vec![Requirement::new(
            0,
            RequirementCategory::Functional,
            "Login works",
            Priority::High,
        )];
        let cases = gateway(llm.clone())
            .generate_test_cases(&requirements)
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 2);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id, "TC-001");
        assert_eq!(cases[0].status, TestCaseStatus::Pending);
        let numbers: Vec<u32> = cases[0].steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_wrapped_test_case_array_is_accepted() {
        let llm = Arc::new(ScriptedLlm::new().reply(
            r#"{"testCases":[{"requirementId":"REQ-001","title":"A","steps":[]},{"requirementId":"REQ-001","title":"B","steps":[]}]}"#,
        ));
        let requirements = vec![Requirement::new(0, RequirementCategory::User, "x", Priority::Low)];
        let cases = gateway(llm).generate_test_cases(&requirements).await.unwrap();
        assert_eq!(cases[1].id, "TC-002");
    }

    #[tokio::test]
    async fn test_fix_returns_renumbered_steps_and_explanation() {
        let llm = Arc::new(ScriptedLlm::new().reply(
            r#"{"steps":[{"stepNumber":1,"action":"Wait for form","expectedResult":"Form ready"},{"stepNumber":1,"action":"Submit","expectedResult":"Saved"}],"explanation":"Added an explicit wait."}"#,
        ));
        let mut case = TestCase::new("TC-001", "REQ-001", "Save", vec![TestStep::new(1, "Submit", "Saved")]);
        case.status = TestCaseStatus::Failed;
        let fix = gateway(llm).analyze_and_fix_test_case(&case).await.unwrap();
        assert_eq!(fix.steps[1].step_number, 2);
        assert_eq!(fix.explanation, "Added an explicit wait.");
    }

    #[tokio::test]
    async fn test_refine_requires_instruction() {
        let llm = Arc::new(ScriptedLlm::new());
        let case = TestCase::new("TC-001", "REQ-001", "Save", Vec::new());
        let err = gateway(llm.clone()).refine_test_case(&case, "  ").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_code_generation_strips_fences() {
        let llm = Arc::new(ScriptedLlm::new().reply("```typescript\nimport { test } from '@playwright/test';\n```"));
        let code = gateway(llm)
            .generate_test_suite_code(&[], AutomationFramework::PlaywrightTypeScript, None)
            .await
            .unwrap();
        assert_eq!(code, "import { test } from '@playwright/test';");
    }

    #[tokio::test]
    async fn test_chat_reply_skips_leading_greeting() {
        let llm = Arc::new(ScriptedLlm::new().reply("Who are the users?"));
        let history = vec![ChatMessage::model("Hello!"), ChatMessage::user("Build a shop")];
        let reply = gateway(llm.clone()).chat_reply(&history).await.unwrap();
        assert_eq!(reply, "Who are the users?");

        let sent = &llm.requests()[0];
        assert_eq!(sent.messages.len(), 1);
        assert_eq!(sent.messages[0].role, ChatRole::User);
        assert!(sent.response_schema.is_none());
    }

    #[tokio::test]
    async fn test_chat_reply_leaves_out_failure_notices() {
        let llm = Arc::new(ScriptedLlm::new().reply("Which payment methods?"));
        let history = vec![
            ChatMessage::model("Hello!"),
            ChatMessage::user("Build a shop"),
            ChatMessage::model(REPLY_FAILED_MESSAGE),
            ChatMessage::user("It sells books"),
        ];
        gateway(llm.clone()).chat_reply(&history).await.unwrap();

        let sent = &llm.requests()[0];
        let texts: Vec<&str> = sent.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Build a shop", "It sells books"]);
    }

    #[tokio::test]
    async fn test_extraction_prompt_carries_whole_transcript() {
        let llm = Arc::new(ScriptedLlm::new().reply(
            r#"{"requirements":[{"type":"Functional Requirement","description":"Login works","priority":"High"}],"suggestedProjectName":"Login"}"#,
        ));
        let transcript = transcript_text(&[
            ChatMessage::user("We need a login page"),
            ChatMessage::model("Who signs in?"),
            ChatMessage::user("Customers with an email"),
            ChatMessage::model("Anything after login?"),
            ChatMessage::user("Show the dashboard"),
        ]);
        let extracted = gateway(llm.clone())
            .extract_requirements(&transcript)
            .await
            .unwrap();
        assert_eq!(extracted.requirements.len(), 1);
        assert_eq!(extracted.suggested_name, "Login");

        let prompt = &llm.requests()[0].messages[0].text;
        for line in transcript.lines() {
            assert!(prompt.contains(line), "missing transcript line: {}", line);
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_retried() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push(Err(AppError::ValidationError("Missing API key".to_string())));
        let err = gateway(llm.clone())
            .chat_reply(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(llm.call_count(), 1);
    }
}
