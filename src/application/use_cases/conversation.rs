use crate::application::use_cases::model_gateway::ModelGateway;
use crate::domain::chat::{transcript_text, ChatMessage, ChatRole};
use crate::domain::error::{AppError, Result};
use tracing::{debug, warn};

pub const GREETING: &str = "Hi! I'm your validation copilot. Tell me about the product or feature you want to validate and who will use it. I'll ask follow-up questions until we have a clear set of requirements.";

pub const REPLY_FAILED_MESSAGE: &str =
    "Sorry, I couldn't get a response just now. Please try sending that again.";

/// Requirements-gathering chat; one per visit to the gathering view.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    messages: Vec<ChatMessage>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::model(GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn transcript(&self) -> String {
        transcript_text(&self.messages)
    }

    pub fn has_user_input(&self) -> bool {
        self.messages
            .iter()
            .any(|message| message.role == ChatRole::User)
    }

    /// Appends the user message, then the model reply. A failed reply is
    /// recorded as a model message so the conversation can go on.
    pub async fn send(&mut self, gateway: &ModelGateway, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::ValidationError(
                "Message must not be empty".to_string(),
            ));
        }

        self.messages.push(ChatMessage::user(text));
        let reply = match gateway.chat_reply(&self.messages).await {
            Ok(reply) => {
                debug!(chars = reply.len(), "Chat reply received");
                ChatMessage::model(reply)
            }
            Err(e) => {
                warn!(error = %e, "Chat reply failed");
                ChatMessage::model(REPLY_FAILED_MESSAGE)
            }
        };
        self.messages.push(reply.clone());
        Ok(reply)
    }
}
