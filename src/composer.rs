//! Answer Composer
//!
//! Builds the grounded two-message prompt and delegates to the generative
//! model. No retries here; retry policy belongs to the caller.

use crate::error::OrchestrationError;
use crate::models::GroundingContext;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// External generative model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

const SYSTEM_DIRECTIVE: &str = r#"You are a company data assistant. You have access to:
1. User information including details, wallet balance, KYC status, transactions and orders
2. A knowledge base of company documents and FAQs
Provide concise and relevant answers based on all available data.
If the context says "No data found", say that the information is not available instead of guessing."#;

pub struct AnswerComposer {
    model: Arc<dyn LanguageModel>,
}

impl AnswerComposer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// System directive plus a user message carrying context and query verbatim.
    pub fn build_messages(query: &str, context: &GroundingContext) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_DIRECTIVE),
            ChatMessage::user(format!(
                "Context:\n{}\n\nQuestion: {}",
                context.as_str(),
                query
            )),
        ]
    }

    /// Model output is returned unmodified.
    pub async fn compose(&self, query: &str, context: &GroundingContext) -> Result<String> {
        let messages = Self::build_messages(query, context);

        match self.model.complete(&messages).await {
            Ok(text) => {
                info!(chars = text.len(), "Answer generated");
                Ok(text)
            }
            Err(OrchestrationError::GenerationUnavailable(reason)) => {
                error!("Generation failed: {}", reason);
                Err(OrchestrationError::GenerationUnavailable(reason))
            }
            Err(e) => {
                error!("Generation failed: {}", e);
                Err(OrchestrationError::GenerationUnavailable(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    /// Records the prompt and echoes a canned reply.
    struct RecordingModel {
        reply: String,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().await.extend_from_slice(messages);
            Ok(self.reply.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            Err(OrchestrationError::ConfigError("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_messages_embed_context_and_query() {
        let context = GroundingContext::new("WALLET: userId: U1, walletBal: 100".to_string());
        let messages = AnswerComposer::build_messages("What is my wallet balance?", &context);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(
            messages[1].content,
            "Context:\nWALLET: userId: U1, walletBal: 100\n\nQuestion: What is my wallet balance?"
        );
    }

    #[tokio::test]
    async fn test_compose_returns_model_text_unmodified() {
        let model = Arc::new(RecordingModel {
            reply: "  Your balance is 100.\n".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let composer = AnswerComposer::new(model.clone());

        let context = GroundingContext::new("No data found".to_string());
        let answer = assert_ok!(composer.compose("hi", &context).await);

        assert_eq!(answer, "  Your balance is 100.\n");
        assert_eq!(model.seen.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_any_model_failure_is_generation_unavailable() {
        let composer = AnswerComposer::new(Arc::new(FailingModel));
        let context = GroundingContext::new("No data found".to_string());

        let err = assert_err!(composer.compose("hi", &context).await);
        assert!(matches!(err, OrchestrationError::GenerationUnavailable(_)));
    }
}
