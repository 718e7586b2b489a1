//! Language model abstraction.
//!
//! Agents talk to a [`LanguageModel`] through provider-neutral message and
//! tool types. [`OpenAIModel`] is the hosted implementation; tests plug in
//! scripted models.

mod chat;
mod retry;

pub use chat::OpenAIModel;
pub use retry::{execute_with_retry, is_retryable, RetryPolicy};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single message in a model conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// JSON-encoded arguments, as produced by the model.
    pub arguments: String,
}

/// A function tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// One chat-completion request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

/// The model's reply: final text, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelResponse {
    /// A plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// Trait for chat models.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier of the model, for logs and reports.
    fn name(&self) -> &str;

    /// Send one request and return the reply. Implementations do not retry.
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse>;
}

/// Stand-in used to build pipelines for inspection when no credentials are
/// configured. Every call fails.
pub struct UnavailableModel {
    name: String,
    reason: String,
}

impl UnavailableModel {
    pub fn new(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for UnavailableModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _request: ModelRequest) -> Result<ModelResponse> {
        Err(crate::error::VidmetaError::Config(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_model_always_fails() {
        let model = UnavailableModel::new("gemini-2.5-flash", "GEMINI_API_KEY not set");
        let request = ModelRequest {
            messages: vec![Message::User("hi".to_string())],
            tools: Vec::new(),
        };
        let err = model.generate(request).await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
        assert_eq!(model.name(), "gemini-2.5-flash");
    }
}
