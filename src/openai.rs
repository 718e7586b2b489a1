//! OpenAI-compatible chat-completions transport.
//!
//! Requests and responses use the `async-openai` types, but the HTTP call is
//! made here with `reqwest` so the response status reaches the retry policy.

use crate::config::ModelSettings;
use crate::error::{Result, VidmetaError};
use async_openai::types::{CreateChatCompletionRequest, CreateChatCompletionResponse};
use std::time::Duration;
use tracing::debug;

/// Longest provider error text kept in an error message.
const MAX_ERROR_CHARS: usize = 500;

/// HTTP client bound to one chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

/// Create a client for the configured endpoint, reading the key from the environment.
pub fn create_client(settings: &ModelSettings) -> Result<ChatClient> {
    let api_key = settings.api_key().ok_or_else(|| {
        VidmetaError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            settings.api_key_env, settings.api_key_env
        ))
    })?;

    create_client_with_key(settings, &api_key)
}

/// Create a client with an explicit API key.
pub fn create_client_with_key(settings: &ModelSettings, api_key: &str) -> Result<ChatClient> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    Ok(ChatClient {
        http,
        api_base: settings.api_base.trim_end_matches('/').to_string(),
        api_key: api_key.to_string(),
    })
}

impl ChatClient {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    /// Send one chat-completion request.
    ///
    /// Non-2xx replies become [`VidmetaError::Model`] carrying the HTTP status.
    pub async fn create(&self, request: &CreateChatCompletionRequest) -> Result<CreateChatCompletionResponse> {
        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!("Chat completion returned HTTP {} ({} bytes)", status.as_u16(), body.len());

        if !status.is_success() {
            return Err(VidmetaError::Model {
                status: Some(status.as_u16()),
                message: format!("HTTP {}: {}", status.as_u16(), error_message(&body)),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            VidmetaError::model(format!("Failed to decode chat completion response: {}", e))
        })
    }
}

fn transport_error(error: reqwest::Error) -> VidmetaError {
    VidmetaError::Model {
        status: error.status().map(|s| s.as_u16()),
        message: error.to_string(),
    }
}

/// Pull the human-readable message out of a provider error body.
///
/// OpenAI replies with `{"error": {...}}`; Gemini's compatibility layer
/// sometimes wraps the same object in a one-element array.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().map(|value| match value {
        serde_json::Value::Array(items) => items.first().unwrap_or(value),
        _ => value,
    });

    let message = error
        .and_then(|e| e["error"]["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());

    if message.is_empty() {
        return "empty response body".to_string();
    }
    if message.chars().count() > MAX_ERROR_CHARS {
        let cut: String = message.chars().take(MAX_ERROR_CHARS).collect();
        return format!("{}...", cut);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_with_explicit_key() {
        let settings = ModelSettings {
            api_base: "http://localhost:8080/v1/".to_string(),
            ..ModelSettings::default()
        };
        let client = create_client_with_key(&settings, "test-key").unwrap();
        assert_eq!(client.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let settings = ModelSettings {
            api_key_env: "VIDMETA_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ModelSettings::default()
        };
        let err = create_client(&settings).unwrap_err();
        assert!(matches!(err, VidmetaError::Config(_)));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error": {"message": "The engine is currently overloaded", "type": "server_error"}}"#),
            "The engine is currently overloaded"
        );
        assert_eq!(
            error_message(r#"[{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}]"#),
            "Resource has been exhausted"
        );
        assert_eq!(error_message("upstream connect error"), "upstream connect error");
        assert_eq!(error_message("  "), "empty response body");
    }
}
