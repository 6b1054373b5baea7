//! OpenAI-compatible LLM client.
//!
//! This client works with any OpenAI-compatible chat-completions endpoint.
//! Requests ask for a JSON object response.

use super::ParseProducer;
use crate::config::LlmConfig;
use crate::error::{ParseEvalError, Result};
use crate::provider::Provider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Message role in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
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

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Request body for chat completion. Carries no token cap; reasoning models
/// reject `max_tokens`.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Response from chat completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// OpenAI API error response.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Response from an LLM call including metadata.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated content.
    pub content: String,
    /// Reason the model stopped generating.
    pub finish_reason: Option<String>,
    /// Token usage (if available).
    pub usage: Option<TokenUsage>,
}

#[derive(Debug)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// OpenAI-compatible LLM client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Get the API endpoint URL. The base may or may not carry the `/v1`
    /// version segment.
    fn endpoint(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn request(&self, messages: Vec<Message>, json_mode: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(self.config.temperature),
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        }
    }

    /// Send a chat completion request.
    pub async fn chat(&self, messages: Vec<Message>, json_mode: bool) -> Result<LlmResponse> {
        let request = self.request(messages, json_mode);

        let response = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                return Err(ParseEvalError::LlmApi(format!(
                    "openai ({}): {}",
                    status, api_error.error.message
                )));
            }
            return Err(ParseEvalError::LlmApi(format!(
                "openai request failed ({}): {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ParseEvalError::LlmApi(format!("openai response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ParseEvalError::LlmApi("openai: no choices in response".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason,
            usage: completion.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }

    /// Test connectivity to the API.
    pub async fn test_connection(&self) -> Result<()> {
        let messages = vec![Message::user("Say 'hello' and nothing else.")];

        let response = self.chat(messages, false).await?;

        if response.content.to_lowercase().contains("hello") {
            Ok(())
        } else {
            Err(ParseEvalError::LlmApi(format!(
                "Unexpected response: {}",
                response.content
            )))
        }
    }
}

#[async_trait]
impl ParseProducer for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn complete_json(&self, system_prompt: &str, query: &str) -> Result<String> {
        let messages = vec![Message::system(system_prompt), Message::user(query)];
        let response = self.chat(messages, true).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %self.config.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                finish_reason = response.finish_reason.as_deref().unwrap_or("-"),
                "openai completion"
            );
        }
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_construction() {
        let config = LlmConfig {
            api_base: "https://api.example.com/".to_string(),
            ..LlmConfig::for_provider(Provider::OpenAi)
        };
        let client = OpenAiClient::new(config);
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");

        // Default base already carries the version segment
        let client2 = OpenAiClient::new(LlmConfig::for_provider(Provider::OpenAi));
        assert_eq!(client2.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_versioned_base_is_not_doubled() {
        let config = LlmConfig {
            api_base: "http://localhost:8080/v1/".to_string(),
            ..LlmConfig::for_provider(Provider::OpenAi)
        };
        let client = OpenAiClient::new(config);
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_asks_for_json_object_without_token_cap() {
        let client = OpenAiClient::new(LlmConfig::for_provider(Provider::OpenAi));
        let request = client.request(
            vec![Message::system("schema"), Message::user("Hotel in Berlin")],
            true,
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-5");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hotel in Berlin");
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("max_completion_tokens").is_none());
    }

    #[test]
    fn test_plain_request_has_no_response_format() {
        let client = OpenAiClient::new(LlmConfig::for_provider(Provider::OpenAi));
        let json = serde_json::to_value(client.request(vec![Message::user("hi")], false)).unwrap();
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_api_error_body_parses() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "invalid_request_error"}}"#;
        let parsed: ApiError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Invalid API key");
    }
}
