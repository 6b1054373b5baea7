//! Anthropic Messages API client.

use super::ParseProducer;
use crate::config::LlmConfig;
use crate::error::{ParseEvalError, Result};
use crate::provider::Provider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<UserMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for Anthropic's Messages endpoint.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    config: LlmConfig,
}

impl AnthropicClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// The base may be the host, the `/v1` root, or the full messages URL.
    fn endpoint(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.ends_with("/messages") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/messages", base)
        } else {
            format!("{}/v1/messages", base)
        }
    }

    /// Send one user turn and return the text of the first content block.
    pub async fn message(&self, system: Option<&str>, user: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: vec![UserMessage {
                role: "user",
                content: user,
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                return Err(ParseEvalError::LlmApi(format!(
                    "claude ({}): {}",
                    status, api_error.error.message
                )));
            }
            return Err(ParseEvalError::LlmApi(format!(
                "claude request failed ({}): {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| ParseEvalError::LlmApi(format!("claude response: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                model = %self.config.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                stop_reason = parsed.stop_reason.as_deref().unwrap_or("-"),
                "claude completion"
            );
        }

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text.unwrap_or_default())
            .ok_or_else(|| ParseEvalError::LlmApi("claude: no content in response".to_string()))
    }

    /// Test connectivity to the API.
    pub async fn test_connection(&self) -> Result<()> {
        let text = self.message(None, "Say 'hello' and nothing else.").await?;
        if text.to_lowercase().contains("hello") {
            Ok(())
        } else {
            Err(ParseEvalError::LlmApi(format!("Unexpected response: {}", text)))
        }
    }
}

#[async_trait]
impl ParseProducer for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    async fn complete_json(&self, system_prompt: &str, query: &str) -> Result<String> {
        self.message(Some(system_prompt), query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_at(api_base: &str) -> AnthropicClient {
        AnthropicClient::new(LlmConfig {
            api_base: api_base.to_string(),
            ..LlmConfig::for_provider(Provider::Claude)
        })
    }

    #[test]
    fn test_endpoint_construction() {
        let client = AnthropicClient::new(LlmConfig::for_provider(Provider::Claude));
        assert_eq!(client.endpoint(), "https://api.anthropic.com/v1/messages");

        for base in [
            "https://proxy.example.com",
            "https://proxy.example.com/v1/",
            "https://proxy.example.com/v1/messages",
        ] {
            assert_eq!(
                client_at(base).endpoint(),
                "https://proxy.example.com/v1/messages",
                "{}",
                base
            );
        }
    }

    #[test]
    fn test_system_prompt_is_top_level() {
        let request = MessagesRequest {
            model: "claude-sonnet-4-20250514",
            max_tokens: 1000,
            system: Some("schema"),
            messages: vec![UserMessage {
                role: "user",
                content: "Hotel in Wien",
            }],
            temperature: 0.0,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "schema");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn test_response_text_block() {
        let body = r#"{
            "content": [{"type": "text", "text": "{\"location\": \"Wien\"}"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 812, "output_tokens": 40}
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content[0].text.as_deref(), Some("{\"location\": \"Wien\"}"));
        assert_eq!(parsed.usage.unwrap().output_tokens, 40);
    }
}
