//! LLM integration module.
//!
//! Provides the clients that turn a query into raw parse text, one per
//! provider API, and the system prompt they are given.

mod anthropic;
mod client;
mod prompts;

pub use anthropic::AnthropicClient;
pub use client::{LlmResponse, Message, OpenAiClient, Role, TokenUsage};
pub use prompts::{DEFAULT_SYSTEM_PROMPT, load_system_prompt};

use crate::config::Config;
use crate::error::{ParseEvalError, Result};
use crate::provider::{Provider, ProviderSelection};
use async_trait::async_trait;
use tracing::warn;

/// Anything that answers a query with (hopefully) a JSON parse.
#[async_trait]
pub trait ParseProducer: Send + Sync {
    /// Which provider this producer speaks for.
    fn provider(&self) -> Provider;

    /// Raw model output for `query` under `system_prompt`.
    async fn complete_json(&self, system_prompt: &str, query: &str) -> Result<String>;
}

/// Build the client for one provider after validating its settings.
pub fn producer_for(config: &Config, provider: Provider) -> Result<Box<dyn ParseProducer>> {
    config.validate_provider(provider)?;
    let llm = config.llm(provider).clone();
    Ok(match provider {
        Provider::OpenAi => Box::new(OpenAiClient::new(llm)),
        Provider::Claude => Box::new(AnthropicClient::new(llm)),
    })
}

/// Build the clients for a selection.
///
/// A single provider must be buildable. With both selected, a provider that
/// cannot be built is skipped, and only an empty result is an error.
pub fn producers_for(
    config: &Config,
    selection: ProviderSelection,
) -> Result<Vec<Box<dyn ParseProducer>>> {
    if let [provider] = selection.providers() {
        return Ok(vec![producer_for(config, *provider)?]);
    }

    let mut producers = Vec::new();
    let mut failures = Vec::new();
    for provider in selection.providers() {
        match producer_for(config, *provider) {
            Ok(producer) => producers.push(producer),
            Err(e) => {
                warn!(provider = %provider, error = %e, "skipping provider");
                failures.push(e.to_string());
            }
        }
    }

    if producers.is_empty() {
        return Err(ParseEvalError::Config(failures.join("; ")));
    }
    Ok(producers)
}
