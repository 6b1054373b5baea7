//! Turning a free-text query into validated parses, one per selected provider.

use crate::error::{ParseEvalError, Result};
use crate::extract::extract_json_object;
use crate::llm::ParseProducer;
use crate::persistence::ProviderParses;
use crate::provider::{Provider, ProviderSelection};
use crate::schema::ParsedQuery;
use std::time::Instant;
use tracing::{error, info};

/// Result of one parse request.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// Successful parses keyed by provider.
    pub response: ProviderParses,
    /// Wall time of the whole request in milliseconds.
    pub latency_ms: i64,
}

/// Ask one producer for a parse and check it against the schema.
pub async fn parse_with(
    producer: &dyn ParseProducer,
    system_prompt: &str,
    query: &str,
) -> Result<ParsedQuery> {
    let provider = producer.provider();
    let start = Instant::now();

    match produce(producer, system_prompt, query).await {
        Ok(parse) => {
            info!(
                provider = %provider,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "parse succeeded"
            );
            Ok(parse)
        }
        Err(e) => {
            error!(provider = %provider, error = %e, "parse failed");
            Err(e)
        }
    }
}

async fn produce(
    producer: &dyn ParseProducer,
    system_prompt: &str,
    query: &str,
) -> Result<ParsedQuery> {
    let raw = producer.complete_json(system_prompt, query).await?;
    let json = extract_json_object(&raw)?;
    let parse = ParsedQuery::from_json_strict(json)?;
    parse.validate()?;
    Ok(parse)
}

/// Run the selected providers for `query`.
///
/// A single provider's failure is returned as is. With both selected the
/// calls run concurrently, a provider without a client counts as failed,
/// and the request only fails when neither produced a parse.
pub async fn run_parse(
    producers: &[Box<dyn ParseProducer>],
    selection: ProviderSelection,
    system_prompt: &str,
    query: &str,
) -> Result<ParseOutcome> {
    if query.trim().is_empty() {
        return Err(ParseEvalError::InvalidQuery("query is empty".to_string()));
    }

    let start = Instant::now();
    let mut response = ProviderParses::new();

    match selection.providers() {
        [provider] => {
            let parse = parse_for(producers, *provider, system_prompt, query).await?;
            response.insert(*provider, parse);
        }
        [first, second] => {
            let (a, b) = tokio::join!(
                parse_for(producers, *first, system_prompt, query),
                parse_for(producers, *second, system_prompt, query)
            );

            let mut failures = Vec::new();
            for (provider, result) in [(*first, a), (*second, b)] {
                match result {
                    Ok(parse) => {
                        response.insert(provider, parse);
                    }
                    Err(e) => failures.push(format!("{}: {}", provider, e)),
                }
            }

            if response.is_empty() {
                return Err(ParseEvalError::AllProvidersFailed(failures.join("; ")));
            }
        }
        _ => {
            return Err(ParseEvalError::Config(
                "provider selection is empty".to_string(),
            ));
        }
    }

    Ok(ParseOutcome {
        response,
        latency_ms: start.elapsed().as_millis() as i64,
    })
}

/// Parse with the producer for `provider`, if one was built.
async fn parse_for(
    producers: &[Box<dyn ParseProducer>],
    provider: Provider,
    system_prompt: &str,
    query: &str,
) -> Result<ParsedQuery> {
    match producers.iter().find(|p| p.provider() == provider) {
        Some(producer) => parse_with(producer.as_ref(), system_prompt, query).await,
        None => {
            error!(provider = %provider, "no client configured");
            Err(ParseEvalError::Config(format!(
                "no client configured for {}",
                provider
            )))
        }
    }
}
