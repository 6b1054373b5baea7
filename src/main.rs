//! Query Parse Eval CLI
//!
//! Parse hotel search queries with LLM providers and score the stored runs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use query_parse_eval::{
    config::Config,
    eval::{EvalOptions, build_report},
    llm::{AnthropicClient, OpenAiClient, load_system_prompt, producers_for},
    parser::run_parse,
    persistence::RunStore,
    provider::{Provider, ProviderSelection},
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Query Parse Eval - compare LLM parses of hotel search queries
#[derive(Parser)]
#[command(name = "parse-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and append the run to the log
    Parse {
        /// The hotel search query
        query: String,

        /// Provider to call: openai, claude or both
        #[arg(short, long, default_value = "openai")]
        provider: ProviderSelection,
    },

    /// Score the run log against the ground truth
    Eval {
        /// Print the stored run log unchanged
        #[arg(long)]
        raw: bool,

        /// Include one comparison row per run
        #[arg(long)]
        per_query: bool,

        /// Also write the output to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Test provider connections
    Test {
        /// Provider to test; defaults to every provider with an API key
        #[arg(short, long)]
        provider: Option<ProviderSelection>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { query, provider } => cmd_parse(query, provider).await,
        Commands::Eval {
            raw,
            per_query,
            output,
        } => cmd_eval(raw, per_query, output),
        Commands::Test { provider } => cmd_test(provider).await,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_parse(query: String, selection: ProviderSelection) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let producers = producers_for(&config, selection).context("Invalid configuration")?;
    let prompt = load_system_prompt(&config.prompt).context("Failed to load system prompt")?;

    let outcome = run_parse(&producers, selection, &prompt, &query)
        .await
        .context("Parse failed")?;

    let store = RunStore::from_config(&config.storage);
    let run = store
        .append_run(&query, outcome.response, outcome.latency_ms)
        .context("Failed to store run")?;
    info!(
        providers = run.response.len(),
        latency_ms = run.latency_ms,
        path = %store.results_path().display(),
        "run stored"
    );

    println!("{}", serde_json::to_string_pretty(&run.response)?);
    Ok(())
}

fn cmd_eval(raw: bool, per_query: bool, output: Option<PathBuf>) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let store = RunStore::from_config(&config.storage);

    let rendered = if raw {
        store.read_raw_runs().context("Failed to read run log")?
    } else {
        let runs = store.load_runs().context("Failed to load run log")?;
        let ground_truth = store
            .load_ground_truth()
            .context("Failed to load ground truth")?;
        let report = build_report(&runs, &ground_truth, EvalOptions { per_query });
        serde_json::to_string_pretty(&report)?
    };

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        std::fs::write(&path, &rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    println!("{}", rendered);
    Ok(())
}

async fn cmd_test(selection: Option<ProviderSelection>) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let providers: Vec<Provider> = match selection {
        Some(selection) => selection.providers().to_vec(),
        None => Provider::ALL
            .into_iter()
            .filter(|p| !config.llm(*p).api_key.is_empty())
            .collect(),
    };

    if providers.is_empty() {
        anyhow::bail!("No provider has an API key. Set OPENAI_API_KEY or CLAUDE_API_KEY.");
    }

    let mut failed = 0;
    for provider in providers {
        config
            .validate_provider(provider)
            .context("Invalid configuration")?;
        let llm = config.llm(provider).clone();
        println!("Testing {} ({} at {})...", provider, llm.model, llm.api_base);

        let result = match provider {
            Provider::OpenAi => OpenAiClient::new(llm).test_connection().await,
            Provider::Claude => AnthropicClient::new(llm).test_connection().await,
        };

        match result {
            Ok(()) => println!("  {} connection successful", provider),
            Err(e) => {
                println!("  {} connection failed: {}", provider, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} provider connection(s) failed", failed);
    }
    Ok(())
}
