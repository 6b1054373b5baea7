//! Query Parse Eval - scoring LLM parses of hotel search queries.
//!
//! Free-text hotel searches ("Familienhotel in Südtirol unter 150€, mind. 4
//! Sterne") are sent to one or more LLM providers, which answer with a
//! structured [`schema::ParsedQuery`]. Every request is appended to a run log,
//! and the log is later scored against a curated ground-truth corpus.
//!
//! # Quick Start
//!
//! ```no_run
//! use query_parse_eval::{
//!     config::Config,
//!     eval::{EvalOptions, build_report},
//!     llm::{load_system_prompt, producers_for},
//!     parser::run_parse,
//!     persistence::RunStore,
//!     provider::ProviderSelection,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let producers = producers_for(&config, ProviderSelection::OpenAi)?;
//!     let prompt = load_system_prompt(&config.prompt)?;
//!
//!     let outcome = run_parse(
//!         &producers,
//!         ProviderSelection::OpenAi,
//!         &prompt,
//!         "Hotel in Berlin für 2 Erwachsene",
//!     )
//!     .await?;
//!
//!     let store = RunStore::from_config(&config.storage);
//!     store.append_run("Hotel in Berlin für 2 Erwachsene", outcome.response, outcome.latency_ms)?;
//!
//!     let report = build_report(
//!         &store.load_runs()?,
//!         &store.load_ground_truth()?,
//!         EvalOptions { per_query: true },
//!     );
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **schema**: the parse shape and its strict decoding
//! - **llm**: provider clients and the system prompt
//! - **parser**: extraction, validation and concurrent provider calls
//! - **persistence**: the run log and ground truth on disk
//! - **eval**: fact sets, scores, aggregation and the report

pub mod config;
pub mod error;
pub mod eval;
pub mod extract;
pub mod llm;
pub mod parser;
pub mod persistence;
pub mod provider;
pub mod schema;

// Re-export commonly used types
pub use config::Config;
pub use error::{ParseEvalError, Result};
pub use eval::{EvalOptions, EvaluationReport, build_report};
pub use llm::ParseProducer;
pub use parser::{ParseOutcome, run_parse};
pub use persistence::{GroundTruthEntry, RunStore, StoredRun};
pub use provider::{Provider, ProviderSelection};
pub use schema::ParsedQuery;
