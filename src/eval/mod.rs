//! Evaluation engine for structured query parses.
//!
//! This module provides:
//! - Fact flattening of parses into `slot=value` sets
//! - Per-query exact match, Jaccard and F1 scoring
//! - Per-provider slot aggregation with micro and per-slot metrics
//! - Acceptance checks for ambiguous queries
//! - Report building over a stored run log

pub mod aggregate;
pub mod ambiguity;
pub mod facts;
pub mod report;
pub mod scoring;

pub use aggregate::{ProviderAccumulator, ProviderMetrics, SlotMetrics, SlotStats};
pub use ambiguity::matches_any_acceptable;
pub use facts::{Fact, FactSet, Slot, flatten};
pub use report::{EvalOptions, EvaluationReport, PerQueryComparison, ProviderQueryScore, build_report};
pub use scoring::{QueryScore, score, score_sets};
