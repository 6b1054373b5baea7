//! Building an evaluation snapshot from the run log and ground truth.

use super::aggregate::{ProviderAccumulator, ProviderMetrics};
use super::ambiguity::matches_any_acceptable;
use super::facts::flatten;
use super::scoring::{QueryScore, round2, score_sets};
use crate::persistence::{GroundTruthEntry, StoredRun};
use crate::provider::Provider;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Options for one evaluation request.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalOptions {
    /// Include one comparison row per evaluated run.
    pub per_query: bool,
}

/// One provider's rounded scores for a single run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderQueryScore {
    pub exact_match: bool,
    pub jaccard: f64,
    pub f1: f64,
    pub latency_ms: i64,
}

impl ProviderQueryScore {
    fn new(score: &QueryScore, latency_ms: i64) -> Self {
        Self {
            exact_match: score.exact_match,
            jaccard: round2(score.jaccard),
            f1: round2(score.f1),
            latency_ms,
        }
    }
}

/// Side-by-side provider scores for one `(query, time)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerQueryComparison {
    pub query: String,
    #[serde(flatten)]
    pub scores: BTreeMap<Provider, ProviderQueryScore>,
    pub ambiguous: bool,
    /// Some provider matched an acceptable interpretation.
    pub accepted: bool,
    pub time: DateTime<Utc>,
}

/// The result of one evaluation request.
///
/// A provider with no evaluated queries has no entry at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    #[serde(flatten)]
    pub providers: BTreeMap<Provider, ProviderMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_query: Option<Vec<PerQueryComparison>>,
}

impl EvaluationReport {
    pub fn metrics(&self, provider: Provider) -> Option<&ProviderMetrics> {
        self.providers.get(&provider)
    }
}

/// Rows keyed by query text and run timestamp.
#[derive(Default)]
struct PerQueryRows {
    rows: Vec<PerQueryComparison>,
    index: HashMap<(String, DateTime<Utc>), usize>,
}

impl PerQueryRows {
    fn row_for(&mut self, run: &StoredRun, ambiguous: bool) -> &mut PerQueryComparison {
        let key = (run.query.clone(), run.time);
        let idx = *self.index.entry(key).or_insert_with(|| {
            self.rows.push(PerQueryComparison {
                query: run.query.clone(),
                scores: BTreeMap::new(),
                ambiguous,
                accepted: false,
                time: run.time,
            });
            self.rows.len() - 1
        });
        &mut self.rows[idx]
    }

    fn into_sorted(mut self) -> Vec<PerQueryComparison> {
        self.rows.sort_by_key(|row| row.time);
        self.rows
    }
}

/// Score every run that has ground truth and aggregate per provider.
///
/// Runs whose query has no ground-truth entry are skipped. When the corpus
/// holds the same query twice, the later entry wins.
pub fn build_report(
    runs: &[StoredRun],
    ground_truth: &[GroundTruthEntry],
    options: EvalOptions,
) -> EvaluationReport {
    let truth_by_query: HashMap<&str, &GroundTruthEntry> = ground_truth
        .iter()
        .map(|entry| (entry.query.as_str(), entry))
        .collect();

    let mut accumulators: BTreeMap<Provider, ProviderAccumulator> = BTreeMap::new();
    let mut rows = PerQueryRows::default();
    let mut skipped = 0usize;

    for run in runs {
        let Some(entry) = truth_by_query.get(run.query.as_str()) else {
            debug!(query = %run.query, "no ground truth for run, skipping");
            skipped += 1;
            continue;
        };
        let reference = flatten(&entry.truth);

        for (provider, parse) in &run.response {
            let predicted = flatten(parse);
            let score = score_sets(&predicted, &reference);

            let acc = accumulators.entry(*provider).or_default();
            acc.add_query(&score, run.latency_ms);
            acc.add_fact_sets(&predicted, &reference);

            let accepted = entry.ambiguous
                && matches_any_acceptable(parse, &entry.acceptable_interpretations);
            if entry.ambiguous {
                acc.record_ambiguity(accepted);
            }

            if options.per_query {
                let row = rows.row_for(run, entry.ambiguous);
                row.scores
                    .insert(*provider, ProviderQueryScore::new(&score, run.latency_ms));
                row.accepted |= accepted;
            }
        }
    }

    let providers: BTreeMap<Provider, ProviderMetrics> = accumulators
        .into_iter()
        .filter(|(_, acc)| acc.query_count() > 0)
        .map(|(provider, acc)| (provider, acc.finalize()))
        .collect();

    info!(
        runs = runs.len(),
        skipped,
        providers = providers.len(),
        "built evaluation report"
    );

    EvaluationReport {
        providers,
        per_query: options.per_query.then(|| rows.into_sorted()),
    }
}
