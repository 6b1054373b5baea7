//! Running per-provider totals and their finalized metrics.

use super::facts::{FactSet, Slot, flatten};
use super::scoring::{QueryScore, harmonic_mean, ratio, round2};
use crate::schema::ParsedQuery;
use serde::Serialize;
use std::collections::BTreeMap;

/// True-positive, false-positive and false-negative counts for one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlotStats {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

/// Finalized precision/recall for one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

/// Evaluation snapshot for one provider. Ratios are rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderMetrics {
    /// Micro-averaged across all slots.
    pub slot_precision: f64,
    pub slot_recall: f64,
    /// Harmonic mean of the micro precision and recall.
    pub f1: f64,
    /// Mean of the per-query exact-match indicator.
    pub exact_match: f64,
    pub jaccard: f64,
    pub avg_latency_ms: f64,
    /// Queries evaluated against ground truth.
    pub count: usize,
    pub ambiguity_handling_rate: f64,
    pub per_slot: BTreeMap<Slot, SlotMetrics>,
}

/// All running state for one provider during a single evaluation.
#[derive(Debug, Clone, Default)]
pub struct ProviderAccumulator {
    tp: usize,
    fp: usize,
    fn_: usize,

    sum_exact: usize,
    sum_jaccard: f64,
    sum_f1: f64,
    sum_latency_ms: f64,
    n: usize,

    ambiguity_accepted: usize,
    ambiguity_total: usize,

    slots: BTreeMap<Slot, SlotStats>,
}

impl ProviderAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queries folded in so far.
    pub fn query_count(&self) -> usize {
        self.n
    }

    /// Fold one query's scalar scores and latency.
    pub fn add_query(&mut self, score: &QueryScore, latency_ms: i64) {
        if score.exact_match {
            self.sum_exact += 1;
        }
        self.sum_jaccard += score.jaccard;
        self.sum_f1 += score.f1;
        self.sum_latency_ms += latency_ms as f64;
        self.n += 1;
    }

    /// Count fact-level hits and misses per slot.
    pub fn add_slots(&mut self, prediction: &ParsedQuery, reference: &ParsedQuery) {
        self.add_fact_sets(&flatten(prediction), &flatten(reference));
    }

    /// Like [`add_slots`](Self::add_slots) for already-flattened sets.
    pub fn add_fact_sets(&mut self, predicted: &FactSet, reference: &FactSet) {
        for fact in predicted.iter() {
            let stats = self.slots.entry(fact.slot).or_default();
            if reference.contains(fact) {
                stats.tp += 1;
                self.tp += 1;
            } else {
                stats.fp += 1;
                self.fp += 1;
            }
        }
        for fact in reference.iter().filter(|f| !predicted.contains(f)) {
            self.slots.entry(fact.slot).or_default().fn_ += 1;
            self.fn_ += 1;
        }
    }

    /// Record one ambiguous query and whether the prediction was accepted.
    pub fn record_ambiguity(&mut self, accepted: bool) {
        if accepted {
            self.ambiguity_accepted += 1;
        }
        self.ambiguity_total += 1;
    }

    /// Current counters for one slot.
    pub fn slot_stats(&self, slot: Slot) -> SlotStats {
        self.slots.get(&slot).copied().unwrap_or_default()
    }

    /// Turn the running totals into a metrics snapshot.
    pub fn finalize(&self) -> ProviderMetrics {
        let precision = ratio(self.tp, self.tp + self.fp);
        let recall = ratio(self.tp, self.tp + self.fn_);

        let mean = |sum: f64| if self.n > 0 { sum / self.n as f64 } else { 0.0 };

        let per_slot = self
            .slots
            .iter()
            .map(|(slot, stats)| {
                let p = ratio(stats.tp, stats.tp + stats.fp);
                let r = ratio(stats.tp, stats.tp + stats.fn_);
                let metrics = SlotMetrics {
                    precision: round2(p),
                    recall: round2(r),
                    f1: round2(harmonic_mean(p, r)),
                    tp: stats.tp,
                    fp: stats.fp,
                    fn_: stats.fn_,
                };
                (*slot, metrics)
            })
            .collect();

        ProviderMetrics {
            slot_precision: round2(precision),
            slot_recall: round2(recall),
            f1: round2(harmonic_mean(precision, recall)),
            exact_match: round2(mean(self.sum_exact as f64)),
            jaccard: round2(mean(self.sum_jaccard)),
            avg_latency_ms: round2(mean(self.sum_latency_ms)),
            count: self.n,
            ambiguity_handling_rate: round2(ratio(
                self.ambiguity_accepted,
                self.ambiguity_total,
            )),
            per_slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::scoring::score;
    use crate::schema::FilterCategory;

    fn with_meals(location: &str, meals: &[&str]) -> ParsedQuery {
        let mut parse = ParsedQuery {
            location: location.to_string(),
            ..Default::default()
        };
        parse.ui_filters.meals = meals.iter().map(|m| m.to_string()).collect();
        parse
    }

    #[test]
    fn test_fact_level_counting() {
        let mut acc = ProviderAccumulator::new();
        let prediction = with_meals("Berlin", &["breakfast", "dinner"]);
        let reference = with_meals("Berlin", &["breakfast", "half_board", "all_inclusive"]);
        acc.add_slots(&prediction, &reference);

        let meals = acc.slot_stats(Slot::Ui(FilterCategory::Meals));
        assert_eq!(meals, SlotStats { tp: 1, fp: 1, fn_: 2 });

        let location = acc.slot_stats(Slot::Location);
        assert_eq!(location, SlotStats { tp: 1, fp: 0, fn_: 0 });

        let metrics = acc.finalize();
        let meal_metrics = &metrics.per_slot[&Slot::Ui(FilterCategory::Meals)];
        assert_eq!(meal_metrics.precision, 0.5);
        assert_eq!(meal_metrics.recall, 0.33);
        assert_eq!(meal_metrics.f1, 0.4);

        // micro: tp = location + family_friendly + breakfast, fp = dinner, fn = 2 meals
        assert_eq!(metrics.slot_precision, 0.75);
        assert_eq!(metrics.slot_recall, 0.6);
    }

    #[test]
    fn test_slot_totals_are_additive() {
        let q1 = (with_meals("Paris", &["breakfast"]), with_meals("Paris", &["dinner"]));
        let q2 = (with_meals("Rom", &[]), with_meals("Roma", &["breakfast"]));

        let mut combined = ProviderAccumulator::new();
        combined.add_slots(&q1.0, &q1.1);
        combined.add_slots(&q2.0, &q2.1);

        let mut first = ProviderAccumulator::new();
        first.add_slots(&q1.0, &q1.1);
        let mut second = ProviderAccumulator::new();
        second.add_slots(&q2.0, &q2.1);

        for slot in [
            Slot::Location,
            Slot::FamilyFriendly,
            Slot::Ui(FilterCategory::Meals),
        ] {
            let a = first.slot_stats(slot);
            let b = second.slot_stats(slot);
            assert_eq!(
                combined.slot_stats(slot),
                SlotStats {
                    tp: a.tp + b.tp,
                    fp: a.fp + b.fp,
                    fn_: a.fn_ + b.fn_,
                }
            );
        }
    }

    #[test]
    fn test_query_means_and_latency() {
        let mut acc = ProviderAccumulator::new();
        let truth = with_meals("Berlin", &["breakfast"]);
        acc.add_query(&score(&truth, &truth), 1000);
        acc.add_query(&score(&with_meals("Bonn", &[]), &truth), 2001);

        let metrics = acc.finalize();
        assert_eq!(metrics.count, 2);
        assert_eq!(metrics.exact_match, 0.5);
        assert_eq!(metrics.avg_latency_ms, 1500.5);
        // second query: 1 shared fact (family_friendly) of 4 distinct
        assert_eq!(metrics.jaccard, 0.63);
    }

    #[test]
    fn test_ambiguity_rate() {
        let mut acc = ProviderAccumulator::new();
        acc.record_ambiguity(true);
        acc.record_ambiguity(true);
        acc.record_ambiguity(false);
        assert_eq!(acc.finalize().ambiguity_handling_rate, 0.67);
    }

    #[test]
    fn test_empty_accumulator_reports_zeros() {
        let metrics = ProviderAccumulator::new().finalize();
        assert_eq!(metrics.count, 0);
        assert_eq!(metrics.slot_precision, 0.0);
        assert_eq!(metrics.f1, 0.0);
        assert_eq!(metrics.avg_latency_ms, 0.0);
        assert_eq!(metrics.ambiguity_handling_rate, 0.0);
        assert!(metrics.per_slot.is_empty());
    }

    #[test]
    fn test_metrics_json_shape() {
        let mut acc = ProviderAccumulator::new();
        acc.add_slots(&with_meals("Berlin", &[]), &with_meals("Berlin", &[]));
        let json = serde_json::to_value(acc.finalize()).unwrap();

        let slot = &json["per_slot"]["location"];
        assert_eq!(slot["tp"], 1);
        assert_eq!(slot["fn"], 0);
        assert!(json.get("ambiguity_handling_rate").is_some());
    }
}
