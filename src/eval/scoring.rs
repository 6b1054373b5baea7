//! Per-query comparison of a prediction against a reference parse.

use super::facts::{FactSet, flatten};
use crate::schema::ParsedQuery;
use serde::{Deserialize, Serialize};

/// Scores for one prediction/reference pair.
///
/// Values are unrounded; rounding happens only when a report is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryScore {
    pub exact_match: bool,
    pub jaccard: f64,
    pub f1: f64,
}

/// Compare two parses by their flattened facts.
pub fn score(prediction: &ParsedQuery, reference: &ParsedQuery) -> QueryScore {
    score_sets(&flatten(prediction), &flatten(reference))
}

/// Compare two already-flattened fact sets.
pub fn score_sets(predicted: &FactSet, reference: &FactSet) -> QueryScore {
    let intersection = predicted.intersection_count(reference);
    let union = predicted.len() + reference.len() - intersection;

    let precision = ratio(intersection, predicted.len());
    let recall = ratio(intersection, reference.len());

    QueryScore {
        exact_match: predicted == reference,
        jaccard: ratio(intersection, union),
        f1: harmonic_mean(precision, recall),
    }
}

/// `num / den`, or 0 when the denominator is 0.
pub fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// F1 of a precision/recall pair; 0 when both are 0.
pub fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Round to two decimals for reporting.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::facts::Slot;

    fn berlin_family() -> ParsedQuery {
        let mut parse = ParsedQuery {
            location: "Berlin".to_string(),
            ..Default::default()
        };
        parse.guests.adults = 2;
        parse.guests.children = 1;
        parse
    }

    #[test]
    fn test_identical_parse_is_perfect() {
        let truth = berlin_family();
        let s = score(&truth.clone(), &truth);
        assert!(s.exact_match);
        assert_eq!(s.f1, 1.0);
        assert_eq!(s.jaccard, 1.0);
    }

    #[test]
    fn test_partial_overlap() {
        let mut reference = FactSet::new();
        reference.insert(Slot::Location, "Berlin");
        reference.insert(Slot::PriceMaxEur, "120");
        let mut predicted = FactSet::new();
        predicted.insert(Slot::Location, "Berlin");
        predicted.insert(Slot::StarsMin, "4");

        let s = score_sets(&predicted, &reference);
        assert!(!s.exact_match);
        assert!((s.f1 - 0.5).abs() < 1e-9);
        assert_eq!(round2(s.jaccard), 0.33);
    }

    #[test]
    fn test_partial_overlap_through_parses() {
        let reference = ParsedQuery {
            location: "Berlin".to_string(),
            price_max_eur: 120.0,
            ..Default::default()
        };
        let prediction = ParsedQuery {
            location: "Berlin".to_string(),
            stars_min: 4,
            ..Default::default()
        };

        // family_friendly=false is shared, so 2 of 4 distinct facts overlap
        let s = score(&prediction, &reference);
        assert!(!s.exact_match);
        assert!((s.f1 - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(round2(s.jaccard), 0.5);
    }

    #[test]
    fn test_two_empty_sets() {
        let s = score_sets(&FactSet::new(), &FactSet::new());
        assert!(s.exact_match);
        assert_eq!(s.f1, 0.0);
        assert_eq!(s.jaccard, 0.0);
    }

    #[test]
    fn test_symmetry() {
        let a = berlin_family();
        let mut b = berlin_family();
        b.ui_filters.meals = vec!["breakfast".into()];
        b.guests.children = 0;

        let ab = score(&a, &b);
        let ba = score(&b, &a);
        assert_eq!(ab.jaccard, ba.jaccard);
        assert_eq!(ab.exact_match, ba.exact_match);
        assert_eq!(ab.f1, ba.f1);
    }

    #[test]
    fn test_empty_prediction_against_facts() {
        let mut reference = FactSet::new();
        reference.insert(Slot::Location, "Wien");

        let s = score_sets(&FactSet::new(), &reference);
        assert!(!s.exact_match);
        assert_eq!(s.f1, 0.0);
        assert_eq!(s.jaccard, 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(1.0 / 3.0), 0.33);
        assert_eq!(round2(0.125), 0.13);
    }
}
