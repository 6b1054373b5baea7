//! Acceptance checks for queries with several valid interpretations.

use super::facts::flatten;
use crate::schema::ParsedQuery;

/// True if the prediction's facts equal those of any acceptable interpretation.
///
/// Similarity does not count here; only an exact fact-set match against one
/// of the interpretations is accepted. An empty list accepts nothing.
pub fn matches_any_acceptable(prediction: &ParsedQuery, acceptable: &[ParsedQuery]) -> bool {
    if acceptable.is_empty() {
        return false;
    }
    let predicted = flatten(prediction);
    acceptable
        .iter()
        .any(|interpretation| flatten(interpretation) == predicted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(price: f64) -> ParsedQuery {
        ParsedQuery {
            location: "Hamburg".to_string(),
            price_max_eur: price,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_list_accepts_nothing() {
        assert!(!matches_any_acceptable(&budget(100.0), &[]));
    }

    #[test]
    fn test_matches_second_interpretation() {
        let acceptable = [budget(80.0), budget(100.0)];
        assert!(matches_any_acceptable(&budget(100.0), &acceptable));
    }

    #[test]
    fn test_near_miss_is_rejected() {
        let acceptable = [budget(80.0), budget(100.0)];
        assert!(!matches_any_acceptable(&budget(90.0), &acceptable));
    }

    #[test]
    fn test_tag_order_does_not_matter() {
        let mut interpretation = budget(0.0);
        interpretation.unsupported_criteria = vec!["günstig".into(), "ruhig".into()];
        let mut prediction = budget(0.0);
        prediction.unsupported_criteria = vec!["ruhig".into(), "günstig".into()];

        assert!(matches_any_acceptable(&prediction, &[interpretation]));
    }
}
