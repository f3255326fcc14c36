//! Cross-checking computed phantom results against a reference table.

use serde::{Deserialize, Serialize};

use crate::PhantomResult;

/// Known-good modulus and speed for a labelled phantom, supplied as
/// configuration and never computed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub label: String,
    pub modulus_pa: f64,
    pub speed_mm_s: f64,
}

/// A computed result paired with the reference it fell within tolerance of.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correspondence {
    pub result_label: String,
    pub reference_label: String,
    pub modulus_pa: f64,
    pub speed_mm_s: f64,
}

/// Outcome of matching one computed result. Results that qualify against no
/// reference are reported explicitly instead of being dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched(Correspondence),
    Unmatched { result_label: String },
}

/// Match each result against the reference table.
///
/// References are scanned in table order and the FIRST entry whose modulus
/// and speed both fall strictly within tolerance is accepted; later, possibly
/// nearer, references are not considered. The table order is therefore part
/// of the contract. A reference may be claimed by any number of results; no
/// exclusivity is enforced. Both behaviours are kept from the original
/// analysis and are documented limitations rather than features.
pub fn match_references(
    results: &[PhantomResult],
    references: &[ReferenceEntry],
    modulus_tolerance_pa: f64,
    speed_tolerance_mm_s: f64,
) -> Vec<MatchOutcome> {
    results
        .iter()
        .map(|result| {
            for reference in references {
                let modulus_close =
                    (result.youngs_modulus_pa - reference.modulus_pa).abs() < modulus_tolerance_pa;
                let speed_close =
                    (result.wave_speed_mm_s - reference.speed_mm_s).abs() < speed_tolerance_mm_s;

                if modulus_close && speed_close {
                    return MatchOutcome::Matched(Correspondence {
                        result_label: result.label.clone(),
                        reference_label: reference.label.clone(),
                        modulus_pa: result.youngs_modulus_pa,
                        speed_mm_s: result.wave_speed_mm_s,
                    });
                }
            }

            MatchOutcome::Unmatched {
                result_label: result.label.clone(),
            }
        })
        .collect()
}

/// Only the matched records, in result order. This reproduces the original
/// report, which omitted unmatched results entirely.
pub fn correspondences(outcomes: &[MatchOutcome]) -> Vec<Correspondence> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            MatchOutcome::Matched(correspondence) => Some(correspondence.clone()),
            MatchOutcome::Unmatched { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: &str, modulus_pa: f64, speed_mm_s: f64) -> PhantomResult {
        PhantomResult {
            label: label.to_string(),
            wave_speed_mm_s: speed_mm_s,
            youngs_modulus_pa: modulus_pa,
        }
    }

    fn reference(label: &str, modulus_pa: f64, speed_mm_s: f64) -> ReferenceEntry {
        ReferenceEntry {
            label: label.to_string(),
            modulus_pa,
            speed_mm_s,
        }
    }

    #[test]
    fn matches_the_single_qualifying_reference() {
        let results = [result("phantom-1", 100_402.72, 6_098.05)];
        let references = [
            reference("P_A", 100_000.0, 6_000.0),
            reference("P_B", 220_000.0, 9_000.0),
        ];

        let outcomes = match_references(&results, &references, 5_000.0, 200.0);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            MatchOutcome::Matched(correspondence) => {
                assert_eq!(correspondence.reference_label, "P_A");
                assert_eq!(correspondence.result_label, "phantom-1");
                assert_eq!(correspondence.modulus_pa, 100_402.72);
                assert_eq!(correspondence.speed_mm_s, 6_098.05);
            }
            MatchOutcome::Unmatched { .. } => panic!("expected a match"),
        }
    }

    #[test]
    fn no_qualifying_reference_yields_an_unmatched_outcome() {
        let results = [result("phantom-1", 150_000.0, 7_500.0)];
        let references = [reference("P_A", 100_000.0, 6_000.0)];

        let outcomes = match_references(&results, &references, 5_000.0, 200.0);
        assert_eq!(
            outcomes,
            vec![MatchOutcome::Unmatched {
                result_label: "phantom-1".to_string()
            }]
        );
        assert!(correspondences(&outcomes).is_empty());
    }

    #[test]
    fn first_qualifying_reference_wins_over_a_nearer_one() {
        // Both references qualify; the second is the nearer match, but table
        // order decides.
        let results = [result("phantom-1", 100_000.0, 6_000.0)];
        let references = [
            reference("far_but_first", 103_000.0, 6_150.0),
            reference("exact_but_second", 100_000.0, 6_000.0),
        ];

        let outcomes = match_references(&results, &references, 5_000.0, 200.0);
        match &outcomes[0] {
            MatchOutcome::Matched(correspondence) => {
                assert_eq!(correspondence.reference_label, "far_but_first");
            }
            MatchOutcome::Unmatched { .. } => panic!("expected a match"),
        }
    }

    #[test]
    fn tolerances_are_strict_inequalities() {
        let results = [result("phantom-1", 105_000.0, 6_000.0)];
        let references = [reference("P_A", 100_000.0, 6_000.0)];

        // |delta modulus| == tolerance exactly: not a match.
        let outcomes = match_references(&results, &references, 5_000.0, 200.0);
        assert!(matches!(outcomes[0], MatchOutcome::Unmatched { .. }));
    }

    #[test]
    fn one_reference_may_be_claimed_by_many_results() {
        let results = [
            result("phantom-1", 100_100.0, 6_010.0),
            result("phantom-2", 99_900.0, 5_990.0),
        ];
        let references = [reference("P_A", 100_000.0, 6_000.0)];

        let matched = correspondences(&match_references(&results, &references, 5_000.0, 200.0));
        assert_eq!(matched.len(), 2);
        assert!(matched
            .iter()
            .all(|correspondence| correspondence.reference_label == "P_A"));
    }
}
