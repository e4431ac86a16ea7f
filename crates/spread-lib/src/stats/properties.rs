//! Property-based tests for distribution statistics

use super::DistributionStatistics;
use proptest::prelude::*;

proptest! {
    #[test]
    fn compute_is_permutation_invariant(
        (counts, shuffled) in prop::collection::vec(0u32..500, 0..40)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let a = DistributionStatistics::compute("w", counts);
        let b = DistributionStatistics::compute("w", shuffled);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn mean_lies_between_min_and_max(counts in prop::collection::vec(0u32..1000, 1..50)) {
        let stats = DistributionStatistics::compute("w", counts);
        prop_assert!(f64::from(stats.min_count()) <= stats.mean());
        prop_assert!(stats.mean() <= f64::from(stats.max_count()));
        prop_assert!(stats.median() >= 0.0);
    }

    #[test]
    fn every_statistic_is_finite(counts in prop::collection::vec(0u32..10_000, 0..60)) {
        let stats = DistributionStatistics::compute("w", counts);
        for value in [
            stats.skew_ratio(),
            stats.mean(),
            stats.median(),
            stats.coefficient_of_variation(),
            stats.gini_coefficient(),
            stats.jain_fairness_index(),
        ] {
            prop_assert!(value.is_finite(), "non-finite statistic in {:?}", stats);
        }
    }

    #[test]
    fn fairness_measures_are_bounded(counts in prop::collection::vec(0u32..1000, 1..40)) {
        let n = counts.len() as f64;
        let stats = DistributionStatistics::compute("w", counts);

        prop_assert!(stats.gini_coefficient() >= -1e-12);
        prop_assert!(stats.gini_coefficient() <= 1.0);
        prop_assert!(stats.skew_ratio() >= 0.0 && stats.skew_ratio() <= 1.0);
        if stats.total_replicas() > 0 {
            prop_assert!(stats.jain_fairness_index() >= 1.0 / n - 1e-12);
            prop_assert!(stats.jain_fairness_index() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn equal_counts_are_perfectly_fair(value in 1u32..1000, len in 1usize..30) {
        let stats = DistributionStatistics::compute("w", vec![value; len]);
        prop_assert_eq!(stats.gini_coefficient(), 0.0);
        prop_assert_eq!(stats.jain_fairness_index(), 1.0);
        prop_assert_eq!(stats.coefficient_of_variation(), 0.0);
        prop_assert_eq!(stats.skew(), 0);
    }

    #[test]
    fn single_loaded_node_has_jain_one_over_n(value in 1u32..1000, zeros in 0usize..30) {
        let mut counts = vec![0; zeros];
        counts.push(value);
        let n = counts.len() as f64;
        let stats = DistributionStatistics::compute("w", counts);
        prop_assert!((stats.jain_fairness_index() - 1.0 / n).abs() < 1e-12);
    }
}
