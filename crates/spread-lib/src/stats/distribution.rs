//! Per-workload replica distribution statistics
//!
//! Reduces "how many replicas landed on each node" to fairness and dispersion
//! metrics that are comparable across workloads of different sizes:
//!
//! | Metric                   | Even spread | One node holds everything |
//! |--------------------------|-------------|---------------------------|
//! | skew ratio               | 0           | 1                         |
//! | coefficient of variation | 0           | grows with node count     |
//! | Gini coefficient         | 0           | (n - 1) / n               |
//! | Jain's fairness index    | 1           | 1 / n                     |

use super::summary::{median_of_sorted, round_to, sample_std_dev};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places kept when a distribution is serialized
const SERIALIZED_DECIMALS: u32 = 3;

/// Whether eligible nodes that received no replicas are counted as zeros
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnusedNodePolicy {
    /// Only nodes hosting at least one replica are counted
    #[default]
    Exclude,
    /// Unused eligible nodes are appended as zero counts
    Include,
}

impl UnusedNodePolicy {
    /// Pad `counts` with zeros for the eligible nodes it does not cover.
    ///
    /// Padding needs at least one unused node and at least one node holding
    /// more than one replica. A layout with one replica per node is already
    /// maximally spread and is returned untouched.
    pub fn apply(self, mut counts: Vec<u32>, eligible_nodes: u32) -> Vec<u32> {
        let unused = (eligible_nodes as usize).saturating_sub(counts.len());
        let stacked = counts.iter().any(|&c| c > 1);

        if self == Self::Include && unused > 0 && stacked {
            counts.resize(counts.len() + unused, 0);
        }
        counts
    }
}

/// Fairness metrics for one workload at one point in time
///
/// Built once by [`DistributionStatistics::compute`] and never mutated.
/// Per-node counts are kept sorted ascending, so the value is identical for
/// every ordering of the same input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "DistributionRecord", from = "DistributionRecord")]
pub struct DistributionStatistics {
    name: String,
    per_node_counts: Vec<u32>,
    total_replicas: u64,
    max_count: u32,
    min_count: u32,
    mean: f64,
    median: f64,
    coefficient_of_variation: f64,
    gini_coefficient: f64,
    jain_fairness_index: f64,
}

impl DistributionStatistics {
    /// Compute every statistic from per-node replica counts.
    ///
    /// Total over its input: an empty sequence yields all-zero statistics.
    pub fn compute(name: impl Into<String>, counts: impl IntoIterator<Item = u32>) -> Self {
        let mut counts: Vec<u32> = counts.into_iter().collect();
        counts.sort_unstable();

        let total_replicas: u64 = counts.iter().map(|&c| u64::from(c)).sum();
        let values: Vec<f64> = counts.iter().map(|&c| f64::from(c)).collect();
        let mean = if counts.is_empty() {
            0.0
        } else {
            total_replicas as f64 / counts.len() as f64
        };

        Self {
            name: name.into(),
            total_replicas,
            max_count: counts.last().copied().unwrap_or(0),
            min_count: counts.first().copied().unwrap_or(0),
            mean,
            median: median_of_sorted(&values),
            coefficient_of_variation: coefficient_of_variation(&values, mean),
            gini_coefficient: gini_coefficient(&counts),
            jain_fairness_index: jain_fairness_index(&counts),
            per_node_counts: counts,
        }
    }

    /// Workload name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replicas per node, ascending
    pub fn per_node_counts(&self) -> &[u32] {
        &self.per_node_counts
    }

    pub fn total_replicas(&self) -> u64 {
        self.total_replicas
    }

    /// Number of counted nodes (including zero padding, if any)
    pub fn nodes_used(&self) -> usize {
        self.per_node_counts.len()
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn min_count(&self) -> u32 {
        self.min_count
    }

    /// Busiest node minus least busy node
    pub fn skew(&self) -> u32 {
        self.max_count - self.min_count
    }

    /// Skew relative to the busiest node, `0.0` when no replicas were counted
    pub fn skew_ratio(&self) -> f64 {
        if self.max_count == 0 {
            return 0.0;
        }
        f64::from(self.skew()) / f64::from(self.max_count)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn median(&self) -> f64 {
        self.median
    }

    /// Sample standard deviation over mean.
    ///
    /// Below 0.1 is very low variation, above 0.5 is high.
    pub fn coefficient_of_variation(&self) -> f64 {
        self.coefficient_of_variation
    }

    /// 0.0-0.2 very balanced, 0.6+ highly unbalanced
    pub fn gini_coefficient(&self) -> f64 {
        self.gini_coefficient
    }

    /// 0.9-1.0 excellent fairness, below 0.7 poor
    pub fn jain_fairness_index(&self) -> f64 {
        self.jain_fairness_index
    }
}

impl fmt::Display for DistributionStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} replicas across {} nodes (skew {}, cv {:.3}, gini {:.3}, jain {:.3})",
            self.name,
            self.total_replicas,
            self.nodes_used(),
            self.skew(),
            self.coefficient_of_variation,
            self.gini_coefficient,
            self.jain_fairness_index
        )
    }
}

fn coefficient_of_variation(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 || mean <= 0.0 {
        return 0.0;
    }
    sample_std_dev(values, mean) / mean
}

/// Gini coefficient of an ascending slice.
///
/// Uses the rank form `Σ(2i - n - 1)·xᵢ / (n·Σx)`, which equals
/// `2·Σ(i·xᵢ) / (n·Σx) - (n + 1) / n`. The numerator is accumulated in
/// integers so equal counts give exactly zero.
fn gini_coefficient(sorted: &[u32]) -> f64 {
    let n = sorted.len() as i128;
    let sum: i128 = sorted.iter().map(|&c| i128::from(c)).sum();
    if n == 0 || sum == 0 {
        return 0.0;
    }

    let weighted: i128 = sorted
        .iter()
        .enumerate()
        .map(|(i, &c)| (2 * (i as i128 + 1) - n - 1) * i128::from(c))
        .sum();

    weighted as f64 / (n * sum) as f64
}

/// Jain's fairness index `(Σx)² / (n·Σx²)`
fn jain_fairness_index(counts: &[u32]) -> f64 {
    let n = counts.len() as u128;
    let sum: u128 = counts.iter().map(|&c| u128::from(c)).sum();
    if n == 0 || sum == 0 {
        return 0.0;
    }

    let sum_squares: u128 = counts.iter().map(|&c| u128::from(c).pow(2)).sum();
    (sum * sum) as f64 / (n * sum_squares) as f64
}

/// Serialized form of a distribution.
///
/// Derived values are rounded on the way out and ignored on the way in:
/// reading a record recomputes everything from `name` and `pod_counts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DistributionRecord {
    name: String,
    pod_counts: Vec<u32>,
    #[serde(default)]
    total_pods: u64,
    #[serde(default)]
    nodes_used: usize,
    #[serde(default)]
    max_pods: u32,
    #[serde(default)]
    min_pods: u32,
    #[serde(default)]
    node_skew: u32,
    #[serde(default)]
    node_skew_ratio: f64,
    #[serde(default)]
    mean_pods: f64,
    #[serde(default)]
    median_pods: f64,
    #[serde(default)]
    coefficient_of_variation: f64,
    #[serde(default)]
    gini_coefficient: f64,
    #[serde(default)]
    jain_fairness_index: f64,
}

impl From<DistributionStatistics> for DistributionRecord {
    fn from(stats: DistributionStatistics) -> Self {
        let round = |v: f64| round_to(v, SERIALIZED_DECIMALS);
        Self {
            total_pods: stats.total_replicas,
            nodes_used: stats.nodes_used(),
            max_pods: stats.max_count,
            min_pods: stats.min_count,
            node_skew: stats.skew(),
            node_skew_ratio: round(stats.skew_ratio()),
            mean_pods: round(stats.mean),
            median_pods: round(stats.median),
            coefficient_of_variation: round(stats.coefficient_of_variation),
            gini_coefficient: round(stats.gini_coefficient),
            jain_fairness_index: round(stats.jain_fairness_index),
            name: stats.name,
            pod_counts: stats.per_node_counts,
        }
    }
}

impl From<DistributionRecord> for DistributionStatistics {
    fn from(record: DistributionRecord) -> Self {
        DistributionStatistics::compute(record.name, record.pod_counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let stats = DistributionStatistics::compute("empty", []);

        assert_eq!(stats.total_replicas(), 0);
        assert_eq!(stats.nodes_used(), 0);
        assert_eq!(stats.max_count(), 0);
        assert_eq!(stats.min_count(), 0);
        assert_eq!(stats.skew(), 0);
        assert_eq!(stats.skew_ratio(), 0.0);
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.median(), 0.0);
        assert_eq!(stats.coefficient_of_variation(), 0.0);
        assert_eq!(stats.gini_coefficient(), 0.0);
        assert_eq!(stats.jain_fairness_index(), 0.0);
    }

    #[test]
    fn test_single_node() {
        let stats = DistributionStatistics::compute("single", [7]);

        assert_eq!(stats.skew(), 0);
        assert_eq!(stats.coefficient_of_variation(), 0.0);
        assert_eq!(stats.gini_coefficient(), 0.0);
        assert_eq!(stats.jain_fairness_index(), 1.0);
        assert_eq!(stats.mean(), 7.0);
        assert_eq!(stats.median(), 7.0);
    }

    #[test]
    fn test_even_spread() {
        let stats = DistributionStatistics::compute("even", [10, 10, 10, 10, 10]);

        assert_eq!(stats.total_replicas(), 50);
        assert_eq!(stats.nodes_used(), 5);
        assert_eq!(stats.skew(), 0);
        assert_eq!(stats.skew_ratio(), 0.0);
        assert_eq!(stats.gini_coefficient(), 0.0);
        assert_eq!(stats.jain_fairness_index(), 1.0);
        assert_eq!(stats.coefficient_of_variation(), 0.0);
    }

    #[test]
    fn test_maximally_skewed() {
        let stats = DistributionStatistics::compute("skewed", [50, 0, 0, 0, 0]);

        assert_eq!(stats.skew(), 50);
        assert_eq!(stats.skew_ratio(), 1.0);
        assert_close(stats.gini_coefficient(), 0.8);
        assert_close(stats.jain_fairness_index(), 0.2);
        assert_eq!(stats.median(), 0.0);
        assert_eq!(stats.mean(), 10.0);
    }

    #[test]
    fn test_maximally_skewed_follows_node_count() {
        for n in 2..12u32 {
            let mut counts = vec![0; n as usize];
            counts[0] = 33;
            let stats = DistributionStatistics::compute("skewed", counts);
            assert_close(stats.gini_coefficient(), f64::from(n - 1) / f64::from(n));
            assert_close(stats.jain_fairness_index(), 1.0 / f64::from(n));
        }
    }

    #[test]
    fn test_all_zero_counts_stay_finite() {
        let stats = DistributionStatistics::compute("idle", [0, 0, 0]);

        assert_eq!(stats.gini_coefficient(), 0.0);
        assert_eq!(stats.jain_fairness_index(), 0.0);
        assert_eq!(stats.coefficient_of_variation(), 0.0);
        assert_eq!(stats.skew_ratio(), 0.0);
    }

    #[test]
    fn test_mixed_distribution() {
        let stats = DistributionStatistics::compute("mixed", [1, 2, 3, 4]);

        assert_eq!(stats.skew(), 3);
        assert_close(stats.skew_ratio(), 0.75);
        assert_close(stats.mean(), 2.5);
        assert_close(stats.median(), 2.5);
        // Sample variance 5/3
        assert_close(stats.coefficient_of_variation(), (5.0f64 / 3.0).sqrt() / 2.5);
        // 2 * (1 + 4 + 9 + 16) / (4 * 10) - 5/4
        assert_close(stats.gini_coefficient(), 0.25);
        // 100 / (4 * 30)
        assert_close(stats.jain_fairness_index(), 100.0 / 120.0);
    }

    #[test]
    fn test_counts_are_canonicalized() {
        let a = DistributionStatistics::compute("w", [3, 1, 2]);
        let b = DistributionStatistics::compute("w", [2, 3, 1]);

        assert_eq!(a, b);
        assert_eq!(a.per_node_counts(), &[1, 2, 3]);
    }

    #[test]
    fn test_unused_node_policy_excluded_by_default() {
        let counts = UnusedNodePolicy::default().apply(vec![5, 3], 6);
        assert_eq!(counts, vec![5, 3]);
    }

    #[test]
    fn test_unused_node_policy_pads_stacked_layout() {
        let counts = UnusedNodePolicy::Include.apply(vec![5, 3], 5);
        assert_eq!(counts, vec![5, 3, 0, 0, 0]);
    }

    #[test]
    fn test_unused_node_policy_skips_one_per_node_layout() {
        let counts = UnusedNodePolicy::Include.apply(vec![1, 1, 1], 10);
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn test_unused_node_policy_no_unused_nodes() {
        let counts = UnusedNodePolicy::Include.apply(vec![4, 2, 1], 3);
        assert_eq!(counts, vec![4, 2, 1]);

        // More used nodes than eligible ones never underflows
        let counts = UnusedNodePolicy::Include.apply(vec![4, 2, 1], 2);
        assert_eq!(counts, vec![4, 2, 1]);
    }

    #[test]
    fn test_serialization_rounds_derived_values() {
        let stats = DistributionStatistics::compute("thirds", [1, 1, 2]);
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["name"], "thirds");
        assert_eq!(json["pod_counts"], serde_json::json!([1, 1, 2]));
        assert_eq!(json["total_pods"], 4);
        assert_eq!(json["nodes_used"], 3);
        assert_eq!(json["node_skew"], 1);
        assert_eq!(json["node_skew_ratio"], 0.5);
        assert_eq!(json["mean_pods"], 1.333);
        assert_eq!(json["median_pods"], 1.0);
        // 16 / (3 * 6)
        assert_eq!(json["jain_fairness_index"], 0.889);
    }

    #[test]
    fn test_deserialization_recomputes_from_counts() {
        let json = serde_json::json!({
            "name": "restored",
            "pod_counts": [50, 0, 0, 0, 0],
            "gini_coefficient": 0.123,
        });

        let stats: DistributionStatistics = serde_json::from_value(json).unwrap();

        assert_eq!(stats.name(), "restored");
        assert_close(stats.gini_coefficient(), 0.8);
        assert_close(stats.jain_fairness_index(), 0.2);
    }

    #[test]
    fn test_display_summary() {
        let stats = DistributionStatistics::compute("web", [2, 2]);
        assert_eq!(
            stats.to_string(),
            "web: 4 replicas across 2 nodes (skew 0, cv 0.000, gini 0.000, jain 1.000)"
        );
    }
}
