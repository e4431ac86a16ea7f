//! Before/after comparison of two measurement passes
//!
//! Answers two questions: did the eligible node count change, and how evenly
//! were the selected workloads spread afterwards. Aggregates are reported as
//! both mean and median because a single badly placed workload moves the
//! mean but not the median.

use crate::error::AnalysisError;
use crate::measurement::MeasurementSet;
use crate::models::ClusterSnapshot;
use crate::stats::summary::{self, round_to};
use crate::stats::DistributionStatistics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default name marker for test workloads
pub const DEFAULT_TEST_MARKER: &str = "test-";

/// How the eligible node count moved between two passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleDirection {
    Up,
    Down,
    #[serde(rename = "none")]
    Unchanged,
    /// No prior measurement to compare against
    Unknown,
}

impl ScaleDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleDirection::Up => "up",
            ScaleDirection::Down => "down",
            ScaleDirection::Unchanged => "none",
            ScaleDirection::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ScaleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change in eligible nodes. `amount` and `percentage` are absent, never
/// zero, when there was nothing to compare against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleChange {
    pub direction: ScaleDirection,
    pub amount: Option<i64>,
    pub percentage: Option<f64>,
}

impl ScaleChange {
    pub fn unknown() -> Self {
        Self {
            direction: ScaleDirection::Unknown,
            amount: None,
            percentage: None,
        }
    }

    /// Compare eligible node counts; the percentage is relative to the
    /// total node count before the change.
    pub fn between(before: &ClusterSnapshot, after: &ClusterSnapshot) -> Self {
        let amount =
            i64::from(after.eligible_node_count()) - i64::from(before.eligible_node_count());
        let direction = match amount {
            a if a > 0 => ScaleDirection::Up,
            a if a < 0 => ScaleDirection::Down,
            _ => ScaleDirection::Unchanged,
        };
        let percentage = match before.total_node_count() {
            0 => None,
            total => Some(amount.unsigned_abs() as f64 / f64::from(total) * 100.0),
        };

        Self {
            direction,
            amount: Some(amount),
            percentage,
        }
    }

    pub fn is_known(&self) -> bool {
        self.direction != ScaleDirection::Unknown
    }
}

/// Which measured workloads take part in the aggregates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadSelector {
    All,
    /// Workloads whose name contains the marker; the rest are ballast
    NameContains(String),
}

impl WorkloadSelector {
    /// Selector for a configured marker; an empty marker selects everything
    pub fn from_marker(marker: &str) -> Self {
        if marker.is_empty() {
            WorkloadSelector::All
        } else {
            WorkloadSelector::NameContains(marker.to_string())
        }
    }

    pub fn matches(&self, workload: &str) -> bool {
        match self {
            WorkloadSelector::All => true,
            WorkloadSelector::NameContains(marker) => workload.contains(marker.as_str()),
        }
    }
}

impl Default for WorkloadSelector {
    fn default() -> Self {
        WorkloadSelector::NameContains(DEFAULT_TEST_MARKER.to_string())
    }
}

/// How differing workload sets before and after are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComparisonMode {
    /// Aggregate whatever is present after the action
    #[default]
    Lenient,
    /// Fail when the selected workloads differ between the two passes
    Strict,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub selector: WorkloadSelector,
    pub comparison: ComparisonMode,
}

/// Central tendency and range of one metric across workloads
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    fn of(values: &[f64]) -> Self {
        Self {
            mean: summary::mean(values),
            median: summary::median(values),
            min: summary::min(values),
            max: summary::max(values),
        }
    }
}

/// Result of comparing two measurement passes
#[derive(Debug, Clone, PartialEq)]
pub struct ComparativeAnalysis {
    scale: ScaleChange,
    workloads_analyzed: usize,
    jain_fairness_index: MetricSummary,
    coefficient_of_variation: MetricSummary,
    gini_coefficient: MetricSummary,
    skew: MetricSummary,
    skew_ratio: MetricSummary,
    nodes_used: MetricSummary,
}

impl ComparativeAnalysis {
    /// Compare `after` with an optional earlier pass.
    ///
    /// An empty selection is not an error: every aggregate is zero.
    pub fn compute(
        before: Option<&MeasurementSet>,
        after: &MeasurementSet,
        options: &AnalysisOptions,
    ) -> Result<Self, AnalysisError> {
        let scale = match before {
            Some(before) => ScaleChange::between(before.cluster(), after.cluster()),
            None => ScaleChange::unknown(),
        };

        if let (Some(before), ComparisonMode::Strict) = (before, options.comparison) {
            check_same_workloads(before, after, &options.selector)?;
        }

        let selected: Vec<&DistributionStatistics> = after
            .deployments()
            .values()
            .filter(|stats| options.selector.matches(stats.name()))
            .collect();

        let summarize = |metric: fn(&DistributionStatistics) -> f64| {
            let values: Vec<f64> = selected.iter().map(|stats| metric(stats)).collect();
            MetricSummary::of(&values)
        };

        Ok(Self {
            scale,
            workloads_analyzed: selected.len(),
            jain_fairness_index: summarize(|s| s.jain_fairness_index()),
            coefficient_of_variation: summarize(|s| s.coefficient_of_variation()),
            gini_coefficient: summarize(|s| s.gini_coefficient()),
            skew: summarize(|s| f64::from(s.skew())),
            skew_ratio: summarize(|s| s.skew_ratio()),
            nodes_used: summarize(|s| s.nodes_used() as f64),
        })
    }

    pub fn scale(&self) -> &ScaleChange {
        &self.scale
    }

    pub fn workloads_analyzed(&self) -> usize {
        self.workloads_analyzed
    }

    pub fn jain_fairness_index(&self) -> &MetricSummary {
        &self.jain_fairness_index
    }

    pub fn coefficient_of_variation(&self) -> &MetricSummary {
        &self.coefficient_of_variation
    }

    pub fn gini_coefficient(&self) -> &MetricSummary {
        &self.gini_coefficient
    }

    pub fn skew(&self) -> &MetricSummary {
        &self.skew
    }

    pub fn skew_ratio(&self) -> &MetricSummary {
        &self.skew_ratio
    }

    pub fn nodes_used(&self) -> &MetricSummary {
        &self.nodes_used
    }

    pub fn to_record(&self) -> AnalysisRecord {
        AnalysisRecord::from(self)
    }
}

fn check_same_workloads(
    before: &MeasurementSet,
    after: &MeasurementSet,
    selector: &WorkloadSelector,
) -> Result<(), AnalysisError> {
    let names = |set: &MeasurementSet| -> BTreeSet<String> {
        set.deployments()
            .keys()
            .filter(|name| selector.matches(name))
            .cloned()
            .collect()
    };
    let before_names = names(before);
    let after_names = names(after);

    if before_names == after_names {
        return Ok(());
    }
    Err(AnalysisError::WorkloadSetMismatch {
        missing: before_names.difference(&after_names).cloned().collect(),
        added: after_names.difference(&before_names).cloned().collect(),
    })
}

/// Flat serialized form of a [`ComparativeAnalysis`].
///
/// Ratios are rounded to 3 decimals and the scale percentage to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub scale_direction: Option<ScaleDirection>,
    pub scale_amount: Option<i64>,
    pub scale_percentage: Option<f64>,
    pub workloads_analyzed: usize,
    pub jain_fairness_index_mean: f64,
    pub jain_fairness_index_median: f64,
    pub coefficient_of_variation_mean: f64,
    pub coefficient_of_variation_median: f64,
    pub gini_coefficient_mean: f64,
    pub gini_coefficient_median: f64,
    pub node_skew_mean: f64,
    pub node_skew_median: f64,
    pub node_skew_max: f64,
    pub node_skew_ratio_mean: f64,
    pub node_skew_ratio_median: f64,
    pub node_skew_ratio_max: f64,
    pub nodes_used_mean: f64,
    pub nodes_used_median: f64,
    pub nodes_used_min: f64,
    pub nodes_used_max: f64,
}

impl From<&ComparativeAnalysis> for AnalysisRecord {
    fn from(analysis: &ComparativeAnalysis) -> Self {
        let r = |v: f64| round_to(v, 3);
        let scale = analysis.scale;

        Self {
            scale_direction: scale.is_known().then_some(scale.direction),
            scale_amount: scale.amount,
            scale_percentage: scale.percentage.map(|p| round_to(p, 1)),
            workloads_analyzed: analysis.workloads_analyzed,
            jain_fairness_index_mean: r(analysis.jain_fairness_index.mean),
            jain_fairness_index_median: r(analysis.jain_fairness_index.median),
            coefficient_of_variation_mean: r(analysis.coefficient_of_variation.mean),
            coefficient_of_variation_median: r(analysis.coefficient_of_variation.median),
            gini_coefficient_mean: r(analysis.gini_coefficient.mean),
            gini_coefficient_median: r(analysis.gini_coefficient.median),
            node_skew_mean: r(analysis.skew.mean),
            node_skew_median: r(analysis.skew.median),
            node_skew_max: r(analysis.skew.max),
            node_skew_ratio_mean: r(analysis.skew_ratio.mean),
            node_skew_ratio_median: r(analysis.skew_ratio.median),
            node_skew_ratio_max: r(analysis.skew_ratio.max),
            nodes_used_mean: r(analysis.nodes_used.mean),
            nodes_used_median: r(analysis.nodes_used.median),
            nodes_used_min: r(analysis.nodes_used.min),
            nodes_used_max: r(analysis.nodes_used.max),
        }
    }
}
