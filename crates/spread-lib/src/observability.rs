//! Structured logging for measurement and experiment events
//!
//! Every event carries an `event` field and the cluster label so that JSON
//! log output can be filtered per run.

use crate::analysis::ScaleChange;
use crate::models::{ClusterSnapshot, WorkloadRef};
use crate::scenario::Action;
use crate::stats::DistributionStatistics;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Structured logger for experiment events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    cluster: String,
}

impl StructuredLogger {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Log the start of a measurement pass
    pub fn log_capture_started(&self, workloads: usize) {
        info!(
            event = "capture_started",
            cluster = %self.cluster,
            workloads = workloads,
            "Gathering cluster measurements"
        );
    }

    /// Log the end of a measurement pass
    pub fn log_capture_completed(&self, measured: usize, snapshot: &ClusterSnapshot) {
        info!(
            event = "capture_completed",
            cluster = %self.cluster,
            measured_workloads = measured,
            node_count = snapshot.total_node_count(),
            eligible_node_count = snapshot.eligible_node_count(),
            "Cluster measurements gathered"
        );
    }

    /// Log a workload left out because it has too few replicas to measure
    pub fn log_workload_skipped(&self, workload: &WorkloadRef, replicas: u32) {
        info!(
            event = "workload_skipped",
            cluster = %self.cluster,
            workload = %workload,
            replicas = replicas,
            "Workload has too few replicas, skipping"
        );
    }

    /// Log a finished workload distribution
    pub fn log_workload_measured(&self, stats: &DistributionStatistics) {
        debug!(
            event = "workload_measured",
            cluster = %self.cluster,
            workload = %stats.name(),
            total_replicas = stats.total_replicas(),
            nodes_used = stats.nodes_used(),
            skew = stats.skew(),
            gini_coefficient = stats.gini_coefficient(),
            jain_fairness_index = stats.jain_fairness_index(),
            "Workload distribution measured"
        );
    }

    /// Log the scale change between two measurements
    pub fn log_scale_change(&self, change: &ScaleChange) {
        info!(
            event = "scale_change",
            cluster = %self.cluster,
            direction = %change.direction,
            amount = change.amount,
            percentage = ?change.percentage,
            "Compared eligible node counts"
        );
    }

    /// Log an analysis that found nothing to aggregate
    pub fn log_no_test_workloads(&self, measured: usize) {
        warn!(
            event = "no_test_workloads",
            cluster = %self.cluster,
            measured_workloads = measured,
            "No test workloads found in post-action measurements"
        );
    }

    /// Log the start of an experiment run
    pub fn log_run_started(&self, label: &str, action: Action, namespaces: &[String]) {
        info!(
            event = "run_started",
            cluster = %self.cluster,
            label = %label,
            action = %action,
            namespaces = ?namespaces,
            "Experiment run started"
        );
    }

    /// Log a completed action
    pub fn log_action_completed(&self, action: Action, elapsed: Duration) {
        info!(
            event = "action_completed",
            cluster = %self.cluster,
            action = %action,
            elapsed_ms = elapsed.as_millis() as u64,
            "Action completed"
        );
    }

    /// Log a persisted experiment record
    pub fn log_result_written(&self, path: &Path) {
        info!(
            event = "result_written",
            cluster = %self.cluster,
            path = %path.display(),
            "Experiment result written"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("cosmos-dev");
        assert_eq!(logger.cluster(), "cosmos-dev");
    }

    #[test]
    fn test_logging_without_subscriber_is_harmless() {
        let logger = StructuredLogger::new("cosmos-dev");
        let snapshot = ClusterSnapshot::new(4, 3).unwrap();

        logger.log_capture_started(2);
        logger.log_capture_completed(2, &snapshot);
        logger.log_workload_skipped(&WorkloadRef::new("bench", "test-a"), 1);
        logger.log_no_test_workloads(0);
        logger.log_action_completed(Action::None, Duration::ZERO);
    }
}
