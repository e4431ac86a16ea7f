//! Cluster-wide measurement capture
//!
//! A [`MeasurementSet`] freezes the node counts and the replica distribution
//! of every measured workload at one instant. Per-workload data is fetched
//! concurrently; each fetch produces its statistics independently and they
//! are merged by workload name, so fetch order never affects the result.

use crate::cluster::ClusterInspector;
use crate::error::{AnalysisError, ExperimentError, Result};
use crate::models::{ClusterSnapshot, WorkloadRef};
use crate::observability::StructuredLogger;
use crate::stats::{DistributionStatistics, UnusedNodePolicy};
use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

/// Default number of concurrent per-workload fetches
const DEFAULT_MAX_WORKERS: usize = 10;

/// Node counts plus per-workload distributions at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    #[serde(with = "timestamp_seconds")]
    timestamp: DateTime<Utc>,
    cluster: ClusterSnapshot,
    deployments: BTreeMap<String, DistributionStatistics>,
}

impl MeasurementSet {
    /// Build a set, defaulting the timestamp to now
    pub fn new(
        cluster: ClusterSnapshot,
        deployments: impl IntoIterator<Item = DistributionStatistics>,
        timestamp: Option<DateTime<Utc>>,
    ) -> std::result::Result<Self, AnalysisError> {
        let mut by_name = BTreeMap::new();
        for stats in deployments {
            let name = stats.name().to_string();
            if by_name.insert(name.clone(), stats).is_some() {
                return Err(AnalysisError::DuplicateWorkload(name));
            }
        }

        Ok(Self {
            timestamp: timestamp.unwrap_or_else(Utc::now),
            cluster,
            deployments: by_name,
        })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn cluster(&self) -> &ClusterSnapshot {
        &self.cluster
    }

    /// Distributions keyed by workload name
    pub fn deployments(&self) -> &BTreeMap<String, DistributionStatistics> {
        &self.deployments
    }

    pub fn get(&self, workload: &str) -> Option<&DistributionStatistics> {
        self.deployments.get(workload)
    }
}

/// Options for a capture pass
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Upper bound on concurrent per-workload fetches
    pub max_workers: usize,
    /// Whether unused eligible nodes are padded in as zero counts
    pub unused_nodes: UnusedNodePolicy,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            unused_nodes: UnusedNodePolicy::default(),
        }
    }
}

/// Captures [`MeasurementSet`]s from a cluster inspector
#[derive(Clone)]
pub struct MeasurementCollector {
    inspector: Arc<dyn ClusterInspector>,
    options: CaptureOptions,
    logger: StructuredLogger,
}

impl MeasurementCollector {
    pub fn new(
        inspector: Arc<dyn ClusterInspector>,
        options: CaptureOptions,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            inspector,
            options,
            logger,
        }
    }

    /// Measure every workload in the given namespaces
    pub async fn capture_namespaces(&self, namespaces: &[String]) -> Result<MeasurementSet> {
        let mut workloads = Vec::new();
        for namespace in namespaces {
            workloads.extend(self.inspector.list_workloads(namespace).await?);
        }
        self.capture(workloads).await
    }

    /// Measure the named workloads.
    ///
    /// Workloads with a replica target of one or less are skipped. Any
    /// collaborator failure aborts the whole pass.
    pub async fn capture(&self, workloads: Vec<WorkloadRef>) -> Result<MeasurementSet> {
        self.logger.log_capture_started(workloads.len());

        let nodes = self.inspector.list_nodes().await?;
        let cluster = ClusterSnapshot::from_nodes(&nodes);
        debug!(cluster = %cluster, "Captured cluster snapshot");

        let measured: Arc<DashMap<String, DistributionStatistics>> = Arc::new(DashMap::new());
        let permits = Arc::new(Semaphore::new(self.options.max_workers.max(1)));
        let mut tasks = JoinSet::new();

        for workload in workloads {
            let inspector = Arc::clone(&self.inspector);
            let measured = Arc::clone(&measured);
            let permits = Arc::clone(&permits);
            let logger = self.logger.clone();
            let policy = self.options.unused_nodes;
            let eligible = cluster.eligible_node_count();

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| ExperimentError::Task(e.to_string()))?;
                let stats =
                    measure_workload(inspector.as_ref(), &workload, eligible, policy, &logger)
                        .await?;
                record(&measured, stats)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => result?,
                Err(e) => return Err(ExperimentError::Task(e.to_string())),
            }
        }

        let deployments: Vec<DistributionStatistics> = match Arc::try_unwrap(measured) {
            Ok(map) => map.into_iter().map(|(_, stats)| stats).collect(),
            Err(shared) => shared.iter().map(|entry| entry.value().clone()).collect(),
        };

        let set = MeasurementSet::new(cluster, deployments, None)?;
        self.logger
            .log_capture_completed(set.deployments().len(), &set.cluster);
        Ok(set)
    }
}

/// Insert a finished distribution, failing on a repeated workload name
fn record(
    measured: &DashMap<String, DistributionStatistics>,
    stats: Option<DistributionStatistics>,
) -> Result<()> {
    let Some(stats) = stats else {
        return Ok(());
    };
    let name = stats.name().to_string();
    if measured.insert(name.clone(), stats).is_some() {
        return Err(AnalysisError::DuplicateWorkload(name).into());
    }
    Ok(())
}

/// Fetch one workload's placement and reduce it to statistics
async fn measure_workload(
    inspector: &dyn ClusterInspector,
    workload: &WorkloadRef,
    eligible_nodes: u32,
    policy: UnusedNodePolicy,
    logger: &StructuredLogger,
) -> Result<Option<DistributionStatistics>> {
    let target = inspector.get_workload_replica_target(workload).await?;
    if target <= 1 {
        logger.log_workload_skipped(workload, target);
        return Ok(None);
    }

    let instances = inspector.list_workload_instances(workload).await?;
    let mut per_node: HashMap<String, u32> = HashMap::new();
    for instance in instances {
        *per_node.entry(instance.node_name).or_insert(0) += 1;
    }
    debug!(
        workload = %workload,
        nodes = ?per_node.keys().collect::<Vec<_>>(),
        "Grouped running instances by node"
    );

    let counts = policy.apply(per_node.into_values().collect(), eligible_nodes);
    let stats = DistributionStatistics::compute(workload.name.clone(), counts);
    logger.log_workload_measured(&stats);
    Ok(Some(stats))
}

/// ISO-8601 timestamps truncated to whole seconds
pub(crate) mod timestamp_seconds {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &DateTime<Utc>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
