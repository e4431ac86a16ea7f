//! Core data models shared by measurement and analysis

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node as reported by the cluster collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    /// Whether the node counts as a placement target for fairness analysis
    pub is_eligible: bool,
}

/// A horizontally replicated workload
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadRef {
    pub namespace: String,
    pub name: String,
}

impl WorkloadRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A running instance of a workload and the node it landed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadInstance {
    pub node_name: String,
}

/// Node counts at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRecord", into = "SnapshotRecord")]
pub struct ClusterSnapshot {
    total_node_count: u32,
    eligible_node_count: u32,
}

impl ClusterSnapshot {
    /// Build a snapshot, rejecting more eligible nodes than nodes
    pub fn new(total_node_count: u32, eligible_node_count: u32) -> Result<Self, AnalysisError> {
        if eligible_node_count > total_node_count {
            return Err(AnalysisError::InvalidSnapshot {
                eligible: eligible_node_count,
                total: total_node_count,
            });
        }
        Ok(Self {
            total_node_count,
            eligible_node_count,
        })
    }

    /// Count all nodes and the eligible subset
    pub fn from_nodes(nodes: &[NodeInfo]) -> Self {
        let total = nodes.len() as u32;
        let eligible = nodes.iter().filter(|n| n.is_eligible).count() as u32;
        Self {
            total_node_count: total,
            eligible_node_count: eligible,
        }
    }

    pub fn total_node_count(&self) -> u32 {
        self.total_node_count
    }

    pub fn eligible_node_count(&self) -> u32 {
        self.eligible_node_count
    }
}

impl fmt::Display for ClusterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes ({} eligible)",
            self.total_node_count, self.eligible_node_count
        )
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotRecord {
    node_count: u32,
    eligible_node_count: u32,
}

impl From<ClusterSnapshot> for SnapshotRecord {
    fn from(snapshot: ClusterSnapshot) -> Self {
        Self {
            node_count: snapshot.total_node_count,
            eligible_node_count: snapshot.eligible_node_count,
        }
    }
}

impl TryFrom<SnapshotRecord> for ClusterSnapshot {
    type Error = AnalysisError;

    fn try_from(record: SnapshotRecord) -> Result<Self, Self::Error> {
        ClusterSnapshot::new(record.node_count, record.eligible_node_count)
    }
}
