//! Cluster inspection seam
//!
//! The statistics engine never talks to a cluster directly. Placement data
//! arrives through a [`ClusterInspector`]; the Kubernetes-backed
//! implementation lives in [`kubernetes`].

pub mod kubernetes;

use crate::error::InspectError;
use crate::models::{NodeInfo, WorkloadInstance, WorkloadRef};
use k8s_openapi::api::core::v1::Node;

use async_trait::async_trait;
pub use kubernetes::{current_context, verify_context, KubeActionExecutor, KubeInspector};

/// Read-only view of nodes, workloads and their running instances
#[async_trait]
pub trait ClusterInspector: Send + Sync {
    /// List every node with its eligibility already decided
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>, InspectError>;

    /// List the workloads deployed in a namespace
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<WorkloadRef>, InspectError>;

    /// Desired replica count of a workload
    async fn get_workload_replica_target(&self, workload: &WorkloadRef)
        -> Result<u32, InspectError>;

    /// Running instances of a workload; pending or terminating ones are excluded
    async fn list_workload_instances(
        &self,
        workload: &WorkloadRef,
    ) -> Result<Vec<WorkloadInstance>, InspectError>;
}

/// Decides whether a node is a valid placement target
pub trait NodeEligibility: Send + Sync {
    fn is_eligible(&self, node: &Node) -> bool;
}

impl<F> NodeEligibility for F
where
    F: Fn(&Node) -> bool + Send + Sync,
{
    fn is_eligible(&self, node: &Node) -> bool {
        self(node)
    }
}

/// Excludes serverless-backed nodes by name prefix and, optionally, cordoned nodes
#[derive(Debug, Clone)]
pub struct DefaultEligibility {
    pub excluded_prefixes: Vec<String>,
    pub exclude_cordoned: bool,
}

impl Default for DefaultEligibility {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec!["fargate-".to_string()],
            exclude_cordoned: false,
        }
    }
}

impl NodeEligibility for DefaultEligibility {
    fn is_eligible(&self, node: &Node) -> bool {
        let name = node.metadata.name.as_deref().unwrap_or_default();
        if self
            .excluded_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
        {
            return false;
        }

        let cordoned = node
            .spec
            .as_ref()
            .and_then(|spec| spec.unschedulable)
            .unwrap_or(false);
        !(self.exclude_cordoned && cordoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::NodeSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn node(name: &str, unschedulable: Option<bool>) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                unschedulable,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_eligibility_excludes_fargate() {
        let eligibility = DefaultEligibility::default();

        assert!(eligibility.is_eligible(&node("ip-10-1-2-3.ec2.internal", None)));
        assert!(!eligibility.is_eligible(&node("fargate-ip-10-1-2-3.ec2.internal", None)));
    }

    #[test]
    fn test_cordoned_nodes_only_excluded_when_enabled() {
        let cordoned = node("ip-10-1-2-3", Some(true));

        assert!(DefaultEligibility::default().is_eligible(&cordoned));

        let strict = DefaultEligibility {
            exclude_cordoned: true,
            ..Default::default()
        };
        assert!(!strict.is_eligible(&cordoned));
        assert!(strict.is_eligible(&node("ip-10-1-2-4", Some(false))));
    }

    #[test]
    fn test_closure_eligibility() {
        let only_workers = |n: &Node| {
            n.metadata
                .name
                .as_deref()
                .is_some_and(|name| name.starts_with("worker-"))
        };

        assert!(only_workers.is_eligible(&node("worker-1", None)));
        assert!(!only_workers.is_eligible(&node("control-1", None)));
    }
}
