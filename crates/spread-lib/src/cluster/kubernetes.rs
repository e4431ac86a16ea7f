//! Kubernetes-backed cluster inspection and actions
//!
//! Workloads are Deployments. Running instances are matched with the
//! Deployment's `matchLabels` selector plus a `status.phase=Running` field
//! selector, so pods left over from earlier runs or restarts are ignored.

use super::{ClusterInspector, NodeEligibility};
use crate::error::{ExperimentError, InspectError};
use crate::experiment::ActionExecutor;
use crate::models::{NodeInfo, WorkloadInstance, WorkloadRef};
use crate::scenario::Action;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Field selector for instances that are actually running
const RUNNING_PODS: &str = "status.phase=Running";

/// Inspects a cluster through the Kubernetes API
#[derive(Clone)]
pub struct KubeInspector {
    client: Client,
    eligibility: Arc<dyn NodeEligibility>,
}

impl KubeInspector {
    /// Wrap an existing client
    pub fn new(client: Client, eligibility: Arc<dyn NodeEligibility>) -> Self {
        Self {
            client,
            eligibility,
        }
    }

    /// Connect using the kubeconfig, optionally pinned to a named context
    pub async fn connect(
        context: Option<&str>,
        eligibility: Arc<dyn NodeEligibility>,
    ) -> Result<Self, InspectError> {
        let client = connect_client(context).await?;
        Ok(Self::new(client, eligibility))
    }

    /// Underlying client, shared with [`KubeActionExecutor`]
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    async fn read_deployment(&self, workload: &WorkloadRef) -> Result<Deployment, InspectError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &workload.namespace);
        api.get(&workload.name).await.map_err(|e| match e {
            kube::Error::Api(response) if response.code == 404 => {
                InspectError::WorkloadNotFound(workload.to_string())
            }
            other => map_kube_error(other),
        })
    }
}

#[async_trait]
impl ClusterInspector for KubeInspector {
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>, InspectError> {
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = api
            .list(&ListParams::default())
            .await
            .map_err(map_kube_error)?;

        let infos: Vec<NodeInfo> = nodes
            .items
            .iter()
            .map(|node| NodeInfo {
                name: node.metadata.name.clone().unwrap_or_default(),
                is_eligible: self.eligibility.is_eligible(node),
            })
            .collect();

        debug!(
            nodes = infos.len(),
            eligible = infos.iter().filter(|n| n.is_eligible).count(),
            "Listed cluster nodes"
        );
        Ok(infos)
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<WorkloadRef>, InspectError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let deployments = api
            .list(&ListParams::default())
            .await
            .map_err(map_kube_error)?;

        Ok(deployments
            .items
            .into_iter()
            .filter_map(|d| d.metadata.name)
            .map(|name| WorkloadRef::new(namespace, name))
            .collect())
    }

    async fn get_workload_replica_target(
        &self,
        workload: &WorkloadRef,
    ) -> Result<u32, InspectError> {
        let deployment = self.read_deployment(workload).await?;
        let replicas = deployment
            .spec
            .and_then(|spec| spec.replicas)
            .unwrap_or(1);
        Ok(replicas.max(0) as u32)
    }

    async fn list_workload_instances(
        &self,
        workload: &WorkloadRef,
    ) -> Result<Vec<WorkloadInstance>, InspectError> {
        let deployment = self.read_deployment(workload).await?;
        let match_labels = deployment
            .spec
            .and_then(|spec| spec.selector.match_labels)
            .unwrap_or_default();
        let selector = label_selector(&match_labels);

        let api: Api<Pod> = Api::namespaced(self.client.clone(), &workload.namespace);
        let params = ListParams::default().labels(&selector).fields(RUNNING_PODS);
        let pods = api.list(&params).await.map_err(map_kube_error)?;

        let instances: Vec<WorkloadInstance> = pods
            .items
            .into_iter()
            .filter_map(|pod| pod.spec.and_then(|spec| spec.node_name))
            .map(|node_name| WorkloadInstance { node_name })
            .collect();

        debug!(
            workload = %workload,
            selector = %selector,
            instances = instances.len(),
            "Listed running instances"
        );
        Ok(instances)
    }
}

/// Performs run actions through the Kubernetes API
///
/// Only `restart` touches the cluster. Installing or removing releases needs
/// a package manager and is rejected with [`ExperimentError::UnsupportedAction`].
pub struct KubeActionExecutor {
    client: Client,
}

impl KubeActionExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActionExecutor for KubeActionExecutor {
    async fn perform(
        &self,
        action: Action,
        namespaces: &[String],
        dry_run: bool,
    ) -> Result<(), ExperimentError> {
        match action {
            Action::None => {
                info!("No action specified, skipping");
                Ok(())
            }
            Action::Install | Action::Uninstall => Err(ExperimentError::UnsupportedAction(action)),
            Action::Restart => {
                for namespace in namespaces {
                    let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
                    let deployments = api
                        .list(&ListParams::default())
                        .await
                        .map_err(map_kube_error)?;

                    for name in deployments.items.into_iter().filter_map(|d| d.metadata.name) {
                        if dry_run {
                            info!(namespace = %namespace, deployment = %name, "Dry run, not restarting");
                            continue;
                        }
                        api.restart(&name).await.map_err(map_kube_error)?;
                        info!(namespace = %namespace, deployment = %name, "Rollout restart requested");
                    }
                }
                Ok(())
            }
        }
    }
}

/// Name of the kubeconfig's active context
pub fn current_context() -> Result<String, InspectError> {
    let kubeconfig =
        Kubeconfig::read().map_err(|e| InspectError::Unavailable(e.to_string()))?;
    kubeconfig
        .current_context
        .ok_or_else(|| InspectError::Unavailable("kubeconfig has no current context".to_string()))
}

/// Fail unless the kubeconfig's active context is `expected`
pub fn verify_context(expected: &str) -> Result<(), InspectError> {
    let actual = current_context()?;

    if actual != expected {
        return Err(InspectError::ContextMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

async fn connect_client(context: Option<&str>) -> Result<Client, InspectError> {
    let config = match context {
        Some(context) => {
            let options = KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            };
            Config::from_kubeconfig(&options)
                .await
                .map_err(|e| InspectError::Unavailable(e.to_string()))?
        }
        None => Config::infer()
            .await
            .map_err(|e| InspectError::Unavailable(e.to_string()))?,
    };

    Client::try_from(config).map_err(map_kube_error)
}

/// Render `matchLabels` as a comma separated `key=value` selector
fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn map_kube_error(err: kube::Error) -> InspectError {
    match err {
        kube::Error::Api(response) if response.code == 401 || response.code == 403 => {
            InspectError::Unauthorized(response.message)
        }
        kube::Error::Auth(e) => InspectError::Unauthorized(e.to_string()),
        other => InspectError::Unavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("request failed with {code}"),
            reason: "Test".to_string(),
            code,
        })
    }

    #[test]
    fn test_label_selector() {
        let mut labels = BTreeMap::new();
        labels.insert("app.kubernetes.io/name".to_string(), "busybox-chart".to_string());
        labels.insert("app.kubernetes.io/instance".to_string(), "test-a".to_string());

        assert_eq!(
            label_selector(&labels),
            "app.kubernetes.io/instance=test-a,app.kubernetes.io/name=busybox-chart"
        );
        assert_eq!(label_selector(&BTreeMap::new()), "");
    }

    #[test]
    fn test_auth_failures_are_distinguished() {
        assert!(matches!(
            map_kube_error(api_error(401)),
            InspectError::Unauthorized(_)
        ));
        assert!(matches!(
            map_kube_error(api_error(403)),
            InspectError::Unauthorized(_)
        ));
        assert!(matches!(
            map_kube_error(api_error(500)),
            InspectError::Unavailable(_)
        ));
    }
}
