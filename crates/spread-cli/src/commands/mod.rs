//! Command implementations and the cluster wiring they share

pub mod collect;
pub mod run;
pub mod scenarios;
pub mod show;

use crate::config::SpreadConfig;
use anyhow::{Context, Result};
use spread_lib::cluster::{current_context, verify_context, KubeActionExecutor, KubeInspector};
use spread_lib::{
    ExperimentRunner, InspectError, MeasurementCollector, NodeEligibility, ResultStore,
    StructuredLogger,
};
use std::sync::Arc;
use tracing::info;

/// Connected cluster plus everything needed to run and persist experiments
pub struct Session {
    /// Short cluster name, used in records and log events
    pub cluster: String,
    pub runner: ExperimentRunner,
    pub store: ResultStore,
    pub logger: StructuredLogger,
}

impl Session {
    /// Check the kube context and connect
    pub async fn connect(context: Option<&str>, config: &SpreadConfig) -> Result<Self> {
        check_context(context, config)?;

        let context_name = match context {
            Some(context) => context.to_string(),
            None => current_context().context("Failed to read kubeconfig")?,
        };
        let cluster = short_cluster_name(&context_name).to_string();
        let logger = StructuredLogger::new(cluster.as_str());

        let eligibility: Arc<dyn NodeEligibility> = Arc::new(config.eligibility());
        let inspector = KubeInspector::connect(context, eligibility)
            .await
            .with_context(|| format!("Failed to connect to cluster {}", context_name))?;
        info!(cluster = %cluster, context = %context_name, "Connected to cluster");

        let executor = Arc::new(KubeActionExecutor::new(inspector.client()));
        let collector =
            MeasurementCollector::new(Arc::new(inspector), config.capture_options(), logger.clone());
        let runner = ExperimentRunner::new(
            collector,
            executor,
            config.analysis_options(),
            logger.clone(),
        );

        Ok(Self {
            cluster,
            runner,
            store: ResultStore::new(&config.output_dir),
            logger,
        })
    }
}

/// Refuse to touch a cluster other than the configured one
fn check_context(context: Option<&str>, config: &SpreadConfig) -> Result<()> {
    let Some(expected) = config.expected_context.as_deref() else {
        return Ok(());
    };

    match context {
        Some(actual) if actual != expected => Err(InspectError::ContextMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
        .into()),
        Some(_) => Ok(()),
        None => Ok(verify_context(expected)?),
    }
}

/// EKS contexts are ARNs; keep the part after the last `/`
pub fn short_cluster_name(context: &str) -> &str {
    context.rsplit('/').next().unwrap_or(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_cluster_name() {
        assert_eq!(
            short_cluster_name("arn:aws:eks:us-east-1:906324658258:cluster/prod-live-main"),
            "prod-live-main"
        );
        assert_eq!(short_cluster_name("kind-bench"), "kind-bench");
    }

    #[test]
    fn test_check_context_mismatch() {
        let config = SpreadConfig {
            expected_context: Some("kind-bench".to_string()),
            ..Default::default()
        };

        assert!(check_context(Some("kind-bench"), &config).is_ok());
        let err = check_context(Some("prod"), &config).unwrap_err();
        assert!(err.to_string().contains("expected 'kind-bench'"));
    }

    #[test]
    fn test_check_context_without_expectation() {
        assert!(check_context(Some("anything"), &SpreadConfig::default()).is_ok());
    }
}
