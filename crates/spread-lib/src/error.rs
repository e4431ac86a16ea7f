//! Error types for measurement, analysis and experiment runs

use crate::scenario::Action;
use thiserror::Error;

/// Failures reported by a cluster collaborator
#[derive(Debug, Error)]
pub enum InspectError {
    /// Cluster unreachable, API error, or unreadable kubeconfig
    #[error("cluster unavailable: {0}")]
    Unavailable(String),

    /// Credentials rejected by the API server
    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("active kube context is '{actual}', expected '{expected}'")]
    ContextMismatch { expected: String, actual: String },

    #[error("workload {0} not found")]
    WorkloadNotFound(String),
}

/// Invariant violations detected while building or comparing measurements
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("eligible node count {eligible} exceeds total node count {total}")]
    InvalidSnapshot { eligible: u32, total: u32 },

    #[error("workload {0} was measured more than once")]
    DuplicateWorkload(String),

    #[error("workload sets differ: missing after {missing:?}, added after {added:?}")]
    WorkloadSetMismatch {
        missing: Vec<String>,
        added: Vec<String>,
    },
}

/// Errors surfaced by an experiment run
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Inspect(#[from] InspectError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("action '{0}' needs a package manager executor")]
    UnsupportedAction(Action),

    #[error("measurement task failed: {0}")]
    Task(String),

    #[error("failed to access result file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode result record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for experiment operations
pub type Result<T> = std::result::Result<T, ExperimentError>;
