//! Scheduler spread benchmarking library
//!
//! This crate provides:
//! - Per-workload replica distribution statistics (skew, CV, Gini, Jain)
//! - Concurrent measurement capture through a cluster inspection seam
//! - Before/after comparative analysis with scale detection
//! - Experiment orchestration, scenarios and result persistence

pub mod analysis;
pub mod cluster;
pub mod error;
pub mod experiment;
pub mod measurement;
pub mod models;
pub mod observability;
pub mod scenario;
pub mod stats;

pub use analysis::{
    AnalysisOptions, AnalysisRecord, ComparativeAnalysis, ComparisonMode, MetricSummary,
    ScaleChange, ScaleDirection, WorkloadSelector,
};
pub use cluster::{ClusterInspector, DefaultEligibility, NodeEligibility};
pub use error::{AnalysisError, ExperimentError, InspectError, Result};
pub use experiment::{
    ActionExecutor, ExperimentOutcome, ExperimentPlan, ExperimentRecord, ExperimentRunner,
    ResultStore,
};
pub use measurement::{CaptureOptions, MeasurementCollector, MeasurementSet};
pub use models::*;
pub use observability::StructuredLogger;
pub use scenario::{Action, Mechanism, Scenario};
pub use stats::{DistributionStatistics, UnusedNodePolicy};
