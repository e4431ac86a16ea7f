//! Experiment orchestration and result persistence
//!
//! A run captures the test namespaces, performs one action, optionally waits
//! for the cluster to settle, captures again and compares the two passes.

use crate::analysis::{AnalysisOptions, AnalysisRecord, ComparativeAnalysis};
use crate::error::{ExperimentError, Result};
use crate::measurement::{timestamp_seconds, MeasurementCollector, MeasurementSet};
use crate::observability::StructuredLogger;
use crate::scenario::Action;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Performs the action between the two measurement passes
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn perform(
        &self,
        action: Action,
        namespaces: &[String],
        dry_run: bool,
    ) -> std::result::Result<(), ExperimentError>;
}

/// One before/after experiment
#[derive(Debug, Clone)]
pub struct ExperimentPlan {
    /// Scenario name or namespace, used to name the result file
    pub label: String,
    pub namespaces: Vec<String>,
    pub action: Action,
    pub dry_run: bool,
    /// Wait after a restart before the second capture
    pub settle: Duration,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    pub label: String,
    pub analysis: ComparativeAnalysis,
    /// Passes in capture order; the last one is analyzed
    pub measurements: Vec<MeasurementSet>,
    /// Time spent performing the action, absent for baseline captures
    pub elapsed: Option<Duration>,
}

impl ExperimentOutcome {
    /// Most recent pass
    pub fn latest(&self) -> Option<&MeasurementSet> {
        self.measurements.last()
    }

    /// Persistable record with the run arguments attached
    pub fn to_record(&self, cluster: &str, args: serde_json::Value) -> ExperimentRecord {
        ExperimentRecord {
            args,
            cluster: cluster.to_string(),
            timestamp: self
                .latest()
                .map(MeasurementSet::timestamp)
                .unwrap_or_else(Utc::now),
            elapsed_time: self.elapsed.map(format_elapsed),
            analysis: self.analysis.to_record(),
            measurements: self.measurements.clone(),
        }
    }
}

/// Drives capture, action and analysis
pub struct ExperimentRunner {
    collector: MeasurementCollector,
    executor: Arc<dyn ActionExecutor>,
    analysis: AnalysisOptions,
    logger: StructuredLogger,
}

impl ExperimentRunner {
    pub fn new(
        collector: MeasurementCollector,
        executor: Arc<dyn ActionExecutor>,
        analysis: AnalysisOptions,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            collector,
            executor,
            analysis,
            logger,
        }
    }

    /// Capture, act, settle, capture again, compare
    pub async fn run(&self, plan: &ExperimentPlan) -> Result<ExperimentOutcome> {
        self.logger
            .log_run_started(&plan.label, plan.action, &plan.namespaces);

        let before = self.collector.capture_namespaces(&plan.namespaces).await?;

        let started = Instant::now();
        self.executor
            .perform(plan.action, &plan.namespaces, plan.dry_run)
            .await?;
        let elapsed = match plan.action {
            Action::None => Duration::ZERO,
            _ => started.elapsed(),
        };
        self.logger.log_action_completed(plan.action, elapsed);

        if plan.action == Action::Restart && !plan.dry_run && !plan.settle.is_zero() {
            info!(
                settle_secs = plan.settle.as_secs(),
                "Waiting for restarted workloads to settle"
            );
            tokio::time::sleep(plan.settle).await;
        }

        let after = self.collector.capture_namespaces(&plan.namespaces).await?;
        let analysis = self.analyze(Some(&before), &after)?;

        Ok(ExperimentOutcome {
            label: plan.label.clone(),
            analysis,
            measurements: vec![before, after],
            elapsed: Some(elapsed),
        })
    }

    /// Single capture of existing workloads, compared against nothing
    pub async fn baseline(&self, label: &str, namespaces: &[String]) -> Result<ExperimentOutcome> {
        self.logger.log_run_started(label, Action::None, namespaces);

        let after = self.collector.capture_namespaces(namespaces).await?;
        let analysis = self.analyze(None, &after)?;

        Ok(ExperimentOutcome {
            label: label.to_string(),
            analysis,
            measurements: vec![after],
            elapsed: None,
        })
    }

    fn analyze(
        &self,
        before: Option<&MeasurementSet>,
        after: &MeasurementSet,
    ) -> Result<ComparativeAnalysis> {
        let analysis = ComparativeAnalysis::compute(before, after, &self.analysis)?;

        if analysis.scale().is_known() {
            self.logger.log_scale_change(analysis.scale());
        }
        if analysis.workloads_analyzed() == 0 {
            self.logger.log_no_test_workloads(after.deployments().len());
        }
        Ok(analysis)
    }
}

/// Persisted result of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Free-form arguments the run was started with
    pub args: serde_json::Value,
    pub cluster: String,
    #[serde(with = "timestamp_seconds")]
    pub timestamp: DateTime<Utc>,
    pub elapsed_time: Option<String>,
    pub analysis: AnalysisRecord,
    pub measurements: Vec<MeasurementSet>,
}

/// Format a duration as `H:MM:SS`, with microseconds when present
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    let micros = elapsed.subsec_micros();

    if micros == 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours}:{minutes:02}:{seconds:02}.{micros:06}")
    }
}

/// Writes and reads experiment records under a root directory
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `{root}/{group}/{label}-{timestamp}.json`
    pub fn write(&self, group: &str, label: &str, record: &ExperimentRecord) -> Result<PathBuf> {
        let label = sanitize_label(label);
        let dir = self.root.join(sanitize_label(group));
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!(
            "{}-{}.json",
            label,
            record.timestamp.format("%Y%m%d-%H%M%S")
        ));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        debug!(path = %path.display(), "Wrote experiment record");
        Ok(path)
    }

    /// Read a record back; derived statistics are recomputed
    pub fn read(path: impl AsRef<Path>) -> Result<ExperimentRecord> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Keep labels usable as a single path component
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "unnamed".to_string(),
        _ => cleaned,
    }
}
