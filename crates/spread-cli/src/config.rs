//! Configuration management for the CLI
//!
//! Values come from, in increasing priority: built-in defaults, a TOML file,
//! `SPREAD_*` environment variables, then command-line flags.

use anyhow::{Context, Result};
use serde::Deserialize;
use spread_lib::{
    AnalysisOptions, CaptureOptions, ComparisonMode, DefaultEligibility, UnusedNodePolicy,
    WorkloadSelector,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "spread.toml";

/// Experiment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadConfig {
    /// Root directory for experiment records
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Concurrent per-workload fetches
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Pad unused eligible nodes as zero counts
    #[serde(default)]
    pub include_unused_nodes: bool,

    /// Name marker of test workloads; empty selects every workload
    #[serde(default = "default_test_workload_marker")]
    pub test_workload_marker: String,

    /// Node name prefixes that are never placement targets
    #[serde(default = "default_ineligible_node_prefixes")]
    pub ineligible_node_prefixes: Vec<String>,

    #[serde(default)]
    pub exclude_cordoned_nodes: bool,

    /// Refuse to run unless the kube context matches
    #[serde(default)]
    pub expected_context: Option<String>,

    /// Wait after a restart before measuring again
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,

    /// Fail when test workloads differ before and after
    #[serde(default)]
    pub strict_comparison: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_max_workers() -> usize {
    10
}

fn default_test_workload_marker() -> String {
    "test-".to_string()
}

fn default_ineligible_node_prefixes() -> Vec<String> {
    vec!["fargate-".to_string()]
}

fn default_settle_secs() -> u64 {
    300
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_workers: default_max_workers(),
            include_unused_nodes: false,
            test_workload_marker: default_test_workload_marker(),
            ineligible_node_prefixes: default_ineligible_node_prefixes(),
            exclude_cordoned_nodes: false,
            expected_context: None,
            settle_secs: default_settle_secs(),
            strict_comparison: false,
        }
    }
}

impl SpreadConfig {
    /// Load configuration from a file and the environment.
    ///
    /// An explicit `path` must exist. Without one, `spread.toml` in the
    /// working directory and then `~/.config/spread/config.toml` are tried.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    builder = builder.add_source(config::File::from(path.as_path()).required(false));
                }
            }
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("SPREAD")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ineligible_node_prefixes"),
            )
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs_next::config_dir()
            .map(|dir| dir.join("spread").join("config.toml"))
            .filter(|path| path.exists())
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            max_workers: self.max_workers,
            unused_nodes: if self.include_unused_nodes {
                UnusedNodePolicy::Include
            } else {
                UnusedNodePolicy::Exclude
            },
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            selector: WorkloadSelector::from_marker(&self.test_workload_marker),
            comparison: if self.strict_comparison {
                ComparisonMode::Strict
            } else {
                ComparisonMode::Lenient
            },
        }
    }

    pub fn eligibility(&self) -> DefaultEligibility {
        DefaultEligibility {
            excluded_prefixes: self.ineligible_node_prefixes.clone(),
            exclude_cordoned: self.exclude_cordoned_nodes,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}
