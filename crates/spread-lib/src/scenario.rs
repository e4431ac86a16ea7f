//! Experiment scenarios and run actions
//!
//! Each scenario describes a family of test workloads: which placement
//! mechanism constrains them, how many node pools they target, and how many
//! replicas each workload gets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placement constraint applied to test workloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mechanism {
    None,
    NodeSelector,
    NodeAffinity,
    NodeAntiAffinity,
    PodAntiAffinity,
    #[serde(rename = "topologySpreadConstraint")]
    TopologySpread,
}

impl Mechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mechanism::None => "none",
            Mechanism::NodeSelector => "nodeSelector",
            Mechanism::NodeAffinity => "nodeAffinity",
            Mechanism::NodeAntiAffinity => "nodeAntiAffinity",
            Mechanism::PodAntiAffinity => "podAntiAffinity",
            Mechanism::TopologySpread => "topologySpreadConstraint",
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an experiment run does between its two measurements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Install,
    Uninstall,
    Restart,
    /// Measure twice without touching the cluster
    #[default]
    None,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Install, Action::Uninstall, Action::Restart, Action::None];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Uninstall => "uninstall",
            Action::Restart => "restart",
            Action::None => "none",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown action '{s}', expected one of install, uninstall, restart, none")
            })
    }
}

/// Parameters of one experiment scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub name: &'static str,
    pub mechanism: Mechanism,
    pub nodepool_count: u32,
    /// Workloads per node pool; one entry per workload group
    pub workloads_per_nodepool: &'static [u32],
    pub replicas_min: u32,
    pub replicas_max: u32,
    /// Rollout restarts performed after install
    pub restart_count: u32,
}

impl Scenario {
    const fn new(
        name: &'static str,
        mechanism: Mechanism,
        nodepool_count: u32,
        workloads_per_nodepool: &'static [u32],
        replicas_min: u32,
        replicas_max: u32,
    ) -> Self {
        Self {
            name,
            mechanism,
            nodepool_count,
            workloads_per_nodepool,
            replicas_min,
            replicas_max,
            restart_count: 0,
        }
    }

    const fn with_restarts(mut self, restart_count: u32) -> Self {
        self.restart_count = restart_count;
        self
    }

    /// Look up a built-in scenario by name (case-insensitive)
    pub fn find(name: &str) -> Option<&'static Scenario> {
        SCENARIOS.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Total test workloads across all node pools
    pub fn workload_count(&self) -> u32 {
        self.workloads_per_nodepool.iter().sum::<u32>() * self.nodepool_count
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Pseudo-scenario for measuring existing deployments without an action
pub const DATA_COLLECTION: Scenario = Scenario::new("DataCollection", Mechanism::None, 0, &[], 0, 0);

/// Built-in scenario catalog
pub static SCENARIOS: &[Scenario] = &[
    Scenario::new("C1", Mechanism::None, 1, &[10], 2, 50),
    Scenario::new("C2", Mechanism::None, 1, &[10], 50, 50),
    Scenario::new("NS1", Mechanism::NodeSelector, 2, &[1], 2, 20),
    Scenario::new("NS2.i", Mechanism::NodeSelector, 2, &[2, 10], 2, 50),
    Scenario::new("NS2.ii", Mechanism::NodeSelector, 2, &[5, 10], 2, 50),
    Scenario::new("NS3.i", Mechanism::NodeSelector, 2, &[2, 5, 10], 2, 50),
    Scenario::new("NS3.ii", Mechanism::NodeSelector, 5, &[2, 5, 10], 2, 50),
    Scenario::new("NS3.iii", Mechanism::NodeSelector, 10, &[2, 5, 10], 2, 50),
    Scenario::new("P1.i", Mechanism::PodAntiAffinity, 1, &[1], 2, 2),
    Scenario::new("P1.ii", Mechanism::PodAntiAffinity, 1, &[10], 2, 2),
    Scenario::new("P1.iii", Mechanism::PodAntiAffinity, 1, &[10], 2, 10),
    Scenario::new("P1.iv", Mechanism::PodAntiAffinity, 1, &[10], 2, 50),
    Scenario::new("P2", Mechanism::PodAntiAffinity, 1, &[10], 50, 50),
    Scenario::new("P3.i", Mechanism::PodAntiAffinity, 1, &[10], 50, 50).with_restarts(1),
    Scenario::new("P3.ii", Mechanism::PodAntiAffinity, 1, &[10], 50, 50).with_restarts(10),
];
