//! Scenario catalog listing

use serde::Serialize;
use spread_lib::scenario::SCENARIOS;
use spread_lib::Scenario;
use tabled::Tabled;

use crate::output::{print_table, OutputFormat};

/// Row for the scenario table
#[derive(Tabled, Serialize)]
struct ScenarioRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Mechanism")]
    mechanism: String,
    #[tabled(rename = "Node pools")]
    nodepools: u32,
    #[tabled(rename = "Workloads")]
    workloads: u32,
    #[tabled(rename = "Replicas")]
    replicas: String,
    #[tabled(rename = "Restarts")]
    restarts: u32,
}

impl From<&Scenario> for ScenarioRow {
    fn from(scenario: &Scenario) -> Self {
        let replicas = if scenario.replicas_min == scenario.replicas_max {
            scenario.replicas_min.to_string()
        } else {
            format!("{}-{}", scenario.replicas_min, scenario.replicas_max)
        };

        Self {
            name: scenario.name,
            mechanism: scenario.mechanism.to_string(),
            nodepools: scenario.nodepool_count,
            workloads: scenario.workload_count(),
            replicas,
            restarts: scenario.restart_count,
        }
    }
}

/// List the built-in scenarios
pub fn list_scenarios(format: OutputFormat) {
    let rows: Vec<ScenarioRow> = SCENARIOS.iter().map(ScenarioRow::from).collect();
    print_table(&rows, format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_row() {
        let row = ScenarioRow::from(Scenario::find("NS2.i").unwrap());
        assert_eq!(row.mechanism, "nodeSelector");
        assert_eq!(row.workloads, 24);
        assert_eq!(row.replicas, "2-50");

        let fixed = ScenarioRow::from(Scenario::find("P2").unwrap());
        assert_eq!(fixed.replicas, "50");
    }
}
