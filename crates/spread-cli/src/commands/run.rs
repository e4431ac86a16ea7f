//! Before/after scenario experiments

use anyhow::{anyhow, Result};
use serde_json::json;
use spread_lib::{Action, ExperimentPlan, Scenario};
use std::time::Duration;

use super::Session;
use crate::config::SpreadConfig;
use crate::output::{print_analysis, print_info, print_json, print_measurements, print_success, OutputFormat};

/// Arguments of one scenario run
pub struct RunArgs {
    pub scenario: String,
    pub namespaces: Vec<String>,
    pub action: Action,
    pub dry_run: bool,
}

/// Resolve a scenario name against the built-in catalog
pub fn find_scenario(name: &str) -> Result<&'static Scenario> {
    Scenario::find(name).ok_or_else(|| {
        anyhow!(
            "Scenario {} not found, run `spread scenarios` to list them",
            name
        )
    })
}

/// Build the plan for a scenario run
pub fn plan(scenario: &Scenario, args: &RunArgs, config: &SpreadConfig) -> ExperimentPlan {
    let settle = match args.action {
        Action::Restart => config.settle(),
        _ => Duration::ZERO,
    };

    ExperimentPlan {
        label: scenario.name.to_string(),
        namespaces: args.namespaces.clone(),
        action: args.action,
        dry_run: args.dry_run,
        settle,
    }
}

/// Measure, perform the action, measure again and persist the result
pub async fn run_scenario(
    context: Option<&str>,
    config: &SpreadConfig,
    args: RunArgs,
    no_print: bool,
    format: OutputFormat,
) -> Result<()> {
    let scenario = find_scenario(&args.scenario)?;
    let session = Session::connect(context, config).await?;

    print_info(&format!(
        "Scenario {} ({}), action {} on {}",
        scenario.name,
        scenario.mechanism,
        args.action,
        args.namespaces.join(", ")
    ));

    let plan = plan(scenario, &args, config);
    let outcome = session.runner.run(&plan).await?;

    let record = outcome.to_record(
        &session.cluster,
        json!({
            "scenario": scenario.name,
            "mechanism": scenario.mechanism,
            "namespaces": args.namespaces,
            "action": args.action,
            "dry_run": args.dry_run,
            "context": context,
        }),
    );
    let path = session.store.write(scenario.name, scenario.name, &record)?;
    session.logger.log_result_written(&path);

    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Table => {
            if !no_print {
                let titles = ["Pre-action measurements", "Post-action measurements"];
                for (title, set) in titles.iter().zip(&outcome.measurements) {
                    print_measurements(title, set);
                }
            }
            print_analysis(&record.analysis);
            if let Some(elapsed) = &record.elapsed_time {
                print_info(&format!("{} took {}", args.action, elapsed));
            }
            print_success(&format!("Result written to {}", path.display()));
        }
    }

    Ok(())
}
