//! Collect-only measurements of existing workloads

use anyhow::Result;
use serde_json::json;
use spread_lib::scenario::DATA_COLLECTION;

use super::Session;
use crate::config::SpreadConfig;
use crate::output::{print_analysis, print_json, print_measurements, print_success, OutputFormat};

/// Measure the namespaces once and persist the result under the cluster name
pub async fn collect(
    context: Option<&str>,
    config: &SpreadConfig,
    namespaces: Vec<String>,
    no_print: bool,
    format: OutputFormat,
) -> Result<()> {
    let session = Session::connect(context, config).await?;
    let outcome = session.runner.baseline(DATA_COLLECTION.name, &namespaces).await?;

    let record = outcome.to_record(
        &session.cluster,
        json!({
            "scenario": DATA_COLLECTION.name,
            "namespaces": namespaces,
            "context": context,
        }),
    );
    let path = session
        .store
        .write(&session.cluster, DATA_COLLECTION.name, &record)?;
    session.logger.log_result_written(&path);

    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Table => {
            if !no_print {
                if let Some(set) = outcome.latest() {
                    print_measurements("Measurements", set);
                }
            }
            print_analysis(&record.analysis);
            print_success(&format!("Result written to {}", path.display()));
        }
    }

    Ok(())
}
