//! Display of stored experiment records

use anyhow::{Context, Result};
use colored::Colorize;
use spread_lib::ResultStore;
use std::path::Path;

use crate::output::{print_analysis, print_json, print_measurements, OutputFormat};

/// Print a stored experiment record
pub fn show_record(path: &Path, no_print: bool, format: OutputFormat) -> Result<()> {
    let record = ResultStore::read(path)
        .with_context(|| format!("Failed to read experiment record {}", path.display()))?;

    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Table => {
            println!("{}", "Experiment Record".bold());
            println!("{}", "=".repeat(50));
            println!("Cluster:                {}", record.cluster.cyan());
            println!("Timestamp:              {}", record.timestamp.to_rfc3339());
            if let Some(elapsed) = &record.elapsed_time {
                println!("Elapsed:                {}", elapsed);
            }
            if let Some(args) = record.args.as_object() {
                for (key, value) in args {
                    println!("{:<24}{}", format!("{}:", key), value);
                }
            }
            println!();

            if !no_print {
                for (index, set) in record.measurements.iter().enumerate() {
                    print_measurements(&format!("Measurement {}", index + 1), set);
                }
            }
            print_analysis(&record.analysis);
        }
    }

    Ok(())
}
