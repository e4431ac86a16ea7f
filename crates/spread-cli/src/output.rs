//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use spread_lib::{AnalysisRecord, DistributionStatistics, MeasurementSet, ScaleDirection};
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// One bar per node, smallest first. Even bars mean an even spread.
pub fn distribution_graph(stats: &DistributionStatistics) -> String {
    stats
        .per_node_counts()
        .iter()
        .enumerate()
        .map(|(index, &count)| format!("  Node {:02}: {} ({} pods)", index, "#".repeat(count as usize), count))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Nodes grouped by how many replicas they host. Fewer rows mean a more
/// even spread.
pub fn node_count_graph(stats: &DistributionStatistics) -> String {
    let mut nodes_by_count: BTreeMap<u32, usize> = BTreeMap::new();
    for &count in stats.per_node_counts() {
        *nodes_by_count.entry(count).or_insert(0) += 1;
    }

    nodes_by_count
        .into_iter()
        .map(|(count, nodes)| format!("  {:02} pods: {} ({} nodes)", count, "#".repeat(nodes), nodes))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print every workload of a measurement pass with its bar graphs
pub fn print_measurements(title: &str, set: &MeasurementSet) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
    println!("Captured:               {}", set.timestamp().to_rfc3339());
    println!("Cluster:                {}", set.cluster().to_string().cyan());
    println!();

    if set.deployments().is_empty() {
        print_warning("No workloads measured");
        return;
    }

    for (name, stats) in set.deployments() {
        println!(
            "[{}] {} pods spread across {} nodes",
            name.cyan(),
            stats.total_replicas(),
            stats.nodes_used()
        );
        println!("{}", distribution_graph(stats));
        println!("{}", "Nodes grouped by pod count:".dimmed());
        println!("{}", node_count_graph(stats));
        println!(
            "  skew {}  ratio {:.3}  cv {:.3}  gini {}  jain {}",
            stats.skew(),
            stats.skew_ratio(),
            stats.coefficient_of_variation(),
            color_gini(stats.gini_coefficient()),
            color_jain(stats.jain_fairness_index())
        );
        println!();
    }
}

/// Row for the analysis summary table
#[derive(Tabled, Serialize)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Median")]
    median: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
}

impl MetricRow {
    fn new(metric: &'static str, mean: f64, median: f64, min: Option<f64>, max: Option<f64>) -> Self {
        let cell = |value: Option<f64>| value.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "-".to_string());
        Self {
            metric,
            mean: format!("{:.3}", mean),
            median: format!("{:.3}", median),
            min: cell(min),
            max: cell(max),
        }
    }
}

pub fn metric_rows(analysis: &AnalysisRecord) -> Vec<MetricRow> {
    let a = analysis;
    vec![
        MetricRow::new("Jain fairness index", a.jain_fairness_index_mean, a.jain_fairness_index_median, None, None),
        MetricRow::new(
            "Coefficient of variation",
            a.coefficient_of_variation_mean,
            a.coefficient_of_variation_median,
            None,
            None,
        ),
        MetricRow::new("Gini coefficient", a.gini_coefficient_mean, a.gini_coefficient_median, None, None),
        MetricRow::new("Node skew", a.node_skew_mean, a.node_skew_median, None, Some(a.node_skew_max)),
        MetricRow::new(
            "Node skew ratio",
            a.node_skew_ratio_mean,
            a.node_skew_ratio_median,
            None,
            Some(a.node_skew_ratio_max),
        ),
        MetricRow::new(
            "Nodes used",
            a.nodes_used_mean,
            a.nodes_used_median,
            Some(a.nodes_used_min),
            Some(a.nodes_used_max),
        ),
    ]
}

/// Print the scale change and the aggregate table
pub fn print_analysis(analysis: &AnalysisRecord) {
    println!("{}", "Analysis".bold());
    println!("{}", "=".repeat(50));

    let direction = analysis.scale_direction.unwrap_or(ScaleDirection::Unknown);
    let amount = analysis
        .scale_amount
        .map(|a| format!("{:+}", a))
        .unwrap_or_else(|| "-".to_string());
    let percentage = analysis
        .scale_percentage
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "Scale:                  {} ({} nodes, {})",
        color_direction(direction),
        amount,
        percentage
    );
    println!("Workloads analyzed:     {}", analysis.workloads_analyzed);
    println!();

    if analysis.workloads_analyzed == 0 {
        print_warning("No test workloads found, aggregates are zero");
        return;
    }

    let table = Table::new(metric_rows(analysis))
        .with(Style::rounded())
        .to_string();
    println!("{}", table);
}

/// Color scale direction
pub fn color_direction(direction: ScaleDirection) -> String {
    match direction {
        ScaleDirection::Up => direction.as_str().green().to_string(),
        ScaleDirection::Down => direction.as_str().yellow().to_string(),
        ScaleDirection::Unchanged => direction.as_str().to_string(),
        ScaleDirection::Unknown => direction.as_str().dimmed().to_string(),
    }
}

/// Color Jain's index; 1 is perfectly fair
pub fn color_jain(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    if value >= 0.9 {
        formatted.green().to_string()
    } else if value >= 0.7 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color the Gini coefficient; 0 is perfectly even
pub fn color_gini(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    if value <= 0.1 {
        formatted.green().to_string()
    } else if value <= 0.3 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}
