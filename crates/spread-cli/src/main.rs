//! Workload spread benchmarking CLI
//!
//! Measures how evenly the scheduler spreads workload replicas across nodes,
//! before and after an action such as a rollout restart.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{collect, run, scenarios, show};
use spread_lib::Action;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Workload spread benchmarking CLI
#[derive(Parser)]
#[command(name = "spread")]
#[command(author, version, about = "Measure how evenly workload replicas spread across cluster nodes", long_about = None)]
pub struct Cli {
    /// Kube context to use (defaults to the active context)
    #[arg(long, global = true, env = "SPREAD_CONTEXT")]
    pub context: Option<String>,

    /// Configuration file (defaults to ./spread.toml, then ~/.config/spread/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory experiment records are written to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Do not print measurement visualizations
    #[arg(long, global = true)]
    pub no_print: bool,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Measure a scenario before and after an action
    Run {
        /// Scenario name (see `spread scenarios`)
        scenario: String,

        /// Namespace holding the scenario's workloads
        #[arg(long = "namespace", short, required = true, num_args = 1..)]
        namespaces: Vec<String>,

        /// Action to perform between the two measurements
        #[arg(long, short, default_value_t = Action::None)]
        action: Action,

        /// Log the action instead of performing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Measure existing workloads once
    Collect {
        /// Namespaces to measure
        #[arg(long, num_args = 1.., default_value = "default")]
        namespaces: Vec<String>,
    },

    /// List the built-in scenarios
    Scenarios,

    /// Print a stored experiment record
    Show {
        /// Path to a record written by `run` or `collect`
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.log_json);

    if let Err(err) = execute(cli).await {
        error!(error = %format!("{:#}", err), "Command failed");
        output::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

/// Logs go to stderr so JSON output on stdout stays parseable
fn init_tracing(debug: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            // Client libraries are far too verbose at debug
            EnvFilter::new("debug,kube=info,hyper=info,tower=info")
        } else {
            EnvFilter::new("info")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scenarios => scenarios::list_scenarios(cli.format),
        Commands::Show { file } => show::show_record(&file, cli.no_print, cli.format)?,
        Commands::Run {
            scenario,
            namespaces,
            action,
            dry_run,
        } => {
            let config = load_config(cli.config.as_deref(), cli.output_dir)?;
            let args = run::RunArgs {
                scenario,
                namespaces,
                action,
                dry_run,
            };
            run::run_scenario(cli.context.as_deref(), &config, args, cli.no_print, cli.format).await?;
        }
        Commands::Collect { namespaces } => {
            let config = load_config(cli.config.as_deref(), cli.output_dir)?;
            collect::collect(cli.context.as_deref(), &config, namespaces, cli.no_print, cli.format)
                .await?;
        }
    }

    Ok(())
}

/// Load the config file and environment, then apply flag overrides
fn load_config(path: Option<&std::path::Path>, output_dir: Option<PathBuf>) -> Result<config::SpreadConfig> {
    let mut config = config::SpreadConfig::load(path)?;
    if let Some(output_dir) = output_dir {
        config.output_dir = output_dir;
    }
    Ok(config)
}
