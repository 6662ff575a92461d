use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::to_string_pretty;
use tracing_subscriber::EnvFilter;

use fleet_allocation::{Allocation, Scenario, SearchStrategy};

#[derive(Parser)]
#[command(name = "Fleet Allocation")]
#[command(version = "0.1")]
#[command(about = "Assigns an owned fleet to committed and market cargoes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the most profitable fleet allocation for a scenario
    Solve {
        /// Scenario JSON file or '-' for stdin
        input: String,

        /// Port distance table (JSON rows of from, to, distance)
        #[arg(short, long)]
        distances: Option<PathBuf>,

        /// Output JSON file or '-' for stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Override the scenario's search strategy
        #[arg(long, value_enum)]
        strategy: Option<SearchStrategy>,

        /// Override the exhaustive search candidate cap
        #[arg(long)]
        max_candidates: Option<u64>,
    },
    /// Price a single vessel on a single cargo
    Voyage {
        /// Scenario JSON file or '-' for stdin
        input: String,

        #[arg(long)]
        vessel: String,

        #[arg(long)]
        cargo: String,

        #[arg(short, long)]
        distances: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<String>,
    },
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn write_output<T: Serialize>(value: &T, output: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let output_str = to_string_pretty(value)?;

    match output.as_deref() {
        Some(path) if path != "-" => std::fs::write(path, output_str)?,
        _ => println!("{}", output_str),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            input,
            distances,
            output,
            strategy,
            max_candidates,
        } => {
            let mut scenario = Scenario::load(&input)?;
            if let Some(strategy) = strategy {
                scenario.search.strategy = strategy;
            }
            if let Some(cap) = max_candidates {
                scenario.search.max_candidates = cap;
            }

            let table = scenario.distance_table(distances.as_deref());
            let allocation = scenario.problem(&table).optimize()?;

            if let Allocation::Infeasible { reason } = &allocation {
                tracing::warn!("Scenario is infeasible: {}", reason);
            }
            write_output(&allocation, output)?;
        }
        Commands::Voyage {
            input,
            vessel,
            cargo,
            distances,
            output,
        } => {
            let scenario = Scenario::load(&input)?;
            let table = scenario.distance_table(distances.as_deref());

            let vessel = scenario.vessel(&vessel)?;
            let cargo = scenario.cargo(&cargo)?;
            let result = scenario.voyage_model(&table).evaluate(vessel, cargo);
            write_output(&result, output)?;
        }
    }

    Ok(())
}
