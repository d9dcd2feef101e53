use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use openbach_scenario_builder::api::config_dto::BuilderConfigDto;
use openbach_scenario_builder::loader::parser::parse_json_file;
use openbach_scenario_builder::scenarios::network_delay;
use openbach_scenario_builder::{build_traffic_mix, load_job_registry, logger};

/// Builds OpenBACH scenario descriptions and prints them as JSON
#[derive(Parser)]
#[command(name = "scenario_builder")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Builder configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Entity running the post-processing jobs; no plots when absent
    #[arg(long, global = true)]
    post_processing_entity: Option<String>,

    /// Print the description on a single line
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the traffics of a dependency file
    TrafficMix {
        /// Path to the traffic dependency file
        traffic_file: PathBuf,
    },

    /// Compare fping and hping RTT measurements
    NetworkDelay {
        /// Entity running both measurements
        #[arg(long)]
        client: String,

        #[arg(long)]
        ip_dst: String,

        /// Seconds
        #[arg(long, default_value_t = 60)]
        duration: u64,

        /// Run hping after fping instead of alongside
        #[arg(long)]
        sequential: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init();

    let config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            parse_json_file::<BuilderConfigDto>(&path).with_context(|| format!("failed to load configuration '{}'", path))?
        }
        None => BuilderConfigDto::default(),
    };
    let registry = load_job_registry(&config).context("failed to load job registry")?;
    let post_processing_entity = cli.post_processing_entity.as_deref();

    let scenario = match cli.command {
        Commands::TrafficMix { traffic_file } => {
            let path = traffic_file.to_string_lossy();
            build_traffic_mix(&path, registry, post_processing_entity).with_context(|| format!("failed to build traffic mix from '{}'", path))?
        }
        Commands::NetworkDelay { client, ip_dst, duration, sequential } => {
            network_delay::build(registry, &client, &ip_dst, duration, !sequential, post_processing_entity).context("failed to build network delay scenario")?
        }
    };

    let description = if cli.compact { scenario.to_json()? } else { scenario.to_json_pretty()? };
    println!("{}", description);
    Ok(())
}
