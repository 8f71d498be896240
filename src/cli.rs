//! Command-line interface: the analysis pipeline stages and the results server.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::api::{serve, ApiServerConfig, ApiState, AppData, DataPaths};
use crate::core::PriceSeries;
use crate::ingest::events::{curated_events, load_events_csv, write_events_csv};
use crate::ingest::prices::{load_processed_json, load_raw_prices, write_processed_json};
use crate::model::{detect_changepoint, SamplerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "brent-changepoint",
    version,
    about = "Bayesian change-point analysis of Brent crude log-returns, with a read-only results API"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Preprocess the raw Brent price CSV into the processed-series artifact.
    Preprocess {
        /// Raw `Date,Price` CSV.
        #[arg(long, default_value = "data/BrentOilPrices.csv")]
        input: PathBuf,
        /// Processed-series JSON artifact.
        #[arg(long, default_value = "results/oil_price_data_processed.json")]
        output: PathBuf,
    },
    /// Write the built-in curated historical event list to CSV.
    CompileEvents {
        #[arg(long, default_value = "data/key_events.csv")]
        output: PathBuf,
    },
    /// Run the change-point inference and write the summary artifact.
    Analyze {
        /// Processed-series JSON artifact.
        #[arg(long, default_value = "results/oil_price_data_processed.json")]
        input: PathBuf,
        /// Curated events CSV, used for event association.
        #[arg(long, default_value = "data/key_events.csv")]
        events: PathBuf,
        /// Change-point summary artifact.
        #[arg(long, default_value = "results/detected_change_points.json")]
        output: PathBuf,
        /// Kept posterior draws per chain.
        #[arg(long, default_value_t = 2000)]
        draws: usize,
        /// Tuning sweeps per chain.
        #[arg(long, default_value_t = 1000)]
        tune: usize,
        /// Number of chains.
        #[arg(long, default_value_t = 2)]
        chains: usize,
        /// Random seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Serve the precomputed artifacts over HTTP.
    Serve {
        /// Listen address.
        #[arg(long, default_value = "127.0.0.1:5000")]
        listen: String,
        /// Directory holding the analysis artifacts.
        #[arg(long, default_value = "results")]
        results_dir: PathBuf,
        /// Curated events CSV.
        #[arg(long, default_value = "data/key_events.csv")]
        events: PathBuf,
    },
}

impl Cli {
    /// Dispatch the selected subcommand.
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Preprocess { input, output } => run_preprocess(&input, &output),
            Commands::CompileEvents { output } => run_compile_events(&output),
            Commands::Analyze {
                input,
                events,
                output,
                draws,
                tune,
                chains,
                seed,
            } => run_analyze(&input, &events, &output, draws, tune, chains, seed),
            Commands::Serve {
                listen,
                results_dir,
                events,
            } => run_serve(listen, &results_dir, &events).await,
        }
    }
}

fn run_preprocess(input: &PathBuf, output: &PathBuf) -> anyhow::Result<()> {
    let series = load_raw_prices(input)
        .with_context(|| format!("loading raw prices from {}", input.display()))?;
    info!(observations = series.len(), "raw prices loaded");

    write_processed_json(&series, output)
        .with_context(|| format!("writing processed series to {}", output.display()))?;
    info!(path = %output.display(), "processed series written");
    Ok(())
}

fn run_compile_events(output: &PathBuf) -> anyhow::Result<()> {
    let events = curated_events();
    write_events_csv(&events, output)
        .with_context(|| format!("writing events to {}", output.display()))?;
    info!(events = events.len(), path = %output.display(), "key events compiled");
    Ok(())
}

fn run_analyze(
    input: &PathBuf,
    events_path: &PathBuf,
    output: &PathBuf,
    draws: usize,
    tune: usize,
    chains: usize,
    seed: u64,
) -> anyhow::Result<()> {
    let records = load_processed_json(input)
        .with_context(|| format!("loading processed series from {}", input.display()))?;
    let series = PriceSeries::from_records(&records)?;
    info!(observations = series.len(), "processed series loaded");

    let events = match load_events_csv(events_path) {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(
                path = %events_path.display(),
                error = %e,
                "events unavailable, skipping event association"
            );
            Vec::new()
        }
    };

    let config = SamplerConfig::new(draws)
        .with_tune(tune)
        .with_chains(chains)
        .with_seed(seed);
    info!(draws, tune, chains, seed, "sampling posterior");

    let summary = detect_changepoint(&series, &events, &config)?;
    info!(
        change_point_date = %summary.change_point_date,
        prob_vol_increase = summary.prob_vol_increase,
        "change point detected"
    );

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::io::BufWriter::new(std::fs::File::create(output)?);
    serde_json::to_writer_pretty(file, &summary)?;
    info!(path = %output.display(), "change-point summary written");
    Ok(())
}

async fn run_serve(listen: String, results_dir: &PathBuf, events: &PathBuf) -> anyhow::Result<()> {
    let paths = DataPaths::new(results_dir, events);
    let state = ApiState::new(AppData::load(&paths));
    let config = ApiServerConfig {
        listen_addr: listen,
    };
    serve(&config, state).await.context("running the API server")?;
    Ok(())
}
