use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use pursuit_bench::config::{BenchmarkConfig, ResolvedOutputs};
use pursuit_bench::logging::init_logging;
use pursuit_bench::tournament::TournamentRunner;
use pursuit_core::map::{MapDefinition, MapError};

/// Benchmark harness for the pursuit decision engine.
#[derive(Debug, Parser)]
#[command(
    name = "pursuit-bench",
    author,
    version,
    about = "Deterministic self-play harness for the pursuit engine"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for game setup.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of detectives per game.
    #[arg(long, value_name = "COUNT")]
    detectives: Option<usize>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,

    /// Validate a JSON map definition and exit; the configuration is not read.
    #[arg(long, value_name = "MAP")]
    validate_map: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(map_path) = cli.validate_map.as_ref() {
        return validate_map(map_path);
    }

    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(detectives) = cli.detectives {
        config.games.detectives = detectives;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let provider_count = config.providers.len();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let detectives = config.games.detectives;

    println!(
        "Loaded configuration '{run_id}' with {provider_count} provider{} ({games} games, {detectives} detectives)",
        if provider_count == 1 { "" } else { "s" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = TournamentRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: no games played.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!(
        "Culprit win rate {:.1}%, {:.2} culprit turns per game, {:.2} ms per decision",
        summary.analytics.culprit_win_rate * 100.0,
        summary.analytics.avg_culprit_turns,
        summary.analytics.average_ms_per_decision
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}

fn validate_map(path: &Path) -> anyhow::Result<()> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading map {}", path.display()))?;
    let definition = MapDefinition::from_json(&json)
        .with_context(|| format!("parsing map {}", path.display()))?;

    if let Err(err) = definition.validate() {
        if let MapError::Asymmetric(asymmetries) = &err {
            for asymmetry in asymmetries {
                eprintln!("  {asymmetry}");
            }
        }
        return Err(err).with_context(|| format!("validating map {}", path.display()));
    }

    println!(
        "Map '{}' is valid: {} locations, {} start locations",
        definition.name,
        definition.nodes.len(),
        definition.start_locations.len()
    );
    Ok(())
}
