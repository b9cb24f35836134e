mod metrics;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pursuit_bot::{DecisionEngine, legal_moves_in};
use pursuit_core::game::{GameSetup, GameState, SetupError, Side};
use pursuit_core::map::{MapDefinition, MapError, TransportGraph};
use pursuit_core::model::moves::Move;
use pursuit_core::model::role::Role;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use crate::config::{BenchmarkConfig, ResolvedOutputs};
use crate::logging::telemetry_path;

pub use metrics::DecisionSummary;
use metrics::DecisionMetrics;

/// Spare plies allowed beyond a full-length game before a game is cut off.
const PLY_SLACK: usize = 16;

/// Plays seeded games with every seat driven by one decision engine.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    graph: Arc<TransportGraph>,
    engine: DecisionEngine,
    setup: GameSetup,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub analytics: AnalyticsSummary,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

/// Result of one finished (or cut off) game.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub game_index: usize,
    pub seed: u64,
    pub winner: Option<Side>,
    pub culprit_turns: u32,
    pub moves: usize,
    /// Engine moves that failed re-validation and were replaced.
    pub corrections: usize,
    pub decisions: DecisionSummary,
}

/// Reads and fully validates a map, or returns the bundled demo map.
pub fn load_map(path: Option<&Path>) -> Result<MapDefinition, RunnerError> {
    let definition = match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            MapDefinition::from_json(&json)?
        }
        None => MapDefinition::builtin()?,
    };
    definition.validate()?;
    Ok(definition)
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let definition = load_map(config.map.as_deref())?;
        let graph = Arc::new(TransportGraph::from_definition(&definition)?);

        let needed = config.games.detectives + 1;
        if graph.start_locations().len() < needed {
            return Err(SetupError::NotEnoughStarts {
                needed,
                available: graph.start_locations().len(),
            }
            .into());
        }

        let engine = config.providers.iter().fold(
            DecisionEngine::new(Arc::clone(&graph), config.engine.engine_config()),
            |engine, provider| engine.with_provider(Box::new(provider.build())),
        );

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            setup: config.games.setup(),
            config,
            outputs,
            graph,
            engine,
        })
    }

    pub fn graph(&self) -> &TransportGraph {
        &self.graph
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Execute every game, streaming one JSONL row per game to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config, self.graph.name());

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();
            let outcome = self.play_game(game_index, game_seed)?;
            analytics.record_game(&outcome);
            write_game_row(&mut writer, &self.config, self.graph.name(), &outcome)?;
            rows_written += 1;
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry = self
            .logging_enabled
            .then(|| telemetry_path(&self.outputs, &self.config.run_id));

        Ok(RunSummary {
            games_played: self.config.games.count,
            rows_written,
            analytics: summary,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path: telemetry,
        })
    }

    /// Deals and plays a single game to completion.
    pub fn play_game(&self, game_index: usize, game_seed: u64) -> Result<GameOutcome, RunnerError> {
        let graph = self.graph.as_ref();
        let mut state = self.setup.deal_with_seed(graph, game_seed)?;
        let mut metrics = DecisionMetrics::default();
        let mut corrections = 0usize;
        let mut moves = 0usize;
        let ply_limit = self.ply_limit();

        while !state.is_finished() && moves < ply_limit {
            let role = state.to_move();
            let outcome = self.engine.decide(&state, role);
            metrics.record(&outcome);

            let mv = match state.validate_move(graph, &outcome.mv) {
                Ok(()) => outcome.mv,
                Err(err) => {
                    corrections += 1;
                    let replacement = replacement_move(graph, &state, role).ok_or_else(|| {
                        RunnerError::game(format!("game {game_index}: {role} has no position"))
                    })?;
                    event!(
                        target: "pursuit_bench::game",
                        Level::WARN,
                        run_id = %self.config.run_id,
                        game_index = game_index as u32,
                        role = %role,
                        rejected = %outcome.mv,
                        replacement = %replacement,
                        error = %err,
                        "engine move failed validation"
                    );
                    replacement
                }
            };

            if self.logging_enabled && tracing::enabled!(Level::INFO) {
                event!(
                    target: "pursuit_bench::game",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    game_index = game_index as u32,
                    ply = moves as u32,
                    role = %role,
                    mv = %mv,
                    source = ?outcome.source,
                    candidates = outcome.candidates as u32,
                    elapsed_ms = outcome.elapsed_ms
                );
            }

            state.apply_move(graph, mv).map_err(|err| {
                RunnerError::game(format!("game {game_index}: move {mv} rejected: {err}"))
            })?;
            moves += 1;
        }

        if !state.is_finished() {
            event!(
                target: "pursuit_bench::game",
                Level::WARN,
                run_id = %self.config.run_id,
                game_index = game_index as u32,
                plies = moves as u32,
                "game cut off before a winner was decided"
            );
        }

        let outcome = GameOutcome {
            game_index,
            seed: game_seed,
            winner: state.winner(),
            culprit_turns: state.culprit_turns(),
            moves,
            corrections,
            decisions: metrics.finalize(),
        };

        if self.logging_enabled {
            event!(
                target: "pursuit_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = game_index as u32,
                winner = ?outcome.winner,
                culprit_turns = outcome.culprit_turns,
                plies = moves as u32,
                "game finished"
            );
        }

        Ok(outcome)
    }

    fn ply_limit(&self) -> usize {
        let turns = self.setup.max_culprit_turns as usize + 1;
        turns * (self.setup.detectives + 1) * 2 + PLY_SLACK
    }
}

/// First legal candidate for `role`, or a stay when it has none.
fn replacement_move(graph: &TransportGraph, state: &GameState, role: Role) -> Option<Move> {
    if let Some(candidate) = legal_moves_in(graph, state, role).first() {
        return Some(candidate.to_move(role));
    }
    let position = state.player(role)?.position()?;
    Some(Move::stay(role, position))
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    map: &str,
    outcome: &GameOutcome,
) -> Result<(), RunnerError> {
    let decisions = &outcome.decisions;
    let row = GameLogRow {
        run_id: &config.run_id,
        game_id: format!("G{:05}", outcome.game_index),
        game_index: outcome.game_index,
        game_seed: outcome.seed,
        map,
        detectives: config.games.detectives,
        winner: outcome.winner,
        culprit_turns: outcome.culprit_turns,
        moves: outcome.moves,
        corrections: outcome.corrections,
        decisions: decisions.decisions,
        provider_decisions: decisions.provider_decisions(),
        local_decisions: decisions.local,
        safe_default_decisions: decisions.safe_default,
        provider_failures: decisions.provider_failures,
        speed_ms_turn: decisions.avg_ms_per_decision,
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_id: String,
    game_index: usize,
    game_seed: u64,
    map: &'a str,
    detectives: usize,
    winner: Option<Side>,
    culprit_turns: u32,
    moves: usize,
    corrections: usize,
    decisions: u32,
    provider_decisions: u32,
    local_decisions: u32,
    safe_default_decisions: u32,
    provider_failures: u32,
    speed_ms_turn: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("map error: {0}")]
    Map(#[from] MapError),
    #[error("game setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}
