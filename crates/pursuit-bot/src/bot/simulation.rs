//! Monte-Carlo playouts scoring a candidate move.
//!
//! Each trial clones the snapshot, places the hidden culprit, applies the
//! candidate and plays a few rounds with simple policies on both sides:
//! the culprit samples a one-step belief lookahead, the detectives chase the
//! public belief through the coordination resolver. Trials are independent
//! and run on a fixed rayon pool, each with its own seeded `SmallRng`.

use super::coordination::{assign_moves, pursuers_in};
use super::moves::{MoveCandidate, legal_moves_in};
use super::params::BotParams;
use super::{distance_or, flag_enabled};
use pursuit_core::belief::{BeliefDistribution, BeliefEstimator, BeliefSampler, StepContext};
use pursuit_core::game::{GameState, MoveError, Side};
use pursuit_core::map::TransportGraph;
use pursuit_core::model::location::Location;
use pursuit_core::model::moves::Move;
use pursuit_core::model::role::Role;
use pursuit_core::model::tickets::Ticket;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Level, event};

const MAX_TRIALS: usize = 200;
const MAX_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub enabled: bool,
    pub depth: usize,
    pub trials: usize,
    /// Worker threads; zero lets rayon pick.
    pub threads: usize,
    pub seed: u64,
    pub capture_score: f32,
    pub exit_weight: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            depth: 3,
            trials: 50,
            threads: 4,
            seed: 0x5EED_CAFE,
            capture_score: 100.0,
            exit_weight: 0.5,
        }
    }
}

impl SimulationConfig {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base = Self::default();
        let enabled = read("PURSUIT_SIM_ENABLED")
            .map(|raw| flag_enabled(&raw))
            .unwrap_or(base.enabled);
        let depth = read("PURSUIT_SIM_DEPTH")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(base.depth);
        let trials = read("PURSUIT_SIM_TRIALS")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(base.trials);
        let threads = read("PURSUIT_SIM_THREADS")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(base.threads)
            .min(64);
        let seed = read("PURSUIT_SIM_SEED")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(base.seed);
        let capture_score = read("PURSUIT_SIM_CAPTURE_SCORE")
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(base.capture_score)
            .clamp(1.0, 1_000.0);
        let exit_weight = read("PURSUIT_SIM_EXIT_WEIGHT")
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(base.exit_weight)
            .clamp(0.0, 10.0);

        Self {
            enabled,
            depth,
            trials,
            threads,
            seed,
            capture_score,
            exit_weight,
        }
        .clamped()
    }

    /// Caps trials and depth.
    pub fn clamped(mut self) -> Self {
        self.trials = self.trials.clamp(1, MAX_TRIALS);
        self.depth = self.depth.clamp(1, MAX_DEPTH);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayoutError {
    #[error("culprit is missing from the snapshot")]
    MissingCulprit,
    #[error("no position available for the hidden culprit")]
    NoHiddenPosition,
    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Read-only inputs shared by every trial of one decision.
#[derive(Debug, Clone, Copy)]
pub struct SimulationContext<'a> {
    pub graph: &'a TransportGraph,
    pub state: &'a GameState,
    pub role: Role,
    /// Public belief about the culprit; empty when nothing was revealed yet.
    pub belief: &'a BeliefDistribution,
}

pub struct MonteCarloEvaluator {
    config: SimulationConfig,
    params: BotParams,
    estimator: BeliefEstimator,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl MonteCarloEvaluator {
    pub fn new(config: SimulationConfig, params: BotParams, estimator: BeliefEstimator) -> Self {
        let config = config.clamped();
        let pool = if config.threads == 0 {
            None
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|index| format!("pursuit-sim-{index}"))
                .build()
            {
                Ok(pool) => Some(Arc::new(pool)),
                Err(err) => {
                    event!(
                        target: "pursuit_bot::simulation",
                        Level::WARN,
                        threads = config.threads,
                        error = %err,
                        "failed to build simulation pool; using rayon's global pool"
                    );
                    None
                }
            }
        };
        Self {
            config,
            params,
            estimator,
            pool,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Mean playout score of `candidate` from the perspective of `ctx.role`.
    ///
    /// Failed playouts count as zero. Returns zero when simulation is disabled.
    pub fn evaluate(&self, ctx: &SimulationContext<'_>, candidate: &MoveCandidate) -> f32 {
        if !self.config.enabled {
            return 0.0;
        }
        let trials = self.config.trials;
        let run = || {
            (0..trials)
                .into_par_iter()
                .map(|trial| match self.playout(ctx, candidate, trial as u64) {
                    Ok(score) => score,
                    Err(err) => {
                        event!(
                            target: "pursuit_bot::simulation",
                            Level::DEBUG,
                            role = %ctx.role,
                            target_location = %candidate.target,
                            trial,
                            error = %err,
                            "playout failed; counting zero"
                        );
                        0.0
                    }
                })
                .collect::<Vec<f32>>()
        };
        let scores = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };
        scores.iter().sum::<f32>() / trials as f32
    }

    fn playout(
        &self,
        ctx: &SimulationContext<'_>,
        candidate: &MoveCandidate,
        trial: u64,
    ) -> Result<f32, PlayoutError> {
        let mut rng = SmallRng::seed_from_u64(self.config.seed.wrapping_add(trial));
        let graph = ctx.graph;
        let mut state = ctx.state.clone().with_to_move(ctx.role);

        let hidden = if ctx.role.is_culprit() {
            state
                .culprit()
                .and_then(|culprit| culprit.position())
                .ok_or(PlayoutError::MissingCulprit)?
        } else {
            determinize(graph, &state, ctx.belief, &mut rng)?
        };
        state.place_culprit(hidden);

        let mut public = ctx.belief.clone();
        let applied = candidate.to_move(ctx.role);
        let mut outcome = state.apply_move(graph, applied)?;
        if applied.role.is_culprit() {
            public = self.observe_culprit(graph, &state, &public, &applied);
        }

        let steps = self.config.depth * state.players().len();
        for _ in 0..steps {
            if outcome.is_some() {
                break;
            }
            let mover = state.to_move();
            let mv = if mover.is_culprit() {
                self.simulated_culprit_move(graph, &state, &mut rng)?
            } else {
                self.simulated_detective_move(graph, &state, &public, mover)?
            };
            outcome = state.apply_move(graph, mv)?;
            if mover.is_culprit() {
                public = self.observe_culprit(graph, &state, &public, &mv);
            }
        }

        Ok(self.score(graph, &state, ctx.role, outcome))
    }

    fn score(&self, graph: &TransportGraph, state: &GameState, role: Role, outcome: Option<Side>) -> f32 {
        let capture = self.config.capture_score;
        let detectives_view = match outcome {
            Some(Side::Detectives) => capture,
            Some(Side::Culprit) => -capture,
            None => {
                let Some(hidden) = state.culprit().and_then(|culprit| culprit.position()) else {
                    return 0.0;
                };
                let detectives = state.detective_positions();
                let distance = distance_or(graph, hidden, &detectives, self.params.unreachable_distance);
                let exits = graph.exit_count(hidden) as f32;
                -(distance + self.config.exit_weight * exits)
            }
        };
        if role.is_culprit() {
            -detectives_view
        } else {
            detectives_view
        }
    }

    /// Updates the detectives' public belief after a simulated culprit move.
    fn observe_culprit(
        &self,
        graph: &TransportGraph,
        state: &GameState,
        public: &BeliefDistribution,
        mv: &Move,
    ) -> BeliefDistribution {
        if state.is_culprit_revealed()
            && let Some(position) = state.culprit().and_then(|culprit| culprit.position())
        {
            return BeliefDistribution::certain(position, (!mv.concealed).then_some(mv.mode));
        }
        if public.is_empty() {
            return public.clone();
        }
        let mut tickets = state
            .culprit()
            .map(|culprit| *culprit.tickets())
            .unwrap_or_default();
        if let Some(ticket) = mv.travel_ticket() {
            tickets.restore(ticket);
        }
        if mv.double {
            tickets.restore(Ticket::Double);
        }
        let detectives = state.detective_positions();
        let recent = state.recent_detective_targets(self.estimator.config().recency_window);
        let step = StepContext {
            shown_mode: (!mv.concealed).then_some(mv.mode),
            tickets: &tickets,
            detectives: &detectives,
            recent_visits: &recent,
        };
        public.step(graph, &step, self.estimator.config())
    }

    fn simulated_culprit_move(
        &self,
        graph: &TransportGraph,
        state: &GameState,
        rng: &mut SmallRng,
    ) -> Result<Move, PlayoutError> {
        let culprit = state.culprit().ok_or(PlayoutError::MissingCulprit)?;
        let from = culprit.position().ok_or(PlayoutError::MissingCulprit)?;
        let detectives = state.detective_positions();
        let recent = state.recent_detective_targets(self.estimator.config().recency_window);
        let lookahead =
            self.estimator
                .lookahead(graph, from, culprit.tickets(), &detectives, &recent);

        let sampled = BeliefSampler::sample(&lookahead, rng).and_then(|target| {
            let entry = lookahead.iter().find(|entry| entry.location == target)?;
            let mode = entry.mode?;
            let ticket = culprit.tickets().payment_for(mode)?;
            Some(Move::new(Role::Culprit, mode, target).with_concealment(ticket == Ticket::Concealment))
        });
        if let Some(mv) = sampled
            && state.validate_move(graph, &mv).is_ok()
        {
            return Ok(mv);
        }
        Ok(legal_moves_in(graph, state, Role::Culprit)
            .first()
            .map(|candidate| candidate.to_move(Role::Culprit))
            .unwrap_or_else(|| Move::stay(Role::Culprit, from)))
    }

    fn simulated_detective_move(
        &self,
        graph: &TransportGraph,
        state: &GameState,
        public: &BeliefDistribution,
        mover: Role,
    ) -> Result<Move, PlayoutError> {
        let from = state
            .player(mover)
            .and_then(|player| player.position())
            .ok_or(MoveError::MissingPosition(mover))?;
        let believed = believed_locations(graph, state, public, self.estimator.config().top_k);
        let pursuers = pursuers_in(state);
        let assignments = assign_moves(graph, &pursuers, &believed, self.params.path_depth);

        if let Some(hop) = assignments.get(mover) {
            let mv = Move::new(mover, hop.mode, hop.target);
            if state.validate_move(graph, &mv).is_ok() {
                return Ok(mv);
            }
        }

        let claimed = assignments.claimed_before(mover);
        let unreachable = self.params.unreachable_distance;
        let chase = legal_moves_in(graph, state, mover)
            .into_iter()
            .filter(|candidate| !claimed.contains(&candidate.target))
            .min_by(|a, b| {
                let da = distance_or(graph, a.target, &believed, unreachable);
                let db = distance_or(graph, b.target, &believed, unreachable);
                da.total_cmp(&db)
            });
        Ok(match chase {
            Some(candidate) => candidate.to_move(mover),
            None => legal_moves_in(graph, state, mover)
                .first()
                .map(|candidate| candidate.to_move(mover))
                .unwrap_or_else(|| Move::stay(mover, from)),
        })
    }
}

/// Cells the detectives chase: the top of the public belief, or the
/// unoccupied start locations when nothing has been revealed yet.
pub fn believed_locations(
    graph: &TransportGraph,
    state: &GameState,
    belief: &BeliefDistribution,
    top_k: usize,
) -> Vec<Location> {
    if !belief.is_empty() {
        return belief.top(top_k).iter().map(|entry| entry.location).collect();
    }
    graph
        .start_locations()
        .iter()
        .copied()
        .filter(|location| !state.is_occupied_by_detective(*location))
        .collect()
}

fn determinize(
    graph: &TransportGraph,
    state: &GameState,
    belief: &BeliefDistribution,
    rng: &mut SmallRng,
) -> Result<Location, PlayoutError> {
    if let Some(location) = BeliefSampler::sample(belief, rng)
        && !state.is_occupied_by_detective(location)
    {
        return Ok(location);
    }
    let fallback = believed_locations(graph, state, &BeliefDistribution::new(), 0);
    fallback
        .choose(rng)
        .copied()
        .ok_or(PlayoutError::NoHiddenPosition)
}
