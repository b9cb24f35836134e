use super::{Policy, PolicyContext};
use crate::bot::{
    BotParams, MonteCarloEvaluator, MoveCandidate, SimulationConfig, SimulationContext,
    assign_moves, believed_locations, culprit_score, detective_score, pursuers_in,
};
use pursuit_core::belief::BeliefEstimator;
use pursuit_core::model::location::Location;
use pursuit_core::model::moves::Move;
use pursuit_core::model::role::Role;
use pursuit_core::model::tickets::Ticket;
use std::cmp::Ordering;
use tracing::{Level, event};

/// Static scoring + Monte-Carlo playouts + detective coordination.
pub struct HeuristicPolicy {
    params: BotParams,
    evaluator: MonteCarloEvaluator,
    coordination: bool,
    top_k: usize,
}

impl HeuristicPolicy {
    pub fn new(
        params: BotParams,
        simulation: SimulationConfig,
        estimator: BeliefEstimator,
        coordination: bool,
    ) -> Self {
        let top_k = estimator.config().top_k;
        Self {
            params,
            evaluator: MonteCarloEvaluator::new(simulation, params, estimator),
            coordination,
            top_k,
        }
    }

    pub fn params(&self) -> &BotParams {
        &self.params
    }

    /// Candidates with only the static heuristic filled in.
    pub fn annotate(&self, ctx: &PolicyContext<'_>, candidates: &[MoveCandidate]) -> Vec<MoveCandidate> {
        let detectives = ctx.state.detective_positions();
        let best_guess = self.best_guess(ctx);
        candidates
            .iter()
            .map(|candidate| {
                let mut scored = *candidate;
                scored.heuristic = if ctx.role.is_culprit() {
                    culprit_score(ctx.graph, candidate, &detectives, &self.params)
                } else {
                    detective_score(ctx.graph, candidate, best_guess, &self.params)
                };
                scored.blend(&self.params);
                scored
            })
            .collect()
    }

    /// Fully scored candidates, best first.
    pub fn rank(&self, ctx: &PolicyContext<'_>, candidates: &[MoveCandidate]) -> Vec<MoveCandidate> {
        let mut scored = self.annotate(ctx, candidates);
        if ctx.role.is_detective() && self.coordination {
            self.apply_coordination(ctx, &mut scored);
        }
        let sim = SimulationContext {
            graph: ctx.graph,
            state: ctx.state,
            role: ctx.role,
            belief: ctx.belief,
        };
        for candidate in &mut scored {
            candidate.simulation = self.evaluator.evaluate(&sim, candidate);
            candidate.blend(&self.params);
        }
        scored.sort_by(|a, b| {
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.target.cmp(&b.target))
                .then_with(|| a.mode.cmp(&b.mode))
        });
        scored
    }

    fn best_guess(&self, ctx: &PolicyContext<'_>) -> Option<Location> {
        if let Some(first) = ctx.predictions.first() {
            return Some(first.location);
        }
        let position = ctx.state.player(ctx.role)?.position()?;
        let believed = believed_locations(ctx.graph, ctx.state, ctx.belief, self.top_k);
        believed
            .into_iter()
            .filter_map(|location| Some((ctx.graph.distance(position, location)?, location)))
            .min()
            .map(|(_, location)| location)
    }

    fn apply_coordination(&self, ctx: &PolicyContext<'_>, candidates: &mut [MoveCandidate]) {
        let believed = believed_locations(ctx.graph, ctx.state, ctx.belief, self.top_k);
        let pursuers: Vec<_> = pursuers_in(ctx.state)
            .into_iter()
            .filter(|pursuer| {
                pursuer.role == ctx.role
                    || ctx
                        .state
                        .player(pursuer.role)
                        .map(|player| player.is_ai())
                        .unwrap_or(false)
            })
            .collect();
        let assignments = assign_moves(ctx.graph, &pursuers, &believed, self.params.path_depth);
        let own = assignments.get(ctx.role);
        let claimed = assignments.claimed_before(ctx.role);
        for candidate in candidates.iter_mut() {
            candidate.coordination = if claimed.contains(&candidate.target) {
                -self.params.collision_penalty
            } else if own.is_some_and(|hop| hop.target == candidate.target) {
                self.params.coordination_bonus
            } else {
                0.0
            };
        }
    }

    /// Voluntary concealment right after a reveal and a double move when a
    /// detective is adjacent. Flags the current snapshot rejects are dropped.
    fn culprit_tactics(&self, ctx: &PolicyContext<'_>, base: Move) -> Move {
        let mut mv = base;
        let Some(culprit) = ctx.state.player(Role::Culprit) else {
            return mv;
        };
        let Some(position) = culprit.position() else {
            return mv;
        };
        let tickets = culprit.tickets();

        if !mv.concealed && ctx.state.is_culprit_revealed() && tickets.count(Ticket::Concealment) > 0
        {
            mv.concealed = true;
        }

        let detectives = ctx.state.detective_positions();
        let pressed = ctx
            .graph
            .all_neighbors(position)
            .iter()
            .any(|neighbor| detectives.contains(neighbor));
        if pressed
            && !ctx.state.double_pending()
            && tickets.count(Ticket::Double) > 0
            && ctx.state.culprit_turns() + 2 <= ctx.state.max_culprit_turns()
        {
            mv.double = true;
        }

        if ctx.state.to_move() == Role::Culprit {
            for attempt in [mv, mv.with_double(false)] {
                if ctx.state.validate_move(ctx.graph, &attempt).is_ok() {
                    return attempt;
                }
            }
            return base;
        }
        mv
    }
}

impl Policy for HeuristicPolicy {
    fn choose_move(&self, ctx: &PolicyContext<'_>, candidates: &[MoveCandidate]) -> Option<Move> {
        let ranked = self.rank(ctx, candidates);
        let best = ranked.first()?;
        let mut mv = best.to_move(ctx.role);
        if ctx.role.is_culprit() {
            mv = self.culprit_tactics(ctx, mv);
        }
        log_local_decision(ctx, &ranked, &mv);
        Some(mv)
    }
}

fn log_local_decision(ctx: &PolicyContext<'_>, ranked: &[MoveCandidate], chosen: &Move) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    let preview = ranked
        .iter()
        .take(4)
        .map(|c| format!("{}@{}:{:.1}", c.mode, c.target, c.total))
        .collect::<Vec<_>>()
        .join(" ");
    event!(
        target: "pursuit_bot::engine",
        Level::DEBUG,
        role = %ctx.role,
        candidates = ranked.len(),
        top = %preview,
        chosen = %chosen,
        "local policy ranked candidates"
    );
}
