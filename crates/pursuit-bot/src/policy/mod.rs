mod heuristic;

pub use heuristic::HeuristicPolicy;

use crate::bot::MoveCandidate;
use pursuit_core::belief::{BeliefDistribution, BeliefEntry};
use pursuit_core::game::GameState;
use pursuit_core::map::TransportGraph;
use pursuit_core::model::moves::Move;
use pursuit_core::model::role::Role;

/// Context provided to policies for decision-making
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub graph: &'a TransportGraph,
    pub state: &'a GameState,
    pub role: Role,
    /// Full public belief about the culprit.
    pub belief: &'a BeliefDistribution,
    /// Ranked, truncated view of `belief`.
    pub predictions: &'a [BeliefEntry],
}

/// Local decision-making used when no provider produced a move
pub trait Policy: Send + Sync {
    /// Picks one of `candidates`; `None` only when `candidates` is empty.
    fn choose_move(&self, ctx: &PolicyContext<'_>, candidates: &[MoveCandidate]) -> Option<Move>;
}
