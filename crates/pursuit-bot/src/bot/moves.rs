use super::distance_or;
use super::params::BotParams;
use pursuit_core::game::GameState;
use pursuit_core::map::TransportGraph;
use pursuit_core::model::location::Location;
use pursuit_core::model::moves::Move;
use pursuit_core::model::role::Role;
use pursuit_core::model::tickets::{Ticket, TicketInventory};
use pursuit_core::model::transport::TransportMode;
use serde::Serialize;

/// One affordable edge out of the mover's position, with its score parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveCandidate {
    pub mode: TransportMode,
    pub target: Location,
    /// Set when only a concealment ticket can pay for the edge.
    pub concealed: bool,
    pub key: bool,
    pub bottleneck: bool,
    pub heuristic: f32,
    pub simulation: f32,
    pub coordination: f32,
    pub total: f32,
}

impl MoveCandidate {
    fn new(graph: &TransportGraph, mode: TransportMode, target: Location, concealed: bool) -> Self {
        Self {
            mode,
            target,
            concealed,
            key: graph.is_key(target),
            bottleneck: graph.is_bottleneck(target),
            heuristic: 0.0,
            simulation: 0.0,
            coordination: 0.0,
            total: 0.0,
        }
    }

    pub fn to_move(&self, role: Role) -> Move {
        Move::new(role, self.mode, self.target).with_concealment(self.concealed)
    }

    /// Recomputes `total` from the component scores.
    pub fn blend(&mut self, params: &BotParams) {
        self.total = self.heuristic + params.simulation_weight * self.simulation + self.coordination;
    }

    pub fn matches(&self, mode: TransportMode, target: Location) -> bool {
        self.mode == mode && self.target == target
    }
}

/// Every edge out of `position` that the inventory can pay for.
///
/// A candidate is marked concealed when the matching ticket is exhausted and a
/// concealment ticket covers it. Unknown positions yield no candidates.
pub fn legal_moves(
    graph: &TransportGraph,
    position: Location,
    tickets: &TicketInventory,
) -> Vec<MoveCandidate> {
    graph
        .edges(position)
        .filter_map(|(mode, target)| {
            let ticket = tickets.payment_for(mode)?;
            Some(MoveCandidate::new(
                graph,
                mode,
                target,
                ticket == Ticket::Concealment,
            ))
        })
        .collect()
}

/// Legal candidates for `role` in a snapshot; cells held by detectives are excluded.
pub fn legal_moves_in(graph: &TransportGraph, state: &GameState, role: Role) -> Vec<MoveCandidate> {
    let Some(player) = state.player(role) else {
        return Vec::new();
    };
    let Some(position) = player.position() else {
        return Vec::new();
    };
    let mut candidates = legal_moves(graph, position, player.tickets());
    candidates.retain(|candidate| !state.is_occupied_by_detective(candidate.target));
    candidates
}

/// Pursuer score: bottleneck bonus minus hop distance to the best guess.
pub fn detective_score(
    graph: &TransportGraph,
    candidate: &MoveCandidate,
    best_guess: Option<Location>,
    params: &BotParams,
) -> f32 {
    let bonus = if candidate.bottleneck {
        params.bottleneck_bonus
    } else {
        0.0
    };
    let distance = match best_guess {
        Some(guess) => distance_or(graph, candidate.target, &[guess], params.unreachable_distance),
        None => 0.0,
    };
    bonus - distance
}

/// Evader score: bottleneck penalty plus hop distance to the nearest detective.
pub fn culprit_score(
    graph: &TransportGraph,
    candidate: &MoveCandidate,
    detectives: &[Location],
    params: &BotParams,
) -> f32 {
    let penalty = if candidate.bottleneck {
        params.bottleneck_bonus
    } else {
        0.0
    };
    let distance = if detectives.is_empty() {
        0.0
    } else {
        distance_or(graph, candidate.target, detectives, params.unreachable_distance)
    };
    distance - penalty
}
