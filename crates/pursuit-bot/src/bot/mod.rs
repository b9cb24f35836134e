mod coordination;
mod moves;
mod params;
mod simulation;

pub use coordination::{Assignments, Hop, Pursuer, assign_moves, pursuers_in};
pub use moves::{MoveCandidate, culprit_score, detective_score, legal_moves, legal_moves_in};
pub use params::BotParams;
pub use simulation::{
    MonteCarloEvaluator, PlayoutError, SimulationConfig, SimulationContext, believed_locations,
};

use pursuit_core::model::location::Location;

pub(crate) fn flag_enabled(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON")
}

/// Hop distance used for unreachable pairs so they still sort last.
pub(crate) fn distance_or(
    graph: &pursuit_core::map::TransportGraph,
    from: Location,
    targets: &[Location],
    unreachable: f32,
) -> f32 {
    graph
        .nearest_distance(from, targets)
        .map(f32::from)
        .unwrap_or(unreachable)
}
