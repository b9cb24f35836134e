//! Reveal seeding and per-turn propagation of the culprit belief.

use super::distribution::{BeliefDistribution, BeliefEntry};
use crate::game::GameState;
use crate::map::TransportGraph;
use crate::model::location::Location;
use crate::model::role::Role;
use crate::model::tickets::{Ticket, TicketInventory};
use crate::model::transport::TransportMode;

/// Tunable weights and thresholds for belief propagation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeliefConfig {
    /// Weight of the normalized distance to the nearest detective.
    pub distance_weight: f32,
    /// Weight of the normalized exit count of the target.
    pub exit_weight: f32,
    /// Weight granted to targets no detective visited recently.
    pub recency_weight: f32,
    /// Added to every desirability so no edge is ever assigned zero mass.
    pub weight_floor: f32,
    /// Entries below this probability are pruned.
    pub negligible: f32,
    /// Number of most recent detective moves considered "recent".
    pub recency_window: usize,
    /// Size of the ranked prediction list.
    pub top_k: usize,
}

impl Default for BeliefConfig {
    fn default() -> Self {
        Self {
            distance_weight: 0.5,
            exit_weight: 0.3,
            recency_weight: 0.2,
            weight_floor: 0.05,
            negligible: 0.01,
            recency_window: 10,
            top_k: 5,
        }
    }
}

impl BeliefConfig {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base = Self::default();
        let distance_weight = read_f32(&mut read, "PURSUIT_BELIEF_DISTANCE_WEIGHT")
            .unwrap_or(base.distance_weight)
            .clamp(0.0, 1.0);
        let exit_weight = read_f32(&mut read, "PURSUIT_BELIEF_EXIT_WEIGHT")
            .unwrap_or(base.exit_weight)
            .clamp(0.0, 1.0);
        let recency_weight = read_f32(&mut read, "PURSUIT_BELIEF_RECENCY_WEIGHT")
            .unwrap_or(base.recency_weight)
            .clamp(0.0, 1.0);
        let weight_floor = read_f32(&mut read, "PURSUIT_BELIEF_FLOOR")
            .unwrap_or(base.weight_floor)
            .clamp(0.001, 1.0);
        let negligible = read_f32(&mut read, "PURSUIT_BELIEF_NEGLIGIBLE")
            .unwrap_or(base.negligible)
            .clamp(0.0, 0.2);
        let recency_window = read("PURSUIT_BELIEF_RECENCY_WINDOW")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(base.recency_window)
            .min(64);
        let top_k = read("PURSUIT_BELIEF_TOP_K")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(base.top_k)
            .clamp(1, 32);

        Self {
            distance_weight,
            exit_weight,
            recency_weight,
            weight_floor,
            negligible,
            recency_window,
            top_k,
        }
    }
}

fn read_f32<F>(read: &mut F, key: &str) -> Option<f32>
where
    F: FnMut(&str) -> Option<String>,
{
    read(key)
        .and_then(|raw| raw.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite())
}

/// Public information available for one propagation step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Mode shown for the move; `None` when it was concealed.
    pub shown_mode: Option<TransportMode>,
    /// Inventory the culprit held before the move.
    pub tickets: &'a TicketInventory,
    pub detectives: &'a [Location],
    pub recent_visits: &'a [Location],
}

impl StepContext<'_> {
    fn admits(&self, mode: TransportMode) -> bool {
        let affordable = self.tickets.payment_for(mode).is_some();
        match self.shown_mode {
            Some(shown) => shown == mode && affordable,
            None => affordable,
        }
    }
}

impl BeliefDistribution {
    /// Advances the distribution by one culprit move.
    ///
    /// Mass on each source spreads over its admissible edges in proportion to
    /// the desirability of each target. Sources without a usable edge keep
    /// their mass. Cells held by detectives are cleared, then the result is
    /// pruned and renormalized. If clearing or pruning would remove every
    /// entry, the last non-empty intermediate is kept instead.
    pub fn step(
        &self,
        graph: &TransportGraph,
        ctx: &StepContext<'_>,
        config: &BeliefConfig,
    ) -> BeliefDistribution {
        let mut spread = BeliefDistribution::new();
        for entry in self.iter() {
            let edges: Vec<(TransportMode, Location)> = graph
                .edges(entry.location)
                .filter(|(mode, _)| ctx.admits(*mode))
                .collect();
            if edges.is_empty() {
                spread.add_mass(entry.location, entry.probability, entry.mode);
                continue;
            }
            let weights = desirability(graph, &edges, ctx, config);
            let total: f32 = weights.iter().sum();
            for ((mode, target), weight) in edges.iter().zip(&weights) {
                let share = if total > 0.0 {
                    weight / total
                } else {
                    1.0 / edges.len() as f32
                };
                spread.add_mass(*target, entry.probability * share, Some(*mode));
            }
        }

        let mut cleared = spread.clone();
        for detective in ctx.detectives {
            cleared.remove(*detective);
        }
        let mut pruned = cleared.clone();
        pruned.prune(config.negligible);

        for mut candidate in [pruned, cleared, spread] {
            if candidate.renormalize() {
                return candidate;
            }
        }
        self.clone()
    }
}

fn desirability(
    graph: &TransportGraph,
    edges: &[(TransportMode, Location)],
    ctx: &StepContext<'_>,
    config: &BeliefConfig,
) -> Vec<f32> {
    let distances: Vec<Option<u8>> = edges
        .iter()
        .map(|(_, target)| graph.nearest_distance(*target, ctx.detectives))
        .collect();
    let max_distance = distances.iter().flatten().copied().max().unwrap_or(0);
    let max_exits = edges
        .iter()
        .map(|(_, target)| graph.exit_count(*target))
        .max()
        .unwrap_or(0);

    edges
        .iter()
        .zip(&distances)
        .map(|((_, target), distance)| {
            let distance_term = match distance {
                Some(_) if max_distance == 0 => 0.0,
                Some(d) => f32::from(*d) / f32::from(max_distance),
                None => 1.0,
            };
            let exit_term = if max_exits == 0 {
                0.0
            } else {
                graph.exit_count(*target) as f32 / max_exits as f32
            };
            let recency_term = if ctx.recent_visits.contains(target) {
                0.0
            } else {
                1.0
            };
            config.distance_weight * distance_term
                + config.exit_weight * exit_term
                + config.recency_weight * recency_term
                + config.weight_floor
        })
        .collect()
}

/// Reconstructs the culprit belief from a game snapshot.
#[derive(Debug, Clone, Default)]
pub struct BeliefEstimator {
    config: BeliefConfig,
}

impl BeliefEstimator {
    pub fn new(config: BeliefConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(BeliefConfig::from_env())
    }

    pub fn config(&self) -> &BeliefConfig {
        &self.config
    }

    /// Full working distribution: seeded at the last reveal and propagated
    /// once per culprit move since. Empty when no reveal has happened yet.
    pub fn distribution(&self, graph: &TransportGraph, state: &GameState) -> BeliefDistribution {
        let Some(reveal) = state.last_reveal() else {
            return BeliefDistribution::new();
        };
        let seed_mode = (reveal.turn as usize)
            .checked_sub(1)
            .and_then(|index| state.culprit_moves().nth(index))
            .filter(|mv| !mv.concealed)
            .map(|mv| mv.mode);
        let mut belief = BeliefDistribution::certain(reveal.location, seed_mode);

        let pending = state.culprit_moves_since_reveal();
        if pending.is_empty() {
            return belief;
        }

        let detectives = state.detective_positions();
        let recent = state.recent_detective_targets(self.config.recency_window);
        let mut tickets = state
            .player(Role::Culprit)
            .map(|culprit| *culprit.tickets())
            .unwrap_or_else(|| TicketInventory::culprit_default(detectives.len()));
        for mv in &pending {
            if let Some(ticket) = mv.travel_ticket() {
                tickets.restore(ticket);
            }
            if mv.double {
                tickets.restore(Ticket::Double);
            }
        }

        for mv in &pending {
            let ctx = StepContext {
                shown_mode: (!mv.concealed).then_some(mv.mode),
                tickets: &tickets,
                detectives: &detectives,
                recent_visits: &recent,
            };
            belief = belief.step(graph, &ctx, &self.config);
            if let Some(ticket) = mv.travel_ticket() {
                let _ = tickets.consume(ticket);
            }
            if mv.double {
                let _ = tickets.consume(Ticket::Double);
            }
        }
        belief
    }

    /// Ranked prediction of the culprit position.
    ///
    /// Returns at most `top_k` entries above the negligible threshold,
    /// renormalized to sum to one. A culprit revealed on the latest turn
    /// yields a single certain entry.
    pub fn predict_locations(&self, graph: &TransportGraph, state: &GameState) -> Vec<BeliefEntry> {
        let belief = self.distribution(graph, state);
        let kept = belief
            .top(self.config.top_k)
            .into_iter()
            .filter(|entry| entry.probability >= self.config.negligible);
        let mut trimmed = BeliefDistribution::from_entries(kept);
        if !trimmed.renormalize() {
            return Vec::new();
        }
        trimmed.ranked()
    }

    /// One-step lookahead from a known culprit position, using the
    /// culprit's current inventory and any affordable mode.
    pub fn lookahead(
        &self,
        graph: &TransportGraph,
        from: Location,
        tickets: &TicketInventory,
        detectives: &[Location],
        recent_visits: &[Location],
    ) -> BeliefDistribution {
        let ctx = StepContext {
            shown_mode: None,
            tickets,
            detectives,
            recent_visits,
        };
        BeliefDistribution::certain(from, None).step(graph, &ctx, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::moves::Move;
    use crate::model::player::Player;

    fn loc(id: u16) -> Location {
        Location::new(id)
    }

    fn graph() -> TransportGraph {
        TransportGraph::builtin().expect("demo map")
    }

    fn state_with(culprit_at: u16, detective_at: u16, history: Vec<Move>) -> GameState {
        GameState::new(vec![
            Player::new(Role::Culprit, loc(culprit_at), TicketInventory::culprit_default(1)),
            Player::new(
                Role::Detective(1),
                loc(detective_at),
                TicketInventory::detective_default(),
            ),
        ])
        .with_history(history)
    }

    fn culprit(mode: TransportMode, to: u16) -> Move {
        Move::new(Role::Culprit, mode, loc(to))
    }

    fn detective(to: u16) -> Move {
        Move::new(Role::Detective(1), TransportMode::Taxi, loc(to))
    }

    #[test]
    fn reads_thresholds_from_reader() {
        let config = BeliefConfig::from_reader(|key| match key {
            "PURSUIT_BELIEF_TOP_K" => Some("3".into()),
            "PURSUIT_BELIEF_NEGLIGIBLE" => Some("9.0".into()),
            "PURSUIT_BELIEF_DISTANCE_WEIGHT" => Some("nan".into()),
            _ => None,
        });
        assert_eq!(config.top_k, 3);
        assert!((config.negligible - 0.2).abs() < 1e-6);
        assert!((config.distance_weight - 0.5).abs() < 1e-6);
    }

    #[test]
    fn no_reveal_yields_empty_prediction() {
        let graph = graph();
        let state = state_with(46, 13, vec![culprit(TransportMode::Taxi, 46)]);
        let estimator = BeliefEstimator::default();
        assert!(estimator.distribution(&graph, &state).is_empty());
        assert!(estimator.predict_locations(&graph, &state).is_empty());
    }

    #[test]
    fn reveal_on_latest_turn_is_certain() {
        let graph = graph();
        let history = vec![
            culprit(TransportMode::Taxi, 80),
            detective(14),
            culprit(TransportMode::Taxi, 90),
            detective(15),
            culprit(TransportMode::Taxi, 89),
        ];
        let state = state_with(89, 15, history);
        let prediction = BeliefEstimator::default().predict_locations(&graph, &state);
        assert_eq!(prediction.len(), 1);
        assert_eq!(prediction[0].location, loc(89));
        assert!((prediction[0].probability - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shown_mode_restricts_propagation() {
        let graph = graph();
        let history = vec![
            culprit(TransportMode::Taxi, 80),
            detective(14),
            culprit(TransportMode::Taxi, 90),
            detective(15),
            culprit(TransportMode::Taxi, 89),
            detective(16),
            culprit(TransportMode::Underground, 56),
        ];
        let state = state_with(56, 16, history);
        let belief = BeliefEstimator::default().distribution(&graph, &state);
        let mut locations = belief.locations();
        locations.sort();
        assert_eq!(locations, vec![loc(19), loc(56), loc(82)]);
        assert!((belief.total() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn concealed_move_admits_every_mode() {
        let graph = graph();
        let history = vec![
            culprit(TransportMode::Taxi, 80),
            detective(14),
            culprit(TransportMode::Taxi, 90),
            detective(15),
            culprit(TransportMode::Taxi, 89),
            detective(16),
            culprit(TransportMode::Underground, 19).with_concealment(true),
        ];
        let state = state_with(19, 16, history);
        let belief = BeliefEstimator::default().distribution(&graph, &state);
        for id in [79, 88, 90, 99, 19, 56, 82] {
            assert!(belief.probability(loc(id)) > 0.0, "missing {id}");
        }
        assert!(belief.iter().all(|entry| entry.probability >= 0.0));
        assert!((belief.total() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn detective_cells_are_cleared() {
        let graph = graph();
        let tickets = TicketInventory::culprit_default(1);
        let belief = BeliefEstimator::default().lookahead(&graph, loc(1), &tickets, &[loc(2)], &[]);
        assert_eq!(belief.probability(loc(2)), 0.0);
        assert!(belief.probability(loc(100)) > 0.0);
        assert!((belief.total() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn farther_targets_receive_more_mass() {
        let graph = graph();
        let tickets = TicketInventory::new(4, 0, 0);
        let belief = BeliefEstimator::default().lookahead(&graph, loc(45), &tickets, &[loc(43)], &[]);
        assert!(belief.probability(loc(46)) > belief.probability(loc(44)));
    }

    #[test]
    fn isolated_source_keeps_its_mass() {
        let graph = graph();
        let tickets = TicketInventory::new(0, 0, 0);
        let belief = BeliefEstimator::default().lookahead(&graph, loc(45), &tickets, &[], &[]);
        assert_eq!(belief.locations(), vec![loc(45)]);
    }
}
