use super::reveal::RevealSchedule;
use super::state::GameState;
use crate::map::TransportGraph;
use crate::model::location::Location;
use crate::model::player::Player;
use crate::model::role::Role;
use crate::model::tickets::TicketInventory;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("need {needed} distinct start locations, map offers {available}")]
    NotEnoughStarts { needed: usize, available: usize },
    #[error("a game needs at least one detective")]
    NoDetectives,
}

/// Parameters for dealing a fresh game onto a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSetup {
    pub detectives: usize,
    pub culprit_ai: bool,
    pub detectives_ai: bool,
    pub reveal: RevealSchedule,
    pub max_culprit_turns: u32,
}

impl Default for GameSetup {
    fn default() -> Self {
        Self {
            detectives: 4,
            culprit_ai: true,
            detectives_ai: true,
            reveal: RevealSchedule::default(),
            max_culprit_turns: 24,
        }
    }
}

impl GameSetup {
    /// Draws distinct start locations for every player and hands out default tickets.
    pub fn deal<R: rand::Rng + ?Sized>(
        &self,
        graph: &TransportGraph,
        rng: &mut R,
    ) -> Result<GameState, SetupError> {
        if self.detectives == 0 {
            return Err(SetupError::NoDetectives);
        }
        let needed = self.detectives + 1;
        let starts: Vec<Location> = graph
            .start_locations()
            .choose_multiple(rng, needed)
            .copied()
            .collect();
        if starts.len() < needed {
            return Err(SetupError::NotEnoughStarts {
                needed,
                available: starts.len(),
            });
        }

        let mut players = Vec::with_capacity(needed);
        players.push(
            Player::new(
                Role::Culprit,
                starts[0],
                TicketInventory::culprit_default(self.detectives),
            )
            .with_ai(self.culprit_ai),
        );
        for (index, start) in starts.iter().skip(1).enumerate() {
            let number = u8::try_from(index + 1).unwrap_or(u8::MAX);
            players.push(
                Player::new(
                    Role::Detective(number),
                    *start,
                    TicketInventory::detective_default(),
                )
                .with_ai(self.detectives_ai),
            );
        }

        Ok(GameState::new(players)
            .with_reveal_schedule(self.reveal.clone())
            .with_max_culprit_turns(self.max_culprit_turns))
    }

    pub fn deal_with_seed(
        &self,
        graph: &TransportGraph,
        seed: u64,
    ) -> Result<GameState, SetupError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.deal(graph, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn deals_distinct_positions() {
        let graph = TransportGraph::builtin().unwrap();
        let state = GameSetup::default().deal_with_seed(&graph, 7).unwrap();
        assert_eq!(state.players().len(), 5);
        let positions: HashSet<_> = state
            .players()
            .iter()
            .filter_map(|player| player.position())
            .collect();
        assert_eq!(positions.len(), 5);
        assert_eq!(state.to_move(), Role::Culprit);
        assert!(state.players().iter().all(|player| player.is_ai()));
    }

    #[test]
    fn same_seed_same_deal() {
        let graph = TransportGraph::builtin().unwrap();
        let setup = GameSetup::default();
        assert_eq!(
            setup.deal_with_seed(&graph, 99).unwrap(),
            setup.deal_with_seed(&graph, 99).unwrap()
        );
    }

    #[test]
    fn rejects_oversubscribed_maps() {
        let graph = TransportGraph::builtin().unwrap();
        let setup = GameSetup {
            detectives: 40,
            ..GameSetup::default()
        };
        assert!(matches!(
            setup.deal_with_seed(&graph, 1),
            Err(SetupError::NotEnoughStarts { needed: 41, .. })
        ));
    }
}
