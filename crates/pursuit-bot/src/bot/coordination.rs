//! Greedy next-hop allocation for several pursuers.
//!
//! Pursuers are served in list order. Each takes the first hop of its
//! shortest path to the closest reachable believed location and claims that
//! cell; a later pursuer whose hop is already claimed gets no assignment for
//! the round. The result depends on list order and is not globally optimal.

use pursuit_core::game::GameState;
use pursuit_core::map::TransportGraph;
use pursuit_core::model::location::Location;
use pursuit_core::model::role::Role;
use pursuit_core::model::tickets::TicketInventory;
use pursuit_core::model::transport::TransportMode;
use pursuit_core::path::shortest_path;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct Pursuer<'a> {
    pub role: Role,
    pub position: Location,
    pub tickets: &'a TicketInventory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub mode: TransportMode,
    pub target: Location,
}

/// Ordered role → hop table produced by [`assign_moves`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignments {
    entries: Vec<(Role, Option<Hop>)>,
}

impl Assignments {
    pub fn get(&self, role: Role) -> Option<Hop> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == role)
            .and_then(|(_, hop)| *hop)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, Option<Hop>)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cells claimed by pursuers served before `role`.
    pub fn claimed_before(&self, role: Role) -> Vec<Location> {
        self.entries
            .iter()
            .take_while(|(entry, _)| *entry != role)
            .filter_map(|(_, hop)| hop.map(|hop| hop.target))
            .collect()
    }
}

pub fn assign_moves(
    graph: &TransportGraph,
    pursuers: &[Pursuer<'_>],
    believed: &[Location],
    max_depth: usize,
) -> Assignments {
    let mut claimed = HashSet::new();
    let mut entries = Vec::with_capacity(pursuers.len());
    for pursuer in pursuers {
        let hop = shortest_path(graph, pursuer.position, pursuer.tickets, believed, max_depth)
            .and_then(|path| path.first_hop())
            .map(|(mode, target)| Hop { mode, target })
            .filter(|hop| claimed.insert(hop.target));
        entries.push((pursuer.role, hop));
    }
    Assignments { entries }
}

/// Placed detectives of a snapshot, in seating order.
pub fn pursuers_in(state: &GameState) -> Vec<Pursuer<'_>> {
    state
        .detectives()
        .filter_map(|player| {
            Some(Pursuer {
                role: player.role(),
                position: player.position()?,
                tickets: player.tickets(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: u16) -> Location {
        Location::new(id)
    }

    #[test]
    fn contested_cell_goes_to_the_first_pursuer() {
        let graph = TransportGraph::builtin().expect("demo map");
        let tickets = TicketInventory::detective_default();
        let pursuers = [
            Pursuer {
                role: Role::Detective(1),
                position: loc(40),
                tickets: &tickets,
            },
            Pursuer {
                role: Role::Detective(2),
                position: loc(60),
                tickets: &tickets,
            },
        ];
        let assignments = assign_moves(&graph, &pursuers, &[loc(50)], 6);
        assert_eq!(assignments.get(Role::Detective(1)).map(|hop| hop.target), Some(loc(50)));
        assert_eq!(assignments.get(Role::Detective(2)), None);
        assert_eq!(assignments.claimed_before(Role::Detective(2)), vec![loc(50)]);
    }

    #[test]
    fn unreachable_targets_produce_no_hop() {
        let graph = TransportGraph::builtin().expect("demo map");
        let tickets = TicketInventory::new(0, 0, 0);
        let pursuers = [Pursuer {
            role: Role::Detective(1),
            position: loc(40),
            tickets: &tickets,
        }];
        let assignments = assign_moves(&graph, &pursuers, &[loc(50)], 6);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments.get(Role::Detective(1)), None);
    }
}
