//! Breadth-first route search under per-mode ticket budgets.
//!
//! The visited set is keyed on location only, not on the remaining ticket
//! vector. A location first reached through an expensive route is never
//! revisited through a cheaper one, so a path can be missed when only the
//! cheaper route has the tickets to continue. Results are shortest by hop count
//! among the routes explored, not guaranteed optimal for every ticket mix.

use crate::map::TransportGraph;
use crate::model::location::Location;
use crate::model::tickets::TicketInventory;
use crate::model::transport::TransportMode;
use std::collections::VecDeque;

/// A route starting at the origin. `modes[i]` is the mode of hop `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    locations: Vec<Location>,
    modes: Vec<TransportMode>,
}

impl Path {
    fn origin(start: Location) -> Self {
        Self {
            locations: vec![start],
            modes: Vec::new(),
        }
    }

    fn extended(&self, mode: TransportMode, next: Location) -> Self {
        let mut locations = Vec::with_capacity(self.locations.len() + 1);
        locations.extend_from_slice(&self.locations);
        locations.push(next);
        let mut modes = Vec::with_capacity(self.modes.len() + 1);
        modes.extend_from_slice(&self.modes);
        modes.push(mode);
        Self { locations, modes }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn modes(&self) -> &[TransportMode] {
        &self.modes
    }

    pub fn hops(&self) -> usize {
        self.modes.len()
    }

    pub fn destination(&self) -> Location {
        self.locations[self.locations.len() - 1]
    }

    pub fn first_hop(&self) -> Option<(TransportMode, Location)> {
        Some((*self.modes.first()?, *self.locations.get(1)?))
    }
}

/// Finds the first path from `start` to any of `targets` within `max_depth` hops.
///
/// Each traversed edge consumes the matching ticket, or a concealment ticket
/// once the matching one is exhausted. Returns `None` when no target is
/// reachable within the budget or `start` is not on the map.
pub fn shortest_path(
    graph: &TransportGraph,
    start: Location,
    tickets: &TicketInventory,
    targets: &[Location],
    max_depth: usize,
) -> Option<Path> {
    if !graph.contains(start) || targets.is_empty() {
        return None;
    }
    if targets.contains(&start) {
        return Some(Path::origin(start));
    }

    let mut visited = vec![false; graph.index_bound()];
    visited[start.index()] = true;
    let mut frontier = VecDeque::new();
    frontier.push_back((Path::origin(start), *tickets));

    while let Some((path, remaining)) = frontier.pop_front() {
        if path.hops() >= max_depth {
            continue;
        }
        let here = path.destination();
        for (mode, next) in graph.edges(here) {
            if visited[next.index()] {
                continue;
            }
            let mut budget = remaining;
            if budget.pay_for(mode).is_err() {
                continue;
            }
            visited[next.index()] = true;
            let extended = path.extended(mode, next);
            if targets.contains(&next) {
                return Some(extended);
            }
            frontier.push_back((extended, budget));
        }
    }
    None
}
