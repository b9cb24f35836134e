use super::{MapDefinition, MapError};
use crate::model::location::Location;
use crate::model::transport::TransportMode;
use std::collections::VecDeque;

const UNREACHABLE: u8 = u8::MAX;

#[derive(Debug, Clone, Default)]
struct NodeEdges {
    by_mode: [Vec<Location>; 4],
}

impl NodeEdges {
    fn exit_count(&self) -> usize {
        self.by_mode.iter().map(Vec::len).sum()
    }
}

/// Read-only transport map, indexed by location id.
///
/// Built once at start-up together with an all-pairs hop-distance table; every
/// lookup afterwards is a slice index. Unknown locations behave as isolated
/// nodes rather than errors.
#[derive(Debug, Clone)]
pub struct TransportGraph {
    name: String,
    nodes: Vec<Option<NodeEdges>>,
    start_locations: Vec<Location>,
    distances: Vec<u8>,
}

impl TransportGraph {
    pub fn from_definition(definition: &MapDefinition) -> Result<Self, MapError> {
        definition.validate_structure()?;

        let max_id = definition
            .nodes
            .iter()
            .map(|node| node.id as usize)
            .max()
            .unwrap_or(0);
        let mut nodes: Vec<Option<NodeEdges>> = vec![None; max_id + 1];
        for node in &definition.nodes {
            let mut edges = NodeEdges::default();
            for mode in TransportMode::ALL {
                let mut targets: Vec<Location> =
                    node.edges(mode).iter().copied().map(Location::new).collect();
                targets.sort();
                targets.dedup();
                edges.by_mode[mode.index()] = targets;
            }
            nodes[node.id as usize] = Some(edges);
        }

        let start_locations = if definition.start_locations.is_empty() {
            definition.nodes.iter().map(|node| Location::new(node.id)).collect()
        } else {
            definition
                .start_locations
                .iter()
                .copied()
                .map(Location::new)
                .collect()
        };

        let mut graph = Self {
            name: definition.name.clone(),
            nodes,
            start_locations,
            distances: Vec::new(),
        };
        graph.distances = graph.compute_distances();
        Ok(graph)
    }

    pub fn builtin() -> Result<Self, MapError> {
        Self::from_definition(&MapDefinition::builtin()?)
    }

    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Self::from_definition(&MapDefinition::from_json(json)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the largest location id; sizes per-location lookup tables.
    pub fn index_bound(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, location: Location) -> bool {
        self.node(location).is_some()
    }

    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_some())
            .map(|(id, _)| Location::new(id as u16))
    }

    pub fn start_locations(&self) -> &[Location] {
        &self.start_locations
    }

    pub fn neighbors(&self, location: Location, mode: TransportMode) -> &[Location] {
        self.node(location)
            .map(|node| node.by_mode[mode.index()].as_slice())
            .unwrap_or(&[])
    }

    /// Every outgoing edge of `location` across all modes.
    pub fn edges(&self, location: Location) -> impl Iterator<Item = (TransportMode, Location)> + '_ {
        TransportMode::ALL.into_iter().flat_map(move |mode| {
            self.neighbors(location, mode)
                .iter()
                .map(move |&target| (mode, target))
        })
    }

    /// Distinct targets reachable in one hop by any mode, ascending.
    pub fn all_neighbors(&self, location: Location) -> Vec<Location> {
        let mut targets: Vec<Location> = self.edges(location).map(|(_, target)| target).collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }

    pub fn connects(&self, from: Location, to: Location, mode: TransportMode) -> bool {
        self.neighbors(from, mode).binary_search(&to).is_ok()
    }

    pub fn exit_count(&self, location: Location) -> usize {
        self.node(location).map(NodeEdges::exit_count).unwrap_or(0)
    }

    pub fn is_bottleneck(&self, location: Location) -> bool {
        self.exit_count(location) == 1
    }

    pub fn is_key(&self, location: Location) -> bool {
        TransportMode::ALL
            .iter()
            .filter(|mode| mode.is_express())
            .any(|mode| !self.neighbors(location, *mode).is_empty())
    }

    /// Hop distance ignoring tickets.
    pub fn distance(&self, from: Location, to: Location) -> Option<u8> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        let bound = self.index_bound();
        let value = self.distances[from.index() * bound + to.index()];
        (value != UNREACHABLE).then_some(value)
    }

    pub fn nearest_distance(&self, from: Location, targets: &[Location]) -> Option<u8> {
        targets
            .iter()
            .filter_map(|target| self.distance(from, *target))
            .min()
    }

    fn node(&self, location: Location) -> Option<&NodeEdges> {
        self.nodes.get(location.index()).and_then(Option::as_ref)
    }

    fn compute_distances(&self) -> Vec<u8> {
        let bound = self.index_bound();
        let mut table = vec![UNREACHABLE; bound * bound];
        let mut queue = VecDeque::new();
        for source in self.locations() {
            let row = &mut table[source.index() * bound..(source.index() + 1) * bound];
            row[source.index()] = 0;
            queue.clear();
            queue.push_back(source);
            while let Some(current) = queue.pop_front() {
                let next_distance = row[current.index()].saturating_add(1);
                if next_distance == UNREACHABLE {
                    continue;
                }
                for (_, next) in self.edges(current) {
                    if row[next.index()] == UNREACHABLE {
                        row[next.index()] = next_distance;
                        queue.push_back(next);
                    }
                }
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> TransportGraph {
        TransportGraph::builtin().expect("demo map")
    }

    #[test]
    fn neighbors_follow_definition() {
        let graph = demo();
        assert_eq!(
            graph.neighbors(Location::new(1), TransportMode::Taxi),
            &[Location::new(2), Location::new(11)]
        );
        assert_eq!(
            graph.neighbors(Location::new(1), TransportMode::Ferry),
            &[Location::new(100)]
        );
        assert_eq!(graph.len(), 108);
    }

    #[test]
    fn unknown_location_has_no_neighbors() {
        let graph = demo();
        let nowhere = Location::new(999);
        for mode in TransportMode::ALL {
            assert!(graph.neighbors(nowhere, mode).is_empty());
        }
        assert_eq!(graph.exit_count(nowhere), 0);
        assert_eq!(graph.distance(nowhere, Location::new(1)), None);
    }

    #[test]
    fn flags_bottlenecks_and_key_locations() {
        let graph = demo();
        assert!(graph.is_bottleneck(Location::new(101)));
        assert!(!graph.is_bottleneck(Location::new(23)));
        assert!(graph.is_key(Location::new(89)));
        assert!(graph.is_key(Location::new(1)));
        assert!(!graph.is_key(Location::new(2)));
    }

    #[test]
    fn distances_use_every_mode() {
        let graph = demo();
        assert_eq!(graph.distance(Location::new(1), Location::new(1)), Some(0));
        assert_eq!(graph.distance(Location::new(1), Location::new(100)), Some(1));
        assert_eq!(graph.distance(Location::new(12), Location::new(89)), Some(2));
        assert_eq!(
            graph.nearest_distance(Location::new(2), &[Location::new(100), Location::new(3)]),
            Some(1)
        );
    }

    #[test]
    fn every_demo_edge_is_symmetric_in_the_arena() {
        let graph = demo();
        for from in graph.locations() {
            for (mode, to) in graph.edges(from) {
                assert!(graph.connects(to, from, mode), "{from} -> {to} by {mode}");
            }
        }
    }
}
