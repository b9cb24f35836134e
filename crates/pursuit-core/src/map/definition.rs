use super::MapError;
use super::validation::validate_symmetry;
use crate::model::transport::TransportMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const BUILTIN_DEMO: &str = include_str!("../../maps/demo.json");

/// One location and its neighbor lists, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: u16,
    #[serde(default)]
    pub taxi: Vec<u16>,
    #[serde(default)]
    pub bus: Vec<u16>,
    #[serde(default)]
    pub underground: Vec<u16>,
    #[serde(default)]
    pub ferry: Vec<u16>,
}

impl NodeDefinition {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            taxi: Vec::new(),
            bus: Vec::new(),
            underground: Vec::new(),
            ferry: Vec::new(),
        }
    }

    pub fn edges(&self, mode: TransportMode) -> &[u16] {
        match mode {
            TransportMode::Taxi => &self.taxi,
            TransportMode::Bus => &self.bus,
            TransportMode::Underground => &self.underground,
            TransportMode::Ferry => &self.ferry,
        }
    }

    fn edges_mut(&mut self, mode: TransportMode) -> &mut Vec<u16> {
        match mode {
            TransportMode::Taxi => &mut self.taxi,
            TransportMode::Bus => &mut self.bus,
            TransportMode::Underground => &mut self.underground,
            TransportMode::Ferry => &mut self.ferry,
        }
    }
}

/// Serialized form of a transport map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    #[serde(default)]
    pub start_locations: Vec<u16>,
    pub nodes: Vec<NodeDefinition>,
}

impl MapDefinition {
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// The 108-location demo map bundled with the crate.
    pub fn builtin() -> Result<Self, MapError> {
        Self::from_json(BUILTIN_DEMO)
    }

    /// Builds a definition from an undirected edge list, emitting both directions.
    pub fn from_edges(name: &str, edges: &[(u16, u16, TransportMode)]) -> Self {
        fn ensure(nodes: &mut Vec<NodeDefinition>, id: u16) -> usize {
            match nodes.iter().position(|node| node.id == id) {
                Some(index) => index,
                None => {
                    nodes.push(NodeDefinition::new(id));
                    nodes.len() - 1
                }
            }
        }

        let mut nodes: Vec<NodeDefinition> = Vec::new();
        for &(a, b, mode) in edges {
            let ia = ensure(&mut nodes, a);
            nodes[ia].edges_mut(mode).push(b);
            let ib = ensure(&mut nodes, b);
            nodes[ib].edges_mut(mode).push(a);
        }
        nodes.sort_by_key(|node| node.id);
        Self {
            name: name.to_string(),
            start_locations: Vec::new(),
            nodes,
        }
    }

    /// Structural checks required to build a graph: ids, references, starts.
    pub fn validate_structure(&self) -> Result<(), MapError> {
        if self.nodes.is_empty() {
            return Err(MapError::Empty);
        }
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if node.id == 0 {
                return Err(MapError::ReservedId);
            }
            if !ids.insert(node.id) {
                return Err(MapError::Duplicate(node.id));
            }
        }
        for node in &self.nodes {
            for mode in TransportMode::ALL {
                for &to in node.edges(mode) {
                    if to == node.id {
                        return Err(MapError::SelfLoop(node.id));
                    }
                    if !ids.contains(&to) {
                        return Err(MapError::Dangling {
                            from: node.id,
                            to,
                            mode,
                        });
                    }
                }
            }
        }
        if let Some(&start) = self.start_locations.iter().find(|id| !ids.contains(id)) {
            return Err(MapError::UnknownStart(start));
        }
        Ok(())
    }

    /// Full offline validation: structure plus edge symmetry.
    pub fn validate(&self) -> Result<(), MapError> {
        self.validate_structure()?;
        let asymmetries = validate_symmetry(self);
        if asymmetries.is_empty() {
            Ok(())
        } else {
            Err(MapError::Asymmetric(asymmetries))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_map_is_valid() {
        let map = MapDefinition::builtin().expect("demo map parses");
        assert_eq!(map.name, "demo");
        assert_eq!(map.nodes.len(), 108);
        map.validate().expect("demo map validates");
    }

    #[test]
    fn from_edges_is_symmetric() {
        let map = MapDefinition::from_edges(
            "tiny",
            &[(1, 2, TransportMode::Taxi), (2, 3, TransportMode::Bus)],
        );
        assert_eq!(map.nodes.len(), 3);
        assert_eq!(map.nodes[1].taxi, vec![1]);
        assert_eq!(map.nodes[1].bus, vec![3]);
        map.validate().expect("symmetric by construction");
    }

    #[test]
    fn rejects_dangling_references() {
        let mut map = MapDefinition::from_edges("tiny", &[(1, 2, TransportMode::Taxi)]);
        map.nodes[0].bus.push(9);
        assert!(matches!(
            map.validate_structure(),
            Err(MapError::Dangling { from: 1, to: 9, .. })
        ));
    }

    #[test]
    fn rejects_duplicates_and_unknown_starts() {
        let mut map = MapDefinition::from_edges("tiny", &[(1, 2, TransportMode::Taxi)]);
        map.start_locations.push(5);
        assert!(matches!(map.validate(), Err(MapError::UnknownStart(5))));
        map.start_locations.clear();
        map.nodes.push(NodeDefinition::new(2));
        assert!(matches!(map.validate(), Err(MapError::Duplicate(2))));
    }
}
