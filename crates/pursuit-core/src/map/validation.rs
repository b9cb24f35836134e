use super::MapDefinition;
use crate::model::transport::TransportMode;
use core::fmt;
use std::collections::{HashMap, HashSet};

/// An edge present in one direction only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asymmetry {
    pub from: u16,
    pub to: u16,
    pub mode: TransportMode,
}

impl fmt::Display for Asymmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} by {} has no return edge",
            self.from, self.to, self.mode
        )
    }
}

/// Lists every directed edge whose reverse is missing. Run offline, not per decision.
pub fn validate_symmetry(map: &MapDefinition) -> Vec<Asymmetry> {
    let mut lookup: HashMap<(u16, TransportMode), HashSet<u16>> = HashMap::new();
    for node in &map.nodes {
        for mode in TransportMode::ALL {
            lookup
                .entry((node.id, mode))
                .or_default()
                .extend(node.edges(mode).iter().copied());
        }
    }

    let mut missing = Vec::new();
    for node in &map.nodes {
        for mode in TransportMode::ALL {
            for &to in node.edges(mode) {
                let returns = lookup
                    .get(&(to, mode))
                    .is_some_and(|back| back.contains(&node.id));
                if !returns {
                    missing.push(Asymmetry {
                        from: node.id,
                        to,
                        mode,
                    });
                }
            }
        }
    }
    missing
}
