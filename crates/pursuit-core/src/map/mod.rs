//! Static transport map: JSON definitions, offline validation and the
//! read-only graph consulted by every search.

mod definition;
mod graph;
mod validation;

pub use definition::{MapDefinition, NodeDefinition};
pub use graph::TransportGraph;
pub use validation::{Asymmetry, validate_symmetry};

use crate::model::transport::TransportMode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to parse map definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("map defines no locations")]
    Empty,
    #[error("location id 0 is reserved")]
    ReservedId,
    #[error("location {0} defined more than once")]
    Duplicate(u16),
    #[error("location {from} has a {mode} edge to undefined location {to}")]
    Dangling {
        from: u16,
        to: u16,
        mode: TransportMode,
    },
    #[error("location {0} links to itself")]
    SelfLoop(u16),
    #[error("start location {0} is not on the map")]
    UnknownStart(u16),
    #[error("{} asymmetric edge(s)", .0.len())]
    Asymmetric(Vec<Asymmetry>),
}
