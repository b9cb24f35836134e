use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Edge label on the transport map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TransportMode {
    #[serde(alias = "local")]
    Taxi = 0,
    Bus = 1,
    #[serde(alias = "express")]
    Underground = 2,
    #[serde(alias = "boat")]
    Ferry = 3,
}

impl TransportMode {
    pub const ALL: [TransportMode; 4] = [
        TransportMode::Taxi,
        TransportMode::Bus,
        TransportMode::Underground,
        TransportMode::Ferry,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(TransportMode::Taxi),
            1 => Some(TransportMode::Bus),
            2 => Some(TransportMode::Underground),
            3 => Some(TransportMode::Ferry),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TransportMode::Taxi => "taxi",
            TransportMode::Bus => "bus",
            TransportMode::Underground => "underground",
            TransportMode::Ferry => "ferry",
        }
    }

    /// Underground and ferry links mark a location as strategically key.
    pub const fn is_express(self) -> bool {
        matches!(self, TransportMode::Underground | TransportMode::Ferry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transport mode '{0}'")]
pub struct ParseModeError(pub String);

impl FromStr for TransportMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "taxi" | "local" => Ok(TransportMode::Taxi),
            "bus" => Ok(TransportMode::Bus),
            "underground" | "express" => Ok(TransportMode::Underground),
            "ferry" | "boat" => Ok(TransportMode::Ferry),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
