use core::fmt;
use serde::{Deserialize, Serialize};

/// Numbered node on the transport map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(u16);

impl Location {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u16> for Location {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Location;

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&Location::new(89)).unwrap();
        assert_eq!(json, "89");
        let back: Location = serde_json::from_str("12").unwrap();
        assert_eq!(back, Location::new(12));
    }

    #[test]
    fn index_matches_id() {
        assert_eq!(Location::from(42).index(), 42);
        assert_eq!(Location::new(7).to_string(), "7");
    }
}
