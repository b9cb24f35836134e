use core::fmt;
use serde::{Deserialize, Serialize};

/// Seat identity: the hidden culprit or a numbered detective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Culprit,
    Detective(u8),
}

impl Role {
    pub const fn is_culprit(self) -> bool {
        matches!(self, Role::Culprit)
    }

    pub const fn is_detective(self) -> bool {
        matches!(self, Role::Detective(_))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Culprit => f.write_str("culprit"),
            Role::Detective(n) => write!(f, "detective-{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn display_labels() {
        assert_eq!(Role::Culprit.to_string(), "culprit");
        assert_eq!(Role::Detective(2).to_string(), "detective-2");
    }

    #[test]
    fn serde_shape() {
        assert_eq!(serde_json::to_string(&Role::Culprit).unwrap(), "\"culprit\"");
        assert_eq!(
            serde_json::to_string(&Role::Detective(3)).unwrap(),
            "{\"detective\":3}"
        );
    }
}
