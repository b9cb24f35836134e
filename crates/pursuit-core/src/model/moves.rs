use super::location::Location;
use super::role::Role;
use super::tickets::Ticket;
use super::transport::TransportMode;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A recorded or proposed move. Never edited once appended to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub role: Role,
    pub mode: TransportMode,
    pub target: Location,
    #[serde(default)]
    pub concealed: bool,
    #[serde(default)]
    pub double: bool,
}

impl Move {
    pub const fn new(role: Role, mode: TransportMode, target: Location) -> Self {
        Self {
            role,
            mode,
            target,
            concealed: false,
            double: false,
        }
    }

    pub const fn with_concealment(mut self, concealed: bool) -> Self {
        self.concealed = concealed;
        self
    }

    pub const fn with_double(mut self, double: bool) -> Self {
        self.double = double;
        self
    }

    /// Non-displacing local move that keeps the player where it is.
    pub const fn stay(role: Role, position: Location) -> Self {
        Self::new(role, TransportMode::Taxi, position)
    }

    pub fn is_stay_at(&self, position: Location) -> bool {
        self.target == position
            && self.mode == TransportMode::Taxi
            && !self.concealed
            && !self.double
    }

    /// Travel ticket spent by this move, ignoring the double ticket.
    pub const fn travel_ticket(&self) -> Option<Ticket> {
        if self.concealed {
            Some(Ticket::Concealment)
        } else {
            Ticket::for_mode(self.mode)
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} by {}", self.role, self.target, self.mode)?;
        if self.concealed {
            f.write_str(" (concealed)")?;
        }
        if self.double {
            f.write_str(" (double)")?;
        }
        Ok(())
    }
}
