use super::location::Location;
use super::role::Role;
use super::tickets::TicketInventory;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    role: Role,
    position: Option<Location>,
    #[serde(default)]
    previous_position: Option<Location>,
    tickets: TicketInventory,
    #[serde(default)]
    is_ai: bool,
}

impl Player {
    pub fn new(role: Role, position: Location, tickets: TicketInventory) -> Self {
        Self {
            role,
            position: Some(position),
            previous_position: None,
            tickets,
            is_ai: false,
        }
    }

    /// A player whose position is unknown to the snapshot.
    pub fn unplaced(role: Role, tickets: TicketInventory) -> Self {
        Self {
            role,
            position: None,
            previous_position: None,
            tickets,
            is_ai: false,
        }
    }

    pub fn with_ai(mut self, is_ai: bool) -> Self {
        self.is_ai = is_ai;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn position(&self) -> Option<Location> {
        self.position
    }

    pub fn previous_position(&self) -> Option<Location> {
        self.previous_position
    }

    pub fn tickets(&self) -> &TicketInventory {
        &self.tickets
    }

    pub fn is_ai(&self) -> bool {
        self.is_ai
    }

    pub(crate) fn tickets_mut(&mut self) -> &mut TicketInventory {
        &mut self.tickets
    }

    pub(crate) fn relocate(&mut self, target: Location) {
        self.previous_position = self.position;
        self.position = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocate_tracks_previous_position() {
        let mut player = Player::new(
            Role::Detective(1),
            Location::new(13),
            TicketInventory::detective_default(),
        );
        player.relocate(Location::new(14));
        assert_eq!(player.position(), Some(Location::new(14)));
        assert_eq!(player.previous_position(), Some(Location::new(13)));
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let json = r#"{
            "role": "culprit",
            "position": 45,
            "tickets": {"taxi": 4, "bus": 3, "underground": 3}
        }"#;
        let player: Player = serde_json::from_str(json).unwrap();
        assert_eq!(player.role(), Role::Culprit);
        assert!(!player.is_ai());
        assert_eq!(player.previous_position(), None);
    }
}
