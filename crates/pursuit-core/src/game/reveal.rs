use crate::model::location::Location;
use crate::model::transport::TransportMode;
use serde::{Deserialize, Serialize};

const DEFAULT_REVEAL_TURNS: [u32; 5] = [3, 8, 13, 18, 24];

/// Culprit turn numbers (1-based) after which the culprit's position is public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct RevealSchedule {
    turns: Vec<u32>,
}

impl RevealSchedule {
    pub fn new(mut turns: Vec<u32>) -> Self {
        turns.retain(|turn| *turn > 0);
        turns.sort_unstable();
        turns.dedup();
        Self { turns }
    }

    pub fn turns(&self) -> &[u32] {
        &self.turns
    }

    pub fn is_reveal_turn(&self, turn: u32) -> bool {
        self.turns.binary_search(&turn).is_ok()
    }

    /// Latest reveal turn that is `<= turn`.
    pub fn last_reveal_at_or_before(&self, turn: u32) -> Option<u32> {
        self.turns.iter().copied().take_while(|t| *t <= turn).last()
    }

    pub fn next_reveal_after(&self, turn: u32) -> Option<u32> {
        self.turns.iter().copied().find(|t| *t > turn)
    }
}

impl From<Vec<u32>> for RevealSchedule {
    fn from(turns: Vec<u32>) -> Self {
        Self::new(turns)
    }
}

impl From<RevealSchedule> for Vec<u32> {
    fn from(schedule: RevealSchedule) -> Self {
        schedule.turns
    }
}

impl Default for RevealSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_TURNS.to_vec())
    }
}

/// A disclosed culprit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reveal {
    pub turn: u32,
    pub location: Location,
    pub mode: TransportMode,
}

#[cfg(test)]
mod tests {
    use super::RevealSchedule;

    #[test]
    fn default_schedule() {
        let schedule = RevealSchedule::default();
        assert_eq!(schedule.turns(), &[3, 8, 13, 18, 24]);
        assert!(schedule.is_reveal_turn(8));
        assert!(!schedule.is_reveal_turn(9));
    }

    #[test]
    fn lookups_around_turns() {
        let schedule = RevealSchedule::new(vec![8, 3, 3, 0]);
        assert_eq!(schedule.turns(), &[3, 8]);
        assert_eq!(schedule.last_reveal_at_or_before(2), None);
        assert_eq!(schedule.last_reveal_at_or_before(3), Some(3));
        assert_eq!(schedule.last_reveal_at_or_before(12), Some(8));
        assert_eq!(schedule.next_reveal_after(3), Some(8));
        assert_eq!(schedule.next_reveal_after(8), None);
    }

    #[test]
    fn deserializing_normalizes_turns() {
        let schedule: RevealSchedule = serde_json::from_str("[8, 0, 3, 8]").unwrap();
        assert_eq!(schedule.turns(), &[3, 8]);
        assert_eq!(serde_json::to_string(&schedule).unwrap(), "[3,8]");
    }
}
