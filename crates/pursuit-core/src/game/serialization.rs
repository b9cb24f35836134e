use super::state::GameState;

impl GameState {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use crate::belief::BeliefEstimator;
    use crate::game::{GameState, GameStatus};
    use crate::map::TransportGraph;
    use crate::model::location::Location;
    use crate::model::moves::Move;
    use crate::model::role::Role;
    use crate::model::transport::TransportMode;

    #[test]
    fn snapshot_roundtrip_preserves_history() {
        let graph = TransportGraph::builtin().unwrap();
        let mut state = crate::game::GameSetup::default()
            .deal_with_seed(&graph, 5)
            .unwrap();
        let from = state.culprit().unwrap().position().unwrap();
        let (mode, target) = graph
            .edges(from)
            .find(|(mode, target)| {
                *mode == TransportMode::Taxi && !state.is_occupied_by_detective(*target)
            })
            .unwrap();
        state
            .apply_move(&graph, Move::new(Role::Culprit, mode, target))
            .unwrap();

        let json = state.to_json().unwrap();
        let restored = GameState::from_json(&json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn minimal_snapshot_fills_defaults() {
        let json = r#"{
            "players": [
                {"role": "culprit", "position": 89, "tickets": {"taxi": 4, "bus": 3, "underground": 3}},
                {"role": {"detective": 1}, "position": 13, "tickets": {"taxi": 10, "bus": 8, "underground": 4}, "is_ai": true}
            ],
            "to_move": {"detective": 1},
            "status": {"state": "active"}
        }"#;
        let state = GameState::from_json(json).unwrap();
        assert_eq!(state.status(), GameStatus::Active);
        assert_eq!(state.max_culprit_turns(), 24);
        assert_eq!(state.reveal_schedule().turns(), &[3, 8, 13, 18, 24]);
        assert_eq!(state.detective_positions(), vec![Location::new(13)]);
        assert!(state.history().is_empty());
    }

    fn snapshot_with_reveal(reveal: &str) -> String {
        format!(
            r#"{{
            "players": [
                {{"role": "culprit", "position": 89, "tickets": {{"taxi": 4, "bus": 3, "underground": 3}}}},
                {{"role": {{"detective": 1}}, "position": 13, "tickets": {{"taxi": 10, "bus": 8, "underground": 4}}, "is_ai": true}}
            ],
            "history": [
                {{"role": "culprit", "mode": "taxi", "target": 2}},
                {{"role": {{"detective": 1}}, "mode": "taxi", "target": 23}},
                {{"role": "culprit", "mode": "taxi", "target": 20}},
                {{"role": {{"detective": 1}}, "mode": "taxi", "target": 13}},
                {{"role": "culprit", "mode": "underground", "target": 89}}
            ],
            "to_move": {{"detective": 1}},
            "status": {{"state": "active"}},
            "reveal": {reveal}
        }}"#
        )
    }

    #[test]
    fn unsorted_reveal_turns_are_normalized_on_load() {
        let state = GameState::from_json(&snapshot_with_reveal("[8, 3]")).unwrap();
        assert_eq!(state.reveal_schedule().turns(), &[3, 8]);
        assert!(state.is_culprit_revealed());
        assert_eq!(state.last_reveal().unwrap().location, Location::new(89));

        let graph = TransportGraph::builtin().unwrap();
        let predictions = BeliefEstimator::default().predict_locations(&graph, &state);
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].location, Location::new(89));
        assert!((predictions[0].probability - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_reveal_turn_is_dropped_on_load() {
        let state = GameState::from_json(&snapshot_with_reveal("[0, 3]")).unwrap();
        assert_eq!(state.reveal_schedule().turns(), &[3]);
        let reveal = state.last_reveal().unwrap();
        assert_eq!(reveal.turn, 3);
        assert_eq!(reveal.location, Location::new(89));

        let graph = TransportGraph::builtin().unwrap();
        assert_eq!(BeliefEstimator::default().distribution(&graph, &state).len(), 1);
    }
}
