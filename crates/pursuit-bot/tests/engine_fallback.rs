use pursuit_bot::{
    DecisionEngine, DecisionSource, EngineConfig, ProviderError, ReasoningProvider,
    SimulationConfig,
};
use pursuit_core::game::{GameSetup, GameState};
use pursuit_core::map::TransportGraph;
use pursuit_core::model::location::Location;
use pursuit_core::model::player::Player;
use pursuit_core::model::role::Role;
use pursuit_core::model::tickets::TicketInventory;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum Reply {
    Unconfigured,
    Fails,
    Text(&'static str),
}

struct ScriptedProvider {
    name: &'static str,
    reply: Reply,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl ReasoningProvider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn is_configured(&self) -> bool {
        !matches!(self.reply, Reply::Unconfigured)
    }

    fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        assert!(prompt.contains("Legal moves:"));
        self.calls.lock().unwrap().push(self.name);
        match &self.reply {
            Reply::Unconfigured => Err(ProviderError::NotConfigured(self.name.into())),
            Reply::Fails => Err(ProviderError::Io("connection reset".into())),
            Reply::Text(text) => Ok((*text).to_string()),
        }
    }
}

fn quick_config() -> EngineConfig {
    EngineConfig {
        simulation: SimulationConfig {
            trials: 6,
            depth: 2,
            threads: 2,
            ..SimulationConfig::default()
        },
        ..EngineConfig::default()
    }
}

fn graph() -> Arc<TransportGraph> {
    Arc::new(TransportGraph::builtin().expect("demo map"))
}

fn scripted(
    engine: DecisionEngine,
    calls: &Arc<Mutex<Vec<&'static str>>>,
    scripts: Vec<(&'static str, Reply)>,
) -> DecisionEngine {
    scripts.into_iter().fold(engine, |engine, (name, reply)| {
        engine.with_provider(Box::new(ScriptedProvider {
            name,
            reply,
            calls: Arc::clone(calls),
        }))
    })
}

fn opening_state() -> GameState {
    GameState::new(vec![
        Player::new(Role::Culprit, Location::new(1), TicketInventory::culprit_default(1)),
        Player::new(Role::Detective(1), Location::new(45), TicketInventory::detective_default())
            .with_ai(true),
    ])
}

#[test]
fn failing_providers_fall_back_to_a_legal_local_move() {
    let graph = graph();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let engine = scripted(
        DecisionEngine::new(Arc::clone(&graph), quick_config()),
        &calls,
        vec![
            ("missing", Reply::Unconfigured),
            ("broken", Reply::Fails),
            ("chatty", Reply::Text("Take the bus to 31, obviously.")),
            (
                "cheater",
                Reply::Text(r#"{"mode":"underground","targetLocation":89,"concealed":false,"double":false}"#),
            ),
        ],
    );
    let state = opening_state();
    let outcome = engine.decide(&state, Role::Culprit);
    assert_eq!(outcome.source, DecisionSource::Local);
    assert_eq!(outcome.provider_failures, 3);
    assert_eq!(outcome.mv.role, Role::Culprit);
    assert!(state.validate_move(&graph, &outcome.mv).is_ok());
    assert_eq!(*calls.lock().unwrap(), vec!["broken", "chatty", "cheater"]);
}

#[test]
fn first_valid_provider_wins_and_later_ones_are_not_called() {
    let graph = graph();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let engine = scripted(
        DecisionEngine::new(Arc::clone(&graph), quick_config()),
        &calls,
        vec![
            ("broken", Reply::Fails),
            (
                "planner",
                Reply::Text(r#" {"mode":"bus","targetLocation":31,"concealed":false,"double":false} "#),
            ),
            ("spare", Reply::Fails),
        ],
    );
    let outcome = engine.decide(&opening_state(), Role::Culprit);
    assert_eq!(outcome.source, DecisionSource::Provider("planner".into()));
    assert_eq!(outcome.mv.target, Location::new(31));
    assert_eq!(*calls.lock().unwrap(), vec!["broken", "planner"]);
}

#[test]
fn stranded_or_unknown_players_get_the_safe_default() {
    let engine = DecisionEngine::new(graph(), quick_config());
    let state = GameState::new(vec![
        Player::new(Role::Culprit, Location::new(1), TicketInventory::culprit_default(1)),
        Player::new(Role::Detective(1), Location::new(45), TicketInventory::new(0, 0, 0)),
    ])
    .with_to_move(Role::Detective(1));

    let stranded = engine.decide(&state, Role::Detective(1));
    assert_eq!(stranded.source, DecisionSource::SafeDefault);
    assert!(stranded.mv.is_stay_at(Location::new(45)));

    let absent = engine.calculate_move(&state, Role::Detective(7));
    assert_eq!(absent.role, Role::Detective(7));
}

#[test]
fn engine_moves_are_always_legal_over_whole_games() {
    let graph = graph();
    let engine = DecisionEngine::new(Arc::clone(&graph), quick_config());
    let setup = GameSetup {
        detectives: 3,
        ..GameSetup::default()
    };
    for seed in [11_u64, 29] {
        let mut state = setup.deal_with_seed(&graph, seed).expect("deal");
        for _ in 0..150 {
            if state.is_finished() {
                break;
            }
            let role = state.to_move();
            let before = state.player(role).map(|player| *player.tickets()).unwrap();
            let mv = engine.calculate_move(&state, role);
            assert_eq!(mv.role, role);
            assert!(state.validate_move(&graph, &mv).is_ok(), "seed {seed}: {mv}");
            if let Some(ticket) = mv.travel_ticket()
                && !mv.is_stay_at(state.player(role).and_then(|p| p.position()).unwrap())
            {
                assert!(before.count(ticket) > 0);
            }
            state.apply_move(&graph, mv).expect("validated move applies");
        }
        assert!(state.is_finished(), "seed {seed} did not finish");
    }
}

#[test]
fn snapshot_with_a_zero_reveal_turn_still_gets_a_move() {
    let graph = graph();
    let engine = DecisionEngine::new(Arc::clone(&graph), quick_config());
    let state = GameState::from_json(
        r#"{
            "players": [
                {"role": "culprit", "position": 89, "tickets": {"taxi": 4, "bus": 3, "underground": 2}},
                {"role": {"detective": 1}, "position": 13, "tickets": {"taxi": 10, "bus": 8, "underground": 4}, "is_ai": true}
            ],
            "history": [{"role": "culprit", "mode": "underground", "target": 89}],
            "to_move": {"detective": 1},
            "status": {"state": "active"},
            "reveal": [0, 3]
        }"#,
    )
    .expect("snapshot");

    let mv = engine.calculate_move(&state, Role::Detective(1));
    assert_eq!(mv.role, Role::Detective(1));
    assert!(state.validate_move(&graph, &mv).is_ok());
}
