//! Turn-level orchestration: providers first, then the local policy, then a
//! safe default. `DecisionEngine::calculate_move` never fails.

use crate::bot::{BotParams, MoveCandidate, SimulationConfig, flag_enabled, legal_moves_in};
use crate::policy::{HeuristicPolicy, Policy, PolicyContext};
use crate::provider::{
    CommandProvider, CommandProviderOptions, Decision, ProviderError, PromptInput,
    ReasoningProvider, build_prompt,
};
use pursuit_core::belief::telemetry::BeliefMetrics;
use pursuit_core::belief::{BeliefConfig, BeliefEstimator};
use pursuit_core::game::GameState;
use pursuit_core::map::TransportGraph;
use pursuit_core::model::location::Location;
use pursuit_core::model::moves::Move;
use pursuit_core::model::role::Role;
use pursuit_core::model::tickets::Ticket;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of most recent moves described in prompts.
    pub history_window: usize,
    pub coordination: bool,
    pub params: BotParams,
    pub simulation: SimulationConfig,
    pub belief: BeliefConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            coordination: true,
            params: BotParams::default(),
            simulation: SimulationConfig::default(),
            belief: BeliefConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base = Self::default();
        let history_window = read("PURSUIT_PROMPT_HISTORY")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(base.history_window)
            .clamp(1, 100);
        let coordination = read("PURSUIT_COORDINATION")
            .map(|raw| flag_enabled(&raw))
            .unwrap_or(base.coordination);
        Self {
            history_window,
            coordination,
            params: base.params,
            simulation: SimulationConfig::from_reader(&mut read),
            belief: BeliefConfig::from_reader(&mut read),
        }
    }
}

/// Command provider described by `PURSUIT_PROVIDER_*`, if a command is set.
pub fn provider_from_env() -> Option<CommandProvider> {
    provider_from_reader(|key| std::env::var(key).ok())
}

fn provider_from_reader<F>(mut read: F) -> Option<CommandProvider>
where
    F: FnMut(&str) -> Option<String>,
{
    let command = read("PURSUIT_PROVIDER_COMMAND").filter(|raw| !raw.trim().is_empty())?;
    let args = read("PURSUIT_PROVIDER_ARGS")
        .map(|raw| raw.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let credential_env = read("PURSUIT_PROVIDER_CREDENTIAL_ENV").filter(|raw| !raw.trim().is_empty());
    let timeout_ms = read("PURSUIT_PROVIDER_TIMEOUT_MS")
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(5_000)
        .clamp(10, 120_000);
    let name = read("PURSUIT_PROVIDER_NAME").unwrap_or_else(|| "command".to_string());
    Some(CommandProvider::new(
        name,
        CommandProviderOptions {
            command,
            args,
            working_dir: None,
            credential_env,
            timeout: Duration::from_millis(timeout_ms),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum DecisionSource {
    Provider(String),
    Local,
    SafeDefault,
}

/// A move plus how it was reached.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub mv: Move,
    pub source: DecisionSource,
    pub candidates: usize,
    pub provider_failures: usize,
    pub belief: Option<BeliefMetrics>,
    pub elapsed_ms: f64,
}

pub struct DecisionEngine {
    graph: Arc<TransportGraph>,
    providers: Vec<Box<dyn ReasoningProvider>>,
    estimator: BeliefEstimator,
    policy: HeuristicPolicy,
    config: EngineConfig,
}

impl DecisionEngine {
    pub fn new(graph: Arc<TransportGraph>, config: EngineConfig) -> Self {
        let estimator = BeliefEstimator::new(config.belief);
        let policy = HeuristicPolicy::new(
            config.params,
            config.simulation,
            estimator.clone(),
            config.coordination,
        );
        Self {
            graph,
            providers: Vec::new(),
            estimator,
            policy,
            config,
        }
    }

    /// Engine configured from `PURSUIT_*` variables, with the command
    /// provider registered when one is described.
    pub fn from_env(graph: Arc<TransportGraph>) -> Self {
        let engine = Self::new(graph, EngineConfig::from_env());
        match provider_from_env() {
            Some(provider) => engine.with_provider(Box::new(provider)),
            None => engine,
        }
    }

    /// Appends a provider at the lowest priority.
    pub fn with_provider(mut self, provider: Box<dyn ReasoningProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn graph(&self) -> &TransportGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    pub fn calculate_move(&self, state: &GameState, role: Role) -> Move {
        self.decide(state, role).mv
    }

    pub fn decide(&self, state: &GameState, role: Role) -> DecisionOutcome {
        let start = Instant::now();
        let graph = self.graph.as_ref();

        let Some(player) = state.player(role) else {
            return self.safe_default(state, role, start, 0, "unknown player");
        };
        if player.position().is_none() {
            return self.safe_default(state, role, start, 0, "missing position");
        }
        let candidates = legal_moves_in(graph, state, role);
        if candidates.is_empty() {
            return self.safe_default(state, role, start, 0, "no legal moves");
        }

        let belief = self.estimator.distribution(graph, state);
        let predictions = self.estimator.predict_locations(graph, state);
        let ctx = PolicyContext {
            graph,
            state,
            role,
            belief: &belief,
            predictions: &predictions,
        };
        let metrics = (!belief.is_empty()).then(|| BeliefMetrics::from_distribution(&belief));

        let mut failures = 0;
        if self.providers.iter().any(|provider| provider.is_configured()) {
            let annotated = self.policy.annotate(&ctx, &candidates);
            let prompt = build_prompt(&PromptInput {
                state,
                role,
                candidates: &annotated,
                belief: &predictions,
                history_window: self.config.history_window,
            });
            for provider in &self.providers {
                if !provider.is_configured() {
                    event!(
                        target: "pursuit_bot::provider",
                        Level::DEBUG,
                        provider = provider.name(),
                        "provider not configured; skipping"
                    );
                    continue;
                }
                let attempt = provider
                    .attempt_decision(&prompt)
                    .and_then(|decision| accept_decision(state, role, &candidates, decision));
                match attempt {
                    Ok(mv) => {
                        let outcome = DecisionOutcome {
                            mv,
                            source: DecisionSource::Provider(provider.name().to_string()),
                            candidates: candidates.len(),
                            provider_failures: failures,
                            belief: metrics.clone(),
                            elapsed_ms: elapsed_ms(start),
                        };
                        log_outcome(&outcome);
                        return outcome;
                    }
                    Err(err) => {
                        failures += 1;
                        event!(
                            target: "pursuit_bot::provider",
                            Level::WARN,
                            provider = provider.name(),
                            role = %role,
                            error = %err,
                            "provider attempt failed; trying next"
                        );
                    }
                }
            }
        }

        match self.policy.choose_move(&ctx, &candidates) {
            Some(mv) => {
                let outcome = DecisionOutcome {
                    mv,
                    source: DecisionSource::Local,
                    candidates: candidates.len(),
                    provider_failures: failures,
                    belief: metrics,
                    elapsed_ms: elapsed_ms(start),
                };
                log_outcome(&outcome);
                outcome
            }
            None => self.safe_default(state, role, start, failures, "local policy declined"),
        }
    }

    fn safe_default(
        &self,
        state: &GameState,
        role: Role,
        start: Instant,
        failures: usize,
        reason: &'static str,
    ) -> DecisionOutcome {
        let position = state
            .player(role)
            .and_then(|player| player.position().or(player.previous_position()))
            .unwrap_or(Location::new(0));
        event!(
            target: "pursuit_bot::engine",
            Level::WARN,
            role = %role,
            position = %position,
            reason,
            "returning safe default move"
        );
        DecisionOutcome {
            mv: Move::stay(role, position),
            source: DecisionSource::SafeDefault,
            candidates: 0,
            provider_failures: failures,
            belief: None,
            elapsed_ms: elapsed_ms(start),
        }
    }
}

/// Checks a provider decision against the legal candidates and the mover's tickets.
fn accept_decision(
    state: &GameState,
    role: Role,
    candidates: &[MoveCandidate],
    decision: Decision,
) -> Result<Move, ProviderError> {
    let candidate = candidates
        .iter()
        .find(|candidate| candidate.matches(decision.mode, decision.target_location))
        .ok_or_else(|| {
            ProviderError::Illegal(format!(
                "no {} edge to {}",
                decision.mode, decision.target_location
            ))
        })?;
    let tickets = state
        .player(role)
        .map(|player| *player.tickets())
        .unwrap_or_default();

    if candidate.concealed && !decision.concealed {
        return Err(ProviderError::Illegal(format!(
            "{} requires a concealment ticket",
            decision.mode
        )));
    }
    if decision.concealed && tickets.count(Ticket::Concealment) == 0 {
        return Err(ProviderError::Illegal("no concealment ticket left".into()));
    }
    if decision.double {
        if !role.is_culprit() {
            return Err(ProviderError::Illegal("only the culprit may double".into()));
        }
        if tickets.count(Ticket::Double) == 0 {
            return Err(ProviderError::Illegal("no double ticket left".into()));
        }
        if state.double_pending() {
            return Err(ProviderError::Illegal("double move already in progress".into()));
        }
        if state.culprit_turns() + 2 > state.max_culprit_turns() {
            return Err(ProviderError::Illegal("no turns left for a second leg".into()));
        }
    }
    Ok(Move::new(role, decision.mode, decision.target_location)
        .with_concealment(decision.concealed)
        .with_double(decision.double))
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn log_outcome(outcome: &DecisionOutcome) {
    let source = match &outcome.source {
        DecisionSource::Provider(name) => name.as_str(),
        DecisionSource::Local => "local",
        DecisionSource::SafeDefault => "safe_default",
    };
    event!(
        target: "pursuit_bot::engine",
        Level::INFO,
        role = %outcome.mv.role,
        source,
        chosen = %outcome.mv,
        candidates = outcome.candidates,
        provider_failures = outcome.provider_failures,
        belief_entropy = outcome.belief.as_ref().map(|metrics| metrics.entropy).unwrap_or(0.0),
        elapsed_ms = outcome.elapsed_ms,
        "decision made"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_core::model::transport::TransportMode;

    #[test]
    fn config_reads_nested_sections() {
        let config = EngineConfig::from_reader(|key| match key {
            "PURSUIT_PROMPT_HISTORY" => Some("4".into()),
            "PURSUIT_COORDINATION" => Some("off".into()),
            "PURSUIT_SIM_TRIALS" => Some("12".into()),
            "PURSUIT_BELIEF_TOP_K" => Some("2".into()),
            _ => None,
        });
        assert_eq!(config.history_window, 4);
        assert!(!config.coordination);
        assert_eq!(config.simulation.trials, 12);
        assert_eq!(config.belief.top_k, 2);
    }

    #[test]
    fn provider_requires_a_command() {
        assert!(provider_from_reader(|_| None).is_none());
        let provider = provider_from_reader(|key| match key {
            "PURSUIT_PROVIDER_COMMAND" => Some("reasoner".into()),
            "PURSUIT_PROVIDER_ARGS" => Some("--fast --json".into()),
            "PURSUIT_PROVIDER_TIMEOUT_MS" => Some("1".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(provider.name(), "command");
        assert_eq!(provider.options().args, vec!["--fast", "--json"]);
        assert_eq!(provider.options().timeout, Duration::from_millis(10));
    }

    #[test]
    fn decisions_outside_the_candidates_are_illegal() {
        let graph = TransportGraph::builtin().unwrap();
        let state = GameState::new(vec![
            pursuit_core::model::player::Player::new(
                Role::Culprit,
                Location::new(1),
                pursuit_core::model::tickets::TicketInventory::culprit_default(1),
            ),
            pursuit_core::model::player::Player::new(
                Role::Detective(1),
                Location::new(13),
                pursuit_core::model::tickets::TicketInventory::detective_default(),
            ),
        ]);
        let candidates = legal_moves_in(&graph, &state, Role::Culprit);
        let decide = |mode, target: u16, concealed, double| {
            accept_decision(
                &state,
                Role::Culprit,
                &candidates,
                Decision {
                    mode,
                    target_location: Location::new(target),
                    concealed,
                    double,
                },
            )
        };
        assert!(decide(TransportMode::Bus, 4, false, false).is_ok());
        assert!(decide(TransportMode::Taxi, 4, false, false).is_err());
        assert!(decide(TransportMode::Ferry, 100, false, false).is_err());
        assert!(decide(TransportMode::Ferry, 100, true, true).is_ok());
    }
}
