pub mod bot;
pub mod engine;
pub mod policy;
pub mod provider;

pub use bot::{
    Assignments, BotParams, Hop, MonteCarloEvaluator, MoveCandidate, PlayoutError, Pursuer,
    SimulationConfig, SimulationContext, assign_moves, legal_moves, legal_moves_in,
};
pub use engine::{DecisionEngine, DecisionOutcome, DecisionSource, EngineConfig};
pub use policy::{HeuristicPolicy, Policy, PolicyContext};
pub use provider::{
    CommandProvider, CommandProviderOptions, Decision, ProviderError, ReasoningProvider,
};
