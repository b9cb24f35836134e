//! Probabilistic tracking of the culprit's hidden position.
//!
//! This module is composed of:
//! - `distribution`: the renormalized working set (`BeliefDistribution`).
//! - `estimator`: reveal seeding and per-turn propagation over the map.
//! - `sampler`: roulette-wheel draws used by simulation playouts.
//! - `telemetry`: entropy summaries for structured logs.

mod distribution;
mod estimator;
mod sampler;
pub mod telemetry;

pub use distribution::{BeliefDistribution, BeliefEntry};
pub use estimator::{BeliefConfig, BeliefEstimator, StepContext};
pub use sampler::BeliefSampler;
