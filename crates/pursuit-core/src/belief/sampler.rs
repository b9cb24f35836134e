//! Roulette-wheel draws from a belief distribution.

use super::distribution::BeliefDistribution;
use crate::model::location::Location;
use rand::Rng;

/// Draws locations from a [`BeliefDistribution`] in proportion to their mass.
#[derive(Debug, Default)]
pub struct BeliefSampler;

impl BeliefSampler {
    /// Returns `None` only when the distribution carries no mass.
    pub fn sample<R: Rng + ?Sized>(belief: &BeliefDistribution, rng: &mut R) -> Option<Location> {
        let total = belief.total();
        if !(total.is_finite() && total > 0.0) {
            return None;
        }
        let mut remaining = rng.gen_range(0.0..total);
        let mut last = None;
        for entry in belief.iter() {
            last = Some(entry.location);
            if remaining < entry.probability {
                return Some(entry.location);
            }
            remaining -= entry.probability;
        }
        last
    }
}
