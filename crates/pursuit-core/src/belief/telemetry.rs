use super::distribution::BeliefDistribution;
use crate::model::location::Location;
use serde::Serialize;

/// Summary of a belief distribution for structured logs.
#[derive(Debug, Clone, Serialize)]
pub struct BeliefMetrics {
    pub candidates: usize,
    pub entropy: f32,
    pub top_location: Option<Location>,
    pub top_probability: f32,
}

impl BeliefMetrics {
    pub fn from_distribution(belief: &BeliefDistribution) -> Self {
        let mut entropy = 0.0;
        for entry in belief.iter() {
            if entry.probability > 0.0 {
                entropy -= entry.probability * entry.probability.ln();
            }
        }
        let top = belief.most_likely();
        Self {
            candidates: belief.len(),
            entropy,
            top_location: top.map(|entry| entry.location),
            top_probability: top.map(|entry| entry.probability).unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::BeliefEntry;

    #[test]
    fn certain_belief_has_zero_entropy() {
        let metrics =
            BeliefMetrics::from_distribution(&BeliefDistribution::certain(Location::new(5), None));
        assert_eq!(metrics.candidates, 1);
        assert!(metrics.entropy.abs() < 1e-6);
        assert_eq!(metrics.top_location, Some(Location::new(5)));
    }

    #[test]
    fn uniform_belief_has_log_entropy() {
        let belief = BeliefDistribution::from_entries((1..=4).map(|id| BeliefEntry {
            location: Location::new(id),
            probability: 0.25,
            mode: None,
        }));
        let metrics = BeliefMetrics::from_distribution(&belief);
        assert!((metrics.entropy - 4.0_f32.ln()).abs() < 1e-5);
    }
}
