use std::collections::BTreeMap;

use pursuit_bot::{DecisionOutcome, DecisionSource};

#[derive(Debug, Default)]
pub(crate) struct DecisionMetrics {
    total_ms: f64,
    decisions: u32,
    local: u32,
    safe_default: u32,
    provider_failures: u32,
    providers: BTreeMap<String, u32>,
}

impl DecisionMetrics {
    pub(crate) fn record(&mut self, outcome: &DecisionOutcome) {
        self.total_ms += outcome.elapsed_ms;
        self.decisions += 1;
        self.provider_failures += u32::try_from(outcome.provider_failures).unwrap_or(u32::MAX);
        match &outcome.source {
            DecisionSource::Provider(name) => {
                *self.providers.entry(name.clone()).or_insert(0) += 1;
            }
            DecisionSource::Local => self.local += 1,
            DecisionSource::SafeDefault => self.safe_default += 1,
        }
    }

    pub(crate) fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total_ms / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            local: self.local,
            safe_default: self.safe_default,
            provider_failures: self.provider_failures,
            providers: self.providers,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total_ms,
        }
    }
}

/// Decision counts for one game, split by where each move came from.
#[derive(Debug, Clone, Default)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub local: u32,
    pub safe_default: u32,
    pub provider_failures: u32,
    pub providers: BTreeMap<String, u32>,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

impl DecisionSummary {
    pub fn provider_decisions(&self) -> u32 {
        self.providers.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_core::model::location::Location;
    use pursuit_core::model::moves::Move;
    use pursuit_core::model::role::Role;

    fn outcome(source: DecisionSource, failures: usize, elapsed_ms: f64) -> DecisionOutcome {
        DecisionOutcome {
            mv: Move::stay(Role::Culprit, Location::new(1)),
            source,
            candidates: 1,
            provider_failures: failures,
            belief: None,
            elapsed_ms,
        }
    }

    #[test]
    fn splits_decisions_by_source() {
        let mut metrics = DecisionMetrics::default();
        metrics.record(&outcome(DecisionSource::Provider("planner".into()), 0, 4.0));
        metrics.record(&outcome(DecisionSource::Provider("planner".into()), 1, 2.0));
        metrics.record(&outcome(DecisionSource::Local, 2, 1.0));
        metrics.record(&outcome(DecisionSource::SafeDefault, 0, 1.0));

        let summary = metrics.finalize();
        assert_eq!(summary.decisions, 4);
        assert_eq!(summary.provider_decisions(), 2);
        assert_eq!(summary.providers.get("planner"), Some(&2));
        assert_eq!(summary.local, 1);
        assert_eq!(summary.safe_default, 1);
        assert_eq!(summary.provider_failures, 3);
        assert!((summary.avg_ms_per_decision - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_metrics_average_to_zero() {
        let summary = DecisionMetrics::default().finalize();
        assert_eq!(summary.decisions, 0);
        assert_eq!(summary.avg_ms_per_decision, 0.0);
    }
}
