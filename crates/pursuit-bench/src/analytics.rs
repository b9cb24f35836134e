use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use pursuit_core::game::Side;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::BenchmarkConfig;
use crate::tournament::GameOutcome;

const CONFIDENCE: f64 = 0.95;
const FALLBACK_Z: f64 = 1.96;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Accumulates per-game outcomes into run-level statistics.
pub struct AnalyticsCollector {
    run_id: String,
    map: String,
    detectives: usize,
    culprit_wins: Vec<f64>,
    culprit_turns: Vec<f64>,
    unfinished: usize,
    moves: usize,
    corrections: usize,
    decisions: u64,
    local: u64,
    safe_default: u64,
    provider_failures: u64,
    total_latency_ms: f64,
    providers: BTreeMap<String, u64>,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig, map: &str) -> Self {
        Self {
            run_id: config.run_id.clone(),
            map: map.to_string(),
            detectives: config.games.detectives,
            culprit_wins: Vec::new(),
            culprit_turns: Vec::new(),
            unfinished: 0,
            moves: 0,
            corrections: 0,
            decisions: 0,
            local: 0,
            safe_default: 0,
            provider_failures: 0,
            total_latency_ms: 0.0,
            providers: BTreeMap::new(),
        }
    }

    pub fn record_game(&mut self, outcome: &GameOutcome) {
        match outcome.winner {
            Some(Side::Culprit) => self.culprit_wins.push(1.0),
            Some(Side::Detectives) => self.culprit_wins.push(0.0),
            None => self.unfinished += 1,
        }
        self.culprit_turns.push(f64::from(outcome.culprit_turns));
        self.moves += outcome.moves;
        self.corrections += outcome.corrections;

        let metrics = &outcome.decisions;
        self.decisions += u64::from(metrics.decisions);
        self.local += u64::from(metrics.local);
        self.safe_default += u64::from(metrics.safe_default);
        self.provider_failures += u64::from(metrics.provider_failures);
        self.total_latency_ms += metrics.total_ms;
        for (name, count) in &metrics.providers {
            *self.providers.entry(name.clone()).or_insert(0) += u64::from(*count);
        }
    }

    pub fn finalize(self) -> AnalyticsSummary {
        let games = self.culprit_turns.len();
        let finished = self.culprit_wins.len();
        let culprit_wins = self.culprit_wins.iter().filter(|win| **win > 0.5).count();

        AnalyticsSummary {
            run_id: self.run_id,
            map: self.map,
            detectives: self.detectives,
            games,
            culprit_wins,
            detective_wins: finished - culprit_wins,
            unfinished: self.unfinished,
            culprit_win_rate: mean(&self.culprit_wins),
            culprit_win_ci95: confidence_interval(&self.culprit_wins),
            balance_p_value: balance_p_value(culprit_wins, finished),
            avg_culprit_turns: mean(&self.culprit_turns),
            culprit_turns_ci95: confidence_interval(&self.culprit_turns),
            avg_moves: if games == 0 {
                0.0
            } else {
                self.moves as f64 / games as f64
            },
            corrections: self.corrections,
            decisions: self.decisions,
            local_decisions: self.local,
            safe_default_decisions: self.safe_default,
            provider_failures: self.provider_failures,
            provider_decisions: self.providers,
            average_ms_per_decision: if self.decisions == 0 {
                0.0
            } else {
                self.total_latency_ms / self.decisions as f64
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub map: String,
    pub detectives: usize,
    pub games: usize,
    pub culprit_wins: usize,
    pub detective_wins: usize,
    pub unfinished: usize,
    pub culprit_win_rate: f64,
    pub culprit_win_ci95: (f64, f64),
    /// Two-sided p-value against an even 50% culprit win rate.
    pub balance_p_value: f64,
    pub avg_culprit_turns: f64,
    pub culprit_turns_ci95: (f64, f64),
    pub avg_moves: f64,
    pub corrections: usize,
    pub decisions: u64,
    pub local_decisions: u64,
    pub safe_default_decisions: u64,
    pub provider_failures: u64,
    pub provider_decisions: BTreeMap<String, u64>,
    pub average_ms_per_decision: f64,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.to_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut rows = String::new();
        rows.push_str(&format!("# Pursuit Benchmark: {}\n\n", self.run_id));
        rows.push_str(&format!(
            "Map `{}`, {} detective{}, {} game{}.\n\n",
            self.map,
            self.detectives,
            if self.detectives == 1 { "" } else { "s" },
            self.games,
            if self.games == 1 { "" } else { "s" },
        ));

        rows.push_str("| Metric | Value | 95% CI |\n");
        rows.push_str("|--------|-------|--------|\n");
        rows.push_str(&format!(
            "| Culprit win % | {:.1}% | [{:.1}%, {:.1}%] |\n",
            self.culprit_win_rate * 100.0,
            self.culprit_win_ci95.0 * 100.0,
            self.culprit_win_ci95.1 * 100.0,
        ));
        rows.push_str(&format!(
            "| Culprit turns | {:.2} | [{:.2}, {:.2}] |\n",
            self.avg_culprit_turns, self.culprit_turns_ci95.0, self.culprit_turns_ci95.1,
        ));
        rows.push_str(&format!("| Moves per game | {:.2} | |\n", self.avg_moves));
        rows.push_str(&format!(
            "| Balance p-value | {:.3} | |\n",
            self.balance_p_value
        ));
        rows.push_str(&format!(
            "| Avg ms/decision | {:.2} | |\n",
            self.average_ms_per_decision
        ));
        if self.unfinished > 0 {
            rows.push_str(&format!("| Unfinished games | {} | |\n", self.unfinished));
        }

        rows.push_str("\n## Decision sources\n\n");
        rows.push_str("| Source | Decisions | Share |\n");
        rows.push_str("|--------|-----------|-------|\n");
        for (name, count) in &self.provider_decisions {
            rows.push_str(&self.source_row(&format!("provider `{name}`"), *count));
        }
        rows.push_str(&self.source_row("local policy", self.local_decisions));
        rows.push_str(&self.source_row("safe default", self.safe_default_decisions));
        rows.push_str(&format!(
            "\nProvider failures: {}. Rejected engine moves: {}.\n",
            self.provider_failures, self.corrections
        ));
        rows
    }

    fn source_row(&self, label: &str, count: u64) -> String {
        let share = if self.decisions == 0 {
            0.0
        } else {
            count as f64 / self.decisions as f64
        };
        format!("| {label} | {count} | {:.1}% |\n", share * 100.0)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn standard_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

fn critical_value() -> f64 {
    standard_normal()
        .map(|normal| normal.inverse_cdf(0.5 + CONFIDENCE / 2.0))
        .unwrap_or(FALLBACK_Z)
}

fn confidence_interval(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = mean(values);
    if values.len() == 1 {
        return (mean, mean);
    }
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() as f64 - 1.0);
    let std_error = (variance / values.len() as f64).sqrt();
    let margin = critical_value() * std_error;
    (mean - margin, mean + margin)
}

fn balance_p_value(wins: usize, games: usize) -> f64 {
    if games == 0 {
        return 1.0;
    }
    let n = games as f64;
    let z = (wins as f64 - n * 0.5).abs() / (n * 0.25).sqrt();
    let Some(normal) = standard_normal() else {
        return 1.0;
    };
    (2.0 * (1.0 - normal.cdf(z))).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_value_matches_two_sided_95() {
        assert!((critical_value() - 1.959_964).abs() < 1e-4);
    }

    #[test]
    fn interval_brackets_mean() {
        let values = [10.0, 12.0, 14.0, 16.0];
        let (low, high) = confidence_interval(&values);
        assert!(low < 13.0 && 13.0 < high);
        assert!((high - 13.0 - (13.0 - low)).abs() < 1e-9);
        assert_eq!(confidence_interval(&[7.0]), (7.0, 7.0));
        assert_eq!(confidence_interval(&[]), (0.0, 0.0));
    }

    #[test]
    fn even_split_is_balanced() {
        assert!((balance_p_value(5, 10) - 1.0).abs() < 1e-9);
        assert!(balance_p_value(20, 20) < 0.001);
        assert_eq!(balance_p_value(0, 0), 1.0);
    }
}
