use crate::model::location::Location;
use crate::model::transport::TransportMode;
use serde::Serialize;
use std::collections::BTreeMap;

/// One candidate location with its probability and the mode that most likely
/// brought the culprit there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BeliefEntry {
    pub location: Location,
    pub probability: f32,
    pub mode: Option<TransportMode>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Mass {
    probability: f32,
    mode: Option<TransportMode>,
    strongest: f32,
}

/// Probability mass over candidate culprit locations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeliefDistribution {
    entries: BTreeMap<Location, Mass>,
}

impl BeliefDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Singleton distribution used right after a reveal.
    pub fn certain(location: Location, mode: Option<TransportMode>) -> Self {
        let mut distribution = Self::new();
        distribution.add_mass(location, 1.0, mode);
        distribution
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = BeliefEntry>,
    {
        let mut distribution = Self::new();
        for entry in entries {
            distribution.add_mass(entry.location, entry.probability, entry.mode);
        }
        distribution
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total(&self) -> f32 {
        self.entries.values().map(|mass| mass.probability).sum()
    }

    pub fn probability(&self, location: Location) -> f32 {
        self.entries
            .get(&location)
            .map(|mass| mass.probability)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = BeliefEntry> + '_ {
        self.entries.iter().map(|(location, mass)| BeliefEntry {
            location: *location,
            probability: mass.probability,
            mode: mass.mode,
        })
    }

    pub fn locations(&self) -> Vec<Location> {
        self.entries.keys().copied().collect()
    }

    /// Accumulates mass at `location`. The recorded mode follows the single
    /// largest contribution.
    pub fn add_mass(&mut self, location: Location, probability: f32, mode: Option<TransportMode>) {
        if !probability.is_finite() || probability <= 0.0 {
            return;
        }
        let entry = self.entries.entry(location).or_insert(Mass {
            probability: 0.0,
            mode,
            strongest: 0.0,
        });
        entry.probability += probability;
        if probability > entry.strongest {
            entry.strongest = probability;
            entry.mode = mode;
        }
    }

    pub fn remove(&mut self, location: Location) -> f32 {
        self.entries
            .remove(&location)
            .map(|mass| mass.probability)
            .unwrap_or(0.0)
    }

    /// Scales the working set to sum to one. Returns `false` when there is no
    /// mass to scale.
    pub fn renormalize(&mut self) -> bool {
        let total = self.total();
        if !(total.is_finite() && total > 0.0) {
            return false;
        }
        for mass in self.entries.values_mut() {
            mass.probability /= total;
            mass.strongest /= total;
        }
        true
    }

    pub fn prune(&mut self, threshold: f32) {
        self.entries.retain(|_, mass| mass.probability >= threshold);
    }

    /// Entries sorted by descending probability, ties broken by location id.
    pub fn ranked(&self) -> Vec<BeliefEntry> {
        let mut entries: Vec<BeliefEntry> = self.iter().collect();
        entries.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.location.cmp(&b.location))
        });
        entries
    }

    pub fn top(&self, count: usize) -> Vec<BeliefEntry> {
        let mut ranked = self.ranked();
        ranked.truncate(count);
        ranked
    }

    pub fn most_likely(&self) -> Option<BeliefEntry> {
        self.ranked().into_iter().next()
    }
}
