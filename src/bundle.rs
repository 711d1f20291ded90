//! Aggregate stat bundles.
//!
//! A [`StatBundle`] is the computed output for one (actor, element): a map
//! from stat to final value after aggregation. Bundles are pure values,
//! regenerated whole by the aggregator and never partially mutated.

use crate::stat::StatKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregated stat values for one (actor, element).
///
/// # Examples
///
/// ```rust
/// use elemstat::{StatBundle, StatKind};
///
/// let mut bundle = StatBundle::new();
/// bundle.set(StatKind::Power, 125.0);
///
/// assert_eq!(bundle.get(StatKind::Power), 125.0);
/// assert_eq!(bundle.get(StatKind::Defense), 0.0); // documented default
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBundle {
    values: HashMap<StatKind, f64>,
}

impl StatBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Final value for a stat, or `0.0` if the bundle has no entry for it.
    pub fn get(&self, stat: StatKind) -> f64 {
        self.values.get(&stat).copied().unwrap_or(0.0)
    }

    /// Whether the bundle carries an entry for this stat.
    pub fn contains(&self, stat: StatKind) -> bool {
        self.values.contains_key(&stat)
    }

    /// Set the value for a stat.
    pub fn set(&mut self, stat: StatKind, value: f64) {
        self.values.insert(stat, value);
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (StatKind, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bundle has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stats whose value differs between `self` and `previous`, sorted for
    /// deterministic event payloads. Stats present on only one side count
    /// as changed.
    pub fn changed_stats(&self, previous: &StatBundle) -> Vec<StatKind> {
        let mut changed: Vec<StatKind> = self
            .values
            .iter()
            .filter(|(stat, value)| previous.values.get(stat) != Some(value))
            .map(|(stat, _)| *stat)
            .chain(
                previous
                    .values
                    .keys()
                    .filter(|stat| !self.values.contains_key(stat))
                    .copied(),
            )
            .collect();
        changed.sort();
        changed.dedup();
        changed
    }
}

impl FromIterator<(StatKind, f64)> for StatBundle {
    fn from_iter<I: IntoIterator<Item = (StatKind, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
