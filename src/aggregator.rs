//! Contribution aggregation.
//!
//! The aggregator reduces the set of contributions for each stat of one
//! (actor, element) into a final value using a per-stat
//! [`AggregationStrategy`]. It only reads contribution data; interaction
//! factors are a separate lookup service
//! ([`InteractionMatrix`](crate::InteractionMatrix)) and are never applied
//! here.
//!
//! Base-value semantics: an element's configured base property enters
//! aggregation as an implicit first contribution from the synthetic
//! `"catalog"` system at minimum priority. This unifies the
//! "no contributions" case (the base alone survives every strategy) with
//! the contributing case (e.g. `Sum` over base 100 + item 20 + race 5
//! yields 125) under one code path.

use crate::bundle::StatBundle;
use crate::catalog::{ElementDefinition, ElementIndex};
use crate::contribution::Contribution;
use crate::error::{ElemResult, ElementError};
use crate::ids::ActorId;
use crate::stat::StatKind;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::error;

/// System id attributed to implicit base-property contributions.
pub const CATALOG_SYSTEM: &str = "catalog";

/// Strategy for reducing a stat's contributions to one value.
///
/// `First` selects the contribution with the strictly highest priority,
/// ties broken by earliest insertion. `Last` selects the most recently
/// inserted contribution regardless of priority. `Custom` functions must be
/// pure and deterministic for an identical input order; they receive the
/// contributions in priority order (descending).
#[derive(Clone, Default)]
pub enum AggregationStrategy {
    /// Arithmetic sum of all values.
    #[default]
    Sum,
    /// Product of all values.
    Multiply,
    /// Maximum value.
    Max,
    /// Minimum value.
    Min,
    /// Arithmetic mean.
    Average,
    /// Highest-priority contribution wins.
    First,
    /// Most recently inserted contribution wins.
    Last,
    /// Caller-supplied reduction over the priority-ordered sequence.
    Custom(Arc<dyn Fn(&[Contribution]) -> f64 + Send + Sync>),
}

impl std::fmt::Debug for AggregationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationStrategy::Sum => write!(f, "Sum"),
            AggregationStrategy::Multiply => write!(f, "Multiply"),
            AggregationStrategy::Max => write!(f, "Max"),
            AggregationStrategy::Min => write!(f, "Min"),
            AggregationStrategy::Average => write!(f, "Average"),
            AggregationStrategy::First => write!(f, "First"),
            AggregationStrategy::Last => write!(f, "Last"),
            AggregationStrategy::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Per-stat strategy assignment. Unassigned stats aggregate with `Sum`.
#[derive(Debug, Clone, Default)]
pub struct StrategyTable {
    by_stat: HashMap<StatKind, AggregationStrategy>,
    default: AggregationStrategy,
}

impl StrategyTable {
    /// Create a table where every stat uses `Sum`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a strategy to a stat.
    pub fn set(&mut self, stat: StatKind, strategy: AggregationStrategy) {
        self.by_stat.insert(stat, strategy);
    }

    /// Strategy for a stat.
    pub fn get(&self, stat: StatKind) -> &AggregationStrategy {
        self.by_stat.get(&stat).unwrap_or(&self.default)
    }
}

/// Reduces contributions into [`StatBundle`]s.
#[derive(Debug, Default)]
pub struct Aggregator {
    strategies: StrategyTable,
}

impl Aggregator {
    /// Create an aggregator with the given strategy table.
    pub fn new(strategies: StrategyTable) -> Self {
        Self { strategies }
    }

    /// The strategy table in use.
    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    /// Compute the aggregate bundle for one (actor, element).
    ///
    /// The bundle covers the union of stats with contributions and stats
    /// with a configured base property; everything else is absent and reads
    /// as `0.0` through [`StatBundle::get`]. `actor` is carried for fault
    /// context only.
    pub fn compute(
        &self,
        actor: &ActorId,
        definition: &ElementDefinition,
        element: ElementIndex,
        contributions: &HashMap<StatKind, Vec<Contribution>>,
    ) -> ElemResult<StatBundle> {
        let mut stats: BTreeSet<StatKind> = contributions.keys().copied().collect();
        for stat in StatKind::iter() {
            if definition.base.value_for(stat).is_some() {
                stats.insert(stat);
            }
        }

        let mut bundle = StatBundle::new();
        for stat in stats {
            let list = contributions.get(&stat).map(Vec::as_slice).unwrap_or(&[]);
            let base = definition.base.value_for(stat);
            if list.is_empty() && base.is_none() {
                error!(
                    actor = %actor,
                    element = %element,
                    stat = %stat,
                    "stat reached aggregation with no contributions and no base value"
                );
                return Err(ElementError::AggregationFault {
                    actor: actor.clone(),
                    element: element.get(),
                    stat,
                });
            }
            let value = self.reduce(self.strategies.get(stat), element, stat, base, list);
            bundle.set(stat, value);
        }
        Ok(bundle)
    }

    /// Apply one strategy to the base value plus recorded contributions.
    fn reduce(
        &self,
        strategy: &AggregationStrategy,
        element: ElementIndex,
        stat: StatKind,
        base: Option<f64>,
        list: &[Contribution],
    ) -> f64 {
        // Priority-descending order with the implicit base contribution at
        // the very end (minimum priority, inserted before everything).
        let mut ordered: Vec<Contribution> = list.to_vec();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
        if let Some(base_value) = base {
            ordered.push(base_contribution(element, stat, base_value));
        }

        match strategy {
            AggregationStrategy::Sum => ordered.iter().map(|c| c.value).sum(),
            AggregationStrategy::Multiply => ordered.iter().map(|c| c.value).product(),
            AggregationStrategy::Max => ordered
                .iter()
                .map(|c| c.value)
                .fold(f64::NEG_INFINITY, f64::max),
            AggregationStrategy::Min => ordered
                .iter()
                .map(|c| c.value)
                .fold(f64::INFINITY, f64::min),
            AggregationStrategy::Average => {
                ordered.iter().map(|c| c.value).sum::<f64>() / ordered.len() as f64
            }
            AggregationStrategy::First => ordered[0].value,
            AggregationStrategy::Last => ordered
                .iter()
                .max_by_key(|c| c.seq)
                .map(|c| c.value)
                .unwrap_or(0.0),
            AggregationStrategy::Custom(reduce) => reduce(&ordered),
        }
    }
}

/// The implicit base-property contribution.
fn base_contribution(element: ElementIndex, stat: StatKind, value: f64) -> Contribution {
    Contribution::with_timestamp(
        CATALOG_SYSTEM.into(),
        element,
        stat,
        value,
        i64::MIN,
        DateTime::<Utc>::MIN_UTC,
    )
}
