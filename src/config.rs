//! Engine configuration.
//!
//! Everything an [`crate::engine::ElementEngine`] needs at construction
//! time, shaped for deserialization from whatever format the host game
//! loads its data files in. Every field defaults, so an empty document
//! yields a working (if element-less) engine.

use crate::aggregator::AggregationStrategy;
use crate::cache::CacheConfig;
use crate::catalog::{ElementDefinition, DEFAULT_MAX_ELEMENTS};
use crate::decay::DecayConfig;
use crate::interaction::InteractionRule;
use crate::stat::StatKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serializable name for an aggregation strategy.
///
/// Custom closures are code, not data, so they are absent here; hosts
/// install them through [`crate::aggregator::StrategyTable`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Sum,
    Multiply,
    Max,
    Min,
    Average,
    First,
    Last,
}

impl From<StrategyKind> for AggregationStrategy {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Sum => AggregationStrategy::Sum,
            StrategyKind::Multiply => AggregationStrategy::Multiply,
            StrategyKind::Max => AggregationStrategy::Max,
            StrategyKind::Min => AggregationStrategy::Min,
            StrategyKind::Average => AggregationStrategy::Average,
            StrategyKind::First => AggregationStrategy::First,
            StrategyKind::Last => AggregationStrategy::Last,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Catalog capacity. Defaults to [`DEFAULT_MAX_ELEMENTS`].
    pub max_elements: Option<usize>,
    /// Elements registered at startup, in index order.
    pub elements: Vec<ElementDefinition>,
    /// Pairwise interaction rules.
    pub interactions: Vec<InteractionRule>,
    /// Per-stat strategy overrides; unlisted stats sum.
    pub strategies: HashMap<StatKind, StrategyKind>,
    /// Result cache tuning.
    pub cache: CacheConfig,
    /// Mastery decay tuning.
    pub decay: DecayConfig,
}

impl EngineConfig {
    /// Effective catalog capacity.
    pub fn capacity(&self) -> usize {
        self.max_elements.unwrap_or(DEFAULT_MAX_ELEMENTS)
    }
}
