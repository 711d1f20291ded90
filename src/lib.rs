//! # elemstat
//!
//! Element-aware stat aggregation for MMORPG actors.
//!
//! Game systems (equipment, cultivation, status effects, events) each hold
//! a slice of an actor's elemental power. This crate collects those slices
//! as [`Contribution`]s, reduces them per stat with configurable
//! [`AggregationStrategy`]s on top of catalog base values, and serves the
//! resulting [`StatBundle`]s through a version-stamped result cache. On
//! the side it answers pairwise element interaction queries and erodes
//! idle element mastery over time.
//!
//! The pipeline, end to end:
//!
//! ```text
//! contributions  -->  collector  -->  aggregator  -->  cache  -->  StatBundle
//!                        |               ^
//!                   version stamp   catalog base values
//! ```
//!
//! # Examples
//!
//! ```rust
//! use elemstat::{
//!     ActorId, BaseProperties, ElementCategory, ElementDefinition, ElementEngine,
//!     EngineConfig, StatKind,
//! };
//!
//! let config = EngineConfig {
//!     elements: vec![ElementDefinition {
//!         id: "fire".into(),
//!         name: "Fire".into(),
//!         category: ElementCategory::Elemental,
//!         base: BaseProperties { power: Some(100.0), ..Default::default() },
//!     }],
//!     ..Default::default()
//! };
//! let engine = ElementEngine::new(config).unwrap();
//! let actor = ActorId::new("hero");
//!
//! // No contributions yet: the bundle is exactly the base values.
//! let bundle = engine.element_stats_by_id(&actor, "fire").unwrap();
//! assert_eq!(bundle.get(StatKind::Power), 100.0);
//!
//! // A sword grants +20 fire power.
//! engine.contribute("equipment", &actor, "fire", "power", 20.0, 2).unwrap();
//! let bundle = engine.element_stats_by_id(&actor, "fire").unwrap();
//! assert_eq!(bundle.get(StatKind::Power), 120.0);
//! ```

pub mod aggregator;
pub mod bundle;
pub mod cache;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod contribution;
pub mod contributor;
pub mod decay;
pub mod engine;
pub mod error;
pub mod ids;
pub mod interaction;
pub mod stat;

pub use aggregator::{AggregationStrategy, Aggregator, StrategyTable, CATALOG_SYSTEM};
pub use bundle::StatBundle;
pub use cache::{CacheConfig, CacheStats, ResultCache};
pub use catalog::{
    BaseProperties, ElementCatalog, ElementCategory, ElementDefinition, ElementIndex,
    DEFAULT_MAX_ELEMENTS,
};
pub use collector::ContributionCollector;
pub use config::{EngineConfig, StrategyKind};
pub use contribution::Contribution;
pub use contributor::{ElementContributor, SystemRegistration};
pub use decay::{DecayConfig, DecayEngine, DecayStatus, DECAY_PRIORITY, DECAY_SYSTEM};
pub use engine::{ChangeListener, ElementEngine, StatsChanged};
pub use error::{ElemResult, ElementError};
pub use ids::{ActorId, ElementId, SystemId};
pub use interaction::{InteractionKind, InteractionMatrix, InteractionRule, RelationGraph};
pub use stat::StatKind;
