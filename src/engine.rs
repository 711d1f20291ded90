//! Engine facade.
//!
//! [`ElementEngine`] wires the catalog, collector, aggregator, cache,
//! interaction tables and decay machinery into one shared handle. Game
//! systems talk to it either through the typed API or through the
//! string-boundary helpers that resolve element and stat names at the
//! edge.
//!
//! Mutations always land in the collector before the cache entry is
//! invalidated. The window where a reader could race the invalidation is
//! closed by the version stamp: a bundle computed from a pre-mutation
//! snapshot carries a stale stamp and is never served.

use crate::aggregator::Aggregator;
use crate::bundle::StatBundle;
use crate::cache::{CacheStats, ResultCache};
use crate::catalog::{ElementCatalog, ElementIndex};
use crate::collector::ContributionCollector;
use crate::config::EngineConfig;
use crate::contribution::Contribution;
use crate::contributor::{ElementContributor, SystemRegistration};
use crate::decay::{DecayEngine, DecayStatus};
use crate::error::{ElemResult, ElementError};
use crate::ids::{ActorId, ElementId, SystemId};
use crate::interaction::{InteractionMatrix, InteractionRule, RelationGraph};
use crate::stat::StatKind;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use strum::IntoEnumIterator;
use tracing::{debug, info};

/// Fired after a recomputation produces different stat values.
#[derive(Debug, Clone)]
pub struct StatsChanged {
    pub actor: ActorId,
    pub element: ElementId,
    pub changed: Vec<StatKind>,
}

/// Callback invoked on stat changes. Must be cheap; it runs on the
/// reading thread.
pub type ChangeListener = Box<dyn Fn(&StatsChanged) + Send + Sync>;

/// Interaction state swapped atomically on reload.
struct InteractionTables {
    matrix: InteractionMatrix,
    relations: RelationGraph,
}

/// The element stat engine.
///
/// Cheap to share behind an [`Arc`]; every method takes `&self`.
///
/// # Examples
///
/// ```rust
/// use elemstat::{
///     BaseProperties, ElementCategory, ElementDefinition, ElementEngine, EngineConfig,
/// };
///
/// let config = EngineConfig {
///     elements: vec![ElementDefinition {
///         id: "fire".into(),
///         name: "Fire".into(),
///         category: ElementCategory::Elemental,
///         base: BaseProperties { power: Some(100.0), ..Default::default() },
///     }],
///     ..Default::default()
/// };
/// let engine = ElementEngine::new(config).unwrap();
/// let actor = elemstat::ActorId::new("hero");
///
/// engine.contribute("item", &actor, "fire", "power", 20.0, 2).unwrap();
/// let bundle = engine.element_stats_by_id(&actor, "fire").unwrap();
/// assert_eq!(bundle.get(elemstat::StatKind::Power), 120.0);
/// ```
pub struct ElementEngine {
    catalog: Arc<ElementCatalog>,
    collector: ContributionCollector,
    aggregator: Aggregator,
    cache: ResultCache,
    interactions: RwLock<InteractionTables>,
    systems: DashMap<SystemId, SystemRegistration>,
    decay: DecayEngine,
    /// Shared handles so dispatch can run without holding the lock; a
    /// listener may itself subscribe or trigger a recompute.
    listeners: RwLock<Vec<Arc<ChangeListener>>>,
}

impl ElementEngine {
    /// Build an engine from configuration.
    pub fn new(config: EngineConfig) -> ElemResult<Self> {
        let catalog = Arc::new(ElementCatalog::from_definitions(
            config.capacity(),
            config.elements,
        )?);
        let matrix = InteractionMatrix::from_rules(&catalog, &config.interactions)?;
        let relations = RelationGraph::from_rules(&catalog, &config.interactions)?;

        let mut strategies = crate::aggregator::StrategyTable::new();
        for (stat, kind) in &config.strategies {
            strategies.set(*stat, (*kind).into());
        }

        info!(elements = catalog.len(), "element engine initialized");
        Ok(Self {
            collector: ContributionCollector::new(catalog.len()),
            aggregator: Aggregator::new(strategies),
            cache: ResultCache::new(config.cache),
            interactions: RwLock::new(InteractionTables { matrix, relations }),
            systems: DashMap::new(),
            decay: DecayEngine::new(config.decay),
            listeners: RwLock::new(Vec::new()),
            catalog,
        })
    }

    /// The element catalog.
    pub fn catalog(&self) -> &ElementCatalog {
        &self.catalog
    }

    // Interaction tables hold no invariant that a panicked writer could
    // break mid-update, so a poisoned lock is safe to read through.
    fn tables(&self) -> RwLockReadGuard<'_, InteractionTables> {
        match self.interactions.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn tables_mut(&self) -> RwLockWriteGuard<'_, InteractionTables> {
        match self.interactions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Resolve an element identifier.
    pub fn element_index(&self, id: &str) -> ElemResult<ElementIndex> {
        self.catalog
            .lookup(id)
            .ok_or_else(|| ElementError::UnknownElement { id: id.to_string() })
    }

    /// String-boundary contribution entry point for scripts and data
    /// tables. Resolves names, then delegates to [`ElementEngine::record`].
    pub fn contribute(
        &self,
        system: &str,
        actor: &ActorId,
        element: &str,
        stat: &str,
        value: f64,
        priority: i64,
    ) -> ElemResult<()> {
        let element = self.element_index(element)?;
        let stat = StatKind::parse(stat)?;
        self.record(
            actor,
            Contribution::new(SystemId::new(system), element, stat, value, priority),
        )
    }

    /// Record a typed contribution and invalidate the cached bundle.
    pub fn record(&self, actor: &ActorId, contribution: Contribution) -> ElemResult<()> {
        let element = contribution.element;
        self.collector.record(actor, contribution)?;
        self.cache.invalidate(&(actor.clone(), element));
        Ok(())
    }

    /// Withdraw one system's contributions for a triple. Returns how many
    /// were removed.
    pub fn withdraw(
        &self,
        system: &SystemId,
        actor: &ActorId,
        element: ElementIndex,
        stat: StatKind,
    ) -> usize {
        let removed = self.collector.withdraw(system, actor, element, stat);
        if removed > 0 {
            self.cache.invalidate(&(actor.clone(), element));
        }
        removed
    }

    /// Aggregated stats for one (actor, element), cached.
    ///
    /// On a recomputation that changes any stat value, registered change
    /// listeners fire before the result is returned.
    pub fn element_stats(&self, actor: &ActorId, element: ElementIndex) -> ElemResult<StatBundle> {
        let key = (actor.clone(), element);
        let current = self.collector.version(actor);
        if let Some(bundle) = self.cache.get(&key, current) {
            return Ok(bundle);
        }

        let definition = self.catalog.describe(element)?;
        let (stamp, contributions) = self.collector.snapshot(actor, element);
        let bundle = self
            .aggregator
            .compute(actor, definition, element, &contributions)?;

        let previous = self.cache.peek(&key);
        self.cache.put(key, stamp, bundle.clone());

        let changed = match &previous {
            Some(prior) => bundle.changed_stats(prior),
            None => {
                let mut stats: Vec<StatKind> = bundle.iter().map(|(stat, _)| stat).collect();
                stats.sort();
                stats
            }
        };
        if !changed.is_empty() {
            self.notify(StatsChanged {
                actor: actor.clone(),
                element: definition.id.clone(),
                changed,
            });
        }
        Ok(bundle)
    }

    /// [`ElementEngine::element_stats`] with a string element id.
    pub fn element_stats_by_id(&self, actor: &ActorId, element: &str) -> ElemResult<StatBundle> {
        let element = self.element_index(element)?;
        self.element_stats(actor, element)
    }

    /// Damage factor when `source` attacks `target`.
    pub fn interaction_factor(&self, source: ElementIndex, target: ElementIndex) -> f64 {
        self.tables().matrix.factor(source, target)
    }

    /// [`ElementEngine::interaction_factor`] with string element ids.
    pub fn interaction_factor_by_id(&self, source: &str, target: &str) -> ElemResult<f64> {
        let source = self.element_index(source)?;
        let target = self.element_index(target)?;
        Ok(self.interaction_factor(source, target))
    }

    /// Overwrite one interaction factor at runtime.
    pub fn set_interaction_factor(
        &self,
        source: ElementIndex,
        target: ElementIndex,
        factor: f64,
    ) -> ElemResult<()> {
        self.tables_mut().matrix.set_factor(source, target, factor)
    }

    /// Replace the interaction tables from a new rule set, atomically.
    pub fn reload_interactions(&self, rules: &[InteractionRule]) -> ElemResult<()> {
        let matrix = InteractionMatrix::from_rules(&self.catalog, rules)?;
        let relations = RelationGraph::from_rules(&self.catalog, rules)?;
        *self.tables_mut() = InteractionTables { matrix, relations };
        info!(rules = rules.len(), "interaction tables reloaded");
        Ok(())
    }

    /// Register a contributor system for bookkeeping and introspection.
    pub fn register_system(&self, registration: SystemRegistration) {
        debug!(system = %registration.system, priority = registration.priority, "system registered");
        self.systems.insert(registration.system.clone(), registration);
    }

    /// Registration for one system, if present.
    pub fn system(&self, system: &SystemId) -> Option<SystemRegistration> {
        self.systems.get(system).map(|entry| entry.clone())
    }

    /// All registered systems, unordered.
    pub fn systems(&self) -> Vec<SystemRegistration> {
        self.systems.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Pull a contributor's current output for one (actor, element) and
    /// replace its previous contributions wholesale.
    ///
    /// All-or-nothing: the whole batch is validated before anything is
    /// withdrawn, so a rejected value leaves the collector exactly as it
    /// was.
    pub fn apply_contributor(
        &self,
        contributor: &dyn ElementContributor,
        actor: &ActorId,
        element: ElementIndex,
    ) -> ElemResult<()> {
        let system = contributor.system_id().clone();
        let priority = contributor.priority();
        self.catalog.describe(element)?;
        if priority < 0 {
            return Err(ElementError::NegativePriority { priority });
        }
        let pairs = contributor.contribute(actor, element, &self.catalog);
        for (_, value) in &pairs {
            if !value.is_finite() {
                return Err(ElementError::NonFiniteValue { value: *value });
            }
        }

        for stat in StatKind::iter() {
            self.collector.withdraw(&system, actor, element, stat);
        }
        for (stat, value) in pairs {
            self.collector.record(
                actor,
                Contribution::new(system.clone(), element, stat, value, priority),
            )?;
        }
        self.cache.invalidate(&(actor.clone(), element));
        Ok(())
    }

    /// Register a change listener. Listeners live as long as the engine.
    pub fn subscribe(&self, listener: ChangeListener) {
        let mut listeners = match self.listeners.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners.push(Arc::new(listener));
    }

    fn notify(&self, event: StatsChanged) {
        // Snapshot the handles and release the lock before dispatching, so
        // a listener can subscribe or read stats without deadlocking.
        let snapshot: Vec<Arc<ChangeListener>> = {
            let listeners = match self.listeners.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            listeners.iter().map(Arc::clone).collect()
        };
        for listener in snapshot {
            listener(&event);
        }
    }

    /// Train an element, committing decayed mastery plus `amount`.
    pub fn train(
        &self,
        actor: &ActorId,
        element: ElementIndex,
        amount: f64,
        now: DateTime<Utc>,
    ) -> f64 {
        self.decay
            .train(&self.tables().relations, actor, element, amount, now)
    }

    /// Restart an element's idle clock without mastery gain.
    pub fn note_element_use(&self, actor: &ActorId, element: ElementIndex, now: DateTime<Utc>) {
        self.decay
            .note_use(&self.tables().relations, actor, element, now);
    }

    /// Current decayed mastery.
    pub fn mastery(&self, actor: &ActorId, element: ElementIndex, now: DateTime<Utc>) -> f64 {
        self.decay
            .mastery(&self.tables().relations, actor, element, now)
    }

    /// Decay lifecycle status.
    pub fn decay_status(
        &self,
        actor: &ActorId,
        element: ElementIndex,
        now: DateTime<Utc>,
    ) -> DecayStatus {
        self.decay
            .status(&self.tables().relations, actor, element, now)
    }

    /// Publish decayed mastery for every tracked pair and invalidate the
    /// affected cached bundles.
    pub fn decay_tick(&self, now: DateTime<Utc>) -> usize {
        let affected = self
            .decay
            .tick(&self.tables().relations, &self.collector, now);
        let count = affected.len();
        for key in affected {
            self.cache.invalidate(&key);
        }
        count
    }

    /// Drop every trace of an actor: contributions, cached bundles and
    /// decay state.
    pub fn forget_actor(&self, actor: &ActorId) {
        self.collector.remove_actor(actor);
        self.cache.remove_actor(actor);
        self.decay.remove_actor(actor);
        debug!(actor = %actor, "actor state dropped");
    }

    /// Result cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
