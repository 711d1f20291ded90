//! Contribution collector.
//!
//! Holds, per (actor, element, stat), the list of contributions recorded by
//! independent external systems. Storage is sharded by actor through a
//! `DashMap`, so the dominant workload of many independent actors mutated
//! concurrently takes no global lock. Within one actor, mutations are
//! serialized by the shard entry and bump a per-actor version counter; the
//! result cache uses that counter as its invalidation token, so a bundle
//! computed from a stale snapshot can never be served (see
//! [`ResultCache`](crate::ResultCache)).

use crate::catalog::ElementIndex;
use crate::contribution::Contribution;
use crate::error::{ElemResult, ElementError};
use crate::ids::{ActorId, SystemId};
use crate::stat::StatKind;
use dashmap::DashMap;
use std::collections::HashMap;

/// Per-actor contribution store.
#[derive(Debug)]
struct ActorContributions {
    /// Bumped by every successful mutation; cache invalidation token.
    version: u64,
    /// Next insertion sequence number.
    next_seq: u64,
    /// Dense per-element slots; index is `ElementIndex`.
    slots: Vec<HashMap<StatKind, Vec<Contribution>>>,
}

impl ActorContributions {
    fn new(element_count: usize) -> Self {
        Self {
            version: 0,
            next_seq: 1,
            slots: (0..element_count).map(|_| HashMap::new()).collect(),
        }
    }
}

/// Thread-safe store of contributions, sharded by actor.
///
/// # Examples
///
/// ```rust
/// use elemstat::{
///     ActorId, Contribution, ContributionCollector, ElementCatalog, ElementCategory,
///     ElementDefinition, StatKind,
/// };
///
/// let catalog = ElementCatalog::from_definitions(4, vec![ElementDefinition {
///     id: "fire".into(),
///     name: "Fire".into(),
///     category: ElementCategory::Elemental,
///     base: Default::default(),
/// }]).unwrap();
/// let fire = catalog.lookup("fire").unwrap();
///
/// let collector = ContributionCollector::new(catalog.len());
/// let actor = ActorId::new("hero");
/// collector
///     .record(&actor, Contribution::new("item".into(), fire, StatKind::Power, 20.0, 2))
///     .unwrap();
///
/// let listed = collector.list_for(&actor, fire, StatKind::Power);
/// assert_eq!(listed.len(), 1);
/// assert_eq!(listed[0].value, 20.0);
/// ```
#[derive(Debug)]
pub struct ContributionCollector {
    actors: DashMap<ActorId, ActorContributions>,
    element_count: usize,
}

impl ContributionCollector {
    /// Create a collector for a catalog of `element_count` elements.
    pub fn new(element_count: usize) -> Self {
        Self {
            actors: DashMap::new(),
            element_count,
        }
    }

    /// Record a contribution.
    ///
    /// Rejects out-of-range element indices, negative priorities and
    /// non-finite values before touching stored state.
    pub fn record(&self, actor: &ActorId, mut contribution: Contribution) -> ElemResult<()> {
        if contribution.element.get() >= self.element_count {
            return Err(ElementError::ElementIndexOutOfRange {
                index: contribution.element.get(),
                count: self.element_count,
            });
        }
        if contribution.priority < 0 {
            return Err(ElementError::NegativePriority {
                priority: contribution.priority,
            });
        }
        if !contribution.value.is_finite() {
            return Err(ElementError::NonFiniteValue {
                value: contribution.value,
            });
        }

        let mut entry = self
            .actors
            .entry(actor.clone())
            .or_insert_with(|| ActorContributions::new(self.element_count));
        let state = entry.value_mut();
        state.version += 1;
        contribution.seq = state.next_seq;
        state.next_seq += 1;
        state.slots[contribution.element.get()]
            .entry(contribution.stat)
            .or_default()
            .push(contribution);
        Ok(())
    }

    /// Remove exactly the contributions previously recorded by `system`
    /// for this (actor, element, stat) triple.
    ///
    /// Idempotent; returns the number of contributions removed.
    pub fn withdraw(
        &self,
        system: &SystemId,
        actor: &ActorId,
        element: ElementIndex,
        stat: StatKind,
    ) -> usize {
        let Some(mut entry) = self.actors.get_mut(actor) else {
            return 0;
        };
        let state = entry.value_mut();
        let Some(slot) = state.slots.get_mut(element.get()) else {
            return 0;
        };
        let Some(list) = slot.get_mut(&stat) else {
            return 0;
        };

        let before = list.len();
        list.retain(|c| &c.system != system);
        let removed = before - list.len();
        if list.is_empty() {
            // An empty list must not linger: the aggregator treats a stat
            // entry with no contributions and no base as a fault.
            slot.remove(&stat);
        }
        if removed > 0 {
            state.version += 1;
        }
        removed
    }

    /// Contributions for a triple, in priority order (descending), with
    /// insertion order preserved among equal priorities.
    pub fn list_for(
        &self,
        actor: &ActorId,
        element: ElementIndex,
        stat: StatKind,
    ) -> Vec<Contribution> {
        let Some(entry) = self.actors.get(actor) else {
            return Vec::new();
        };
        let mut list = entry
            .slots
            .get(element.get())
            .and_then(|slot| slot.get(&stat))
            .cloned()
            .unwrap_or_default();
        // Stable sort keeps insertion order within equal priorities.
        list.sort_by(|a, b| b.priority.cmp(&a.priority));
        list
    }

    /// Consistent snapshot of everything recorded for one (actor, element),
    /// together with the actor version it was taken at.
    ///
    /// The version travels with the computed bundle into the result cache:
    /// any mutation that lands after the snapshot bumps the version and
    /// makes the cached bundle unservable.
    pub fn snapshot(
        &self,
        actor: &ActorId,
        element: ElementIndex,
    ) -> (u64, HashMap<StatKind, Vec<Contribution>>) {
        let Some(entry) = self.actors.get(actor) else {
            return (0, HashMap::new());
        };
        let contributions = entry
            .slots
            .get(element.get())
            .cloned()
            .unwrap_or_default();
        (entry.version, contributions)
    }

    /// Current version counter for an actor (0 if no mutations yet).
    pub fn version(&self, actor: &ActorId) -> u64 {
        self.actors.get(actor).map(|e| e.version).unwrap_or(0)
    }

    /// Drop all state for an actor (despawn/disconnect cleanup).
    pub fn remove_actor(&self, actor: &ActorId) {
        self.actors.remove(actor);
    }
}
