//! Mastery decay.
//!
//! Element mastery earned through training erodes while the element sits
//! unused. The engine keeps one decay state per (actor, element): the
//! committed mastery value and the last moment the element was exercised.
//! Decay is evaluated lazily from those two facts, so no background work
//! is needed between ticks.
//!
//! Idle time splits at a long-absence threshold: days under the threshold
//! decay at the base rate, days beyond it at the base rate scaled by a
//! penalty multiplier. Recent use of an opposing element accelerates the
//! whole loss.

use crate::catalog::ElementIndex;
use crate::collector::ContributionCollector;
use crate::contribution::Contribution;
use crate::ids::{ActorId, SystemId};
use crate::interaction::RelationGraph;
use crate::stat::StatKind;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// System identifier under which decay publishes mastery contributions.
pub const DECAY_SYSTEM: &str = "decay";

/// Priority of decay-published contributions. Lowest regular priority, so
/// buffs and equipment always rank above them.
pub const DECAY_PRIORITY: i64 = 0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Decay tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Fraction of mastery lost per idle day under the threshold.
    pub rate_per_day: f64,
    /// Idle spans shorter than this count as fresh, no decay.
    pub recency_window_days: f64,
    /// Idle days beyond this threshold decay at the penalized rate.
    pub long_absence_threshold_days: f64,
    /// Rate multiplier applied to days past the threshold.
    pub long_absence_multiplier: f64,
    /// How recently an opposing element must have been used to count.
    pub opposed_window_days: f64,
    /// Loss multiplier while opposed use is in effect.
    pub opposed_multiplier: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            rate_per_day: 0.005,
            recency_window_days: 1.0,
            long_absence_threshold_days: 7.0,
            long_absence_multiplier: 1.5,
            opposed_window_days: 3.0,
            opposed_multiplier: 1.25,
        }
    }
}

/// Where an (actor, element) pair currently sits in the decay lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayStatus {
    /// Used within the recency window; mastery holds.
    Fresh,
    /// Idle past the window; mastery erodes.
    Decaying,
    /// Idle, and an opposing element was exercised recently.
    OpposedDecay,
}

#[derive(Debug, Clone, Copy)]
struct DecayState {
    /// Mastery committed at `last_used`.
    mastery: f64,
    last_used: DateTime<Utc>,
}

/// Per-actor mastery bookkeeping and the decay evaluation itself.
#[derive(Debug)]
pub struct DecayEngine {
    config: DecayConfig,
    states: DashMap<(ActorId, ElementIndex), DecayState>,
}

impl DecayEngine {
    pub fn new(config: DecayConfig) -> Self {
        Self {
            config,
            states: DashMap::new(),
        }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    /// Add training gains on top of whatever mastery survives decay at
    /// `now`, and reset the idle clock. Returns the committed value.
    pub fn train(
        &self,
        relations: &RelationGraph,
        actor: &ActorId,
        element: ElementIndex,
        amount: f64,
        now: DateTime<Utc>,
    ) -> f64 {
        let key = (actor.clone(), element);
        // Evaluate on a copy; holding a shard entry across the opposing
        // lookups below could deadlock against a same-shard key.
        let surviving = match self.states.get(&key).map(|entry| *entry.value()) {
            Some(state) => self.decayed(relations, actor, element, state, now),
            None => 0.0,
        };
        let committed = (surviving + amount).max(0.0);
        self.states.insert(
            key,
            DecayState {
                mastery: committed,
                last_used: now,
            },
        );
        committed
    }

    /// Mark the element as exercised without changing mastery. Commits the
    /// decayed value so the idle clock restarts from it.
    pub fn note_use(
        &self,
        relations: &RelationGraph,
        actor: &ActorId,
        element: ElementIndex,
        now: DateTime<Utc>,
    ) {
        let key = (actor.clone(), element);
        let Some(state) = self.states.get(&key).map(|entry| *entry.value()) else {
            return;
        };
        let surviving = self.decayed(relations, actor, element, state, now);
        self.states.insert(
            key,
            DecayState {
                mastery: surviving,
                last_used: now,
            },
        );
    }

    /// Current mastery after decay, without committing anything.
    pub fn mastery(
        &self,
        relations: &RelationGraph,
        actor: &ActorId,
        element: ElementIndex,
        now: DateTime<Utc>,
    ) -> f64 {
        let key = (actor.clone(), element);
        match self.states.get(&key).map(|entry| *entry.value()) {
            Some(state) => self.decayed(relations, actor, element, state, now),
            None => 0.0,
        }
    }

    /// Lifecycle status at `now`. Untracked pairs read as fresh.
    pub fn status(
        &self,
        relations: &RelationGraph,
        actor: &ActorId,
        element: ElementIndex,
        now: DateTime<Utc>,
    ) -> DecayStatus {
        let key = (actor.clone(), element);
        let Some(last_used) = self.states.get(&key).map(|entry| entry.last_used) else {
            return DecayStatus::Fresh;
        };
        if idle_days(last_used, now) < self.config.recency_window_days {
            DecayStatus::Fresh
        } else if self.opposed_recently(relations, actor, element, now) {
            DecayStatus::OpposedDecay
        } else {
            DecayStatus::Decaying
        }
    }

    /// Re-publish every tracked pair's decayed mastery as a contribution.
    ///
    /// Returns the (actor, element) pairs whose contribution was replaced,
    /// so callers can invalidate cached bundles.
    pub fn tick(
        &self,
        relations: &RelationGraph,
        collector: &ContributionCollector,
        now: DateTime<Utc>,
    ) -> Vec<(ActorId, ElementIndex)> {
        let system = SystemId::new(DECAY_SYSTEM);
        let snapshot: Vec<((ActorId, ElementIndex), DecayState)> = self
            .states
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        let mut affected = Vec::with_capacity(snapshot.len());
        for ((actor, element), state) in snapshot {
            let value = self.decayed(relations, &actor, element, state, now);
            collector.withdraw(&system, &actor, element, StatKind::MasteryLevel);
            let contribution = Contribution::with_timestamp(
                system.clone(),
                element,
                StatKind::MasteryLevel,
                value,
                DECAY_PRIORITY,
                now,
            );
            if collector.record(&actor, contribution).is_ok() {
                debug!(actor = %actor, element = %element, mastery = value, "published decayed mastery");
                affected.push((actor, element));
            }
        }
        affected
    }

    /// Drop all decay state for an actor.
    pub fn remove_actor(&self, actor: &ActorId) {
        self.states.retain(|key, _| &key.0 != actor);
    }

    fn decayed(
        &self,
        relations: &RelationGraph,
        actor: &ActorId,
        element: ElementIndex,
        state: DecayState,
        now: DateTime<Utc>,
    ) -> f64 {
        let idle = idle_days(state.last_used, now);
        if idle < self.config.recency_window_days {
            return state.mastery;
        }
        let threshold = self.config.long_absence_threshold_days;
        let plain_days = idle.min(threshold);
        let boosted_days = (idle - threshold).max(0.0);
        let rate = self.config.rate_per_day;
        let mut loss = state.mastery * rate * plain_days
            + state.mastery * rate * self.config.long_absence_multiplier * boosted_days;
        if self.opposed_recently(relations, actor, element, now) {
            loss *= self.config.opposed_multiplier;
        }
        (state.mastery - loss).max(0.0)
    }

    /// Whether any element opposing `element` was used by `actor` within
    /// the opposed window.
    fn opposed_recently(
        &self,
        relations: &RelationGraph,
        actor: &ActorId,
        element: ElementIndex,
        now: DateTime<Utc>,
    ) -> bool {
        relations.opposing(element).into_iter().any(|opponent| {
            self.states
                .get(&(actor.clone(), opponent))
                .map(|entry| idle_days(entry.last_used, now) < self.config.opposed_window_days)
                .unwrap_or(false)
        })
    }
}

fn idle_days(last_used: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = (now - last_used).num_seconds();
    if seconds <= 0 {
        0.0
    } else {
        seconds as f64 / SECONDS_PER_DAY
    }
}
