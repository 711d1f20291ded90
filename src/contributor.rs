//! External contributor systems.
//!
//! Game systems (equipment, cultivation, status effects) push their
//! element stat contributions through [`ElementContributor`]. The engine
//! pulls each registered system on demand and replaces that system's
//! previous contributions wholesale, so a system only has to describe its
//! current state, never deltas.

use crate::catalog::{ElementCatalog, ElementIndex};
use crate::ids::{ActorId, SystemId};
use crate::stat::StatKind;
use chrono::{DateTime, Utc};

/// A game system that derives element stats for actors.
pub trait ElementContributor: Send + Sync {
    /// Stable identifier; used to withdraw this system's contributions.
    fn system_id(&self) -> &SystemId;

    /// Rank among systems. Higher priority wins under order-sensitive
    /// aggregation strategies.
    fn priority(&self) -> i64;

    /// The system's current (stat, value) pairs for one actor and element.
    ///
    /// Returning an empty list clears the system's footprint on that
    /// element.
    fn contribute(
        &self,
        actor: &ActorId,
        element: ElementIndex,
        catalog: &ElementCatalog,
    ) -> Vec<(StatKind, f64)>;
}

/// Registration bookkeeping for a contributor system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemRegistration {
    pub system: SystemId,
    pub priority: i64,
    pub registered_at: DateTime<Utc>,
}

impl SystemRegistration {
    pub fn new(system: SystemId, priority: i64) -> Self {
        Self {
            system,
            priority,
            registered_at: Utc::now(),
        }
    }
}
