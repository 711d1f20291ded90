//! Contribution records.
//!
//! A [`Contribution`] is a single fact asserted by one external system
//! about one (actor, element, stat) triple. Contributions are owned by the
//! [`ContributionCollector`](crate::ContributionCollector) but remain
//! attributed to their source system so the source can later withdraw
//! exactly what it recorded.

use crate::catalog::ElementIndex;
use crate::ids::SystemId;
use crate::stat::StatKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stat contribution from one external system.
///
/// Validation (finite value, non-negative priority, in-range element index)
/// happens when the contribution is recorded, not here.
///
/// # Examples
///
/// ```rust
/// use elemstat::{Contribution, StatKind};
///
/// # let fire = elemstat::ElementCatalog::from_definitions(4, vec![
/// #     elemstat::ElementDefinition {
/// #         id: "fire".into(),
/// #         name: "Fire".into(),
/// #         category: elemstat::ElementCategory::Elemental,
/// #         base: Default::default(),
/// #     },
/// # ]).unwrap().lookup("fire").unwrap();
/// let c = Contribution::new("item".into(), fire, StatKind::Power, 20.0, 2);
/// assert_eq!(c.value, 20.0);
/// assert_eq!(c.priority, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// System that asserted this contribution.
    pub system: SystemId,
    /// Target element.
    pub element: ElementIndex,
    /// Target stat.
    pub stat: StatKind,
    /// Contributed value.
    pub value: f64,
    /// Priority weight; higher wins ties and governs ordering for
    /// non-commutative strategies.
    pub priority: i64,
    /// When this contribution was created.
    pub recorded_at: DateTime<Utc>,
    /// Per-actor insertion sequence, assigned by the collector. Gives
    /// stable ordering for equal priorities and defines "most recent".
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl Contribution {
    /// Create a contribution timestamped now.
    pub fn new(
        system: SystemId,
        element: ElementIndex,
        stat: StatKind,
        value: f64,
        priority: i64,
    ) -> Self {
        Self::with_timestamp(system, element, stat, value, priority, Utc::now())
    }

    /// Create a contribution with an explicit timestamp.
    pub fn with_timestamp(
        system: SystemId,
        element: ElementIndex,
        stat: StatKind,
        value: f64,
        priority: i64,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            system,
            element,
            stat,
            value,
            priority,
            recorded_at,
            seq: 0,
        }
    }
}
