//! Element catalog.
//!
//! The catalog is the definitional registry: it maps each element's string
//! identifier to a dense integer index and holds its descriptive metadata
//! and base properties. It is built once at startup from configuration and
//! immutable afterwards, so it can be shared as `Arc<ElementCatalog>`
//! without locking. String lookups are the cold path; every hot-path table
//! in the engine is a dense `Vec` indexed by [`ElementIndex`].

use crate::error::{ElemResult, ElementError};
use crate::ids::ElementId;
use crate::stat::StatKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

/// Default maximum element count when configuration does not set one.
pub const DEFAULT_MAX_ELEMENTS: usize = 50;

/// Dense index of a registered element, `0..catalog.len()`.
///
/// Obtained from [`ElementCatalog::lookup`] or
/// [`ElementCatalog::register`]; callers cache it and use it for all
/// subsequent access.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ElementIndex(usize);

impl ElementIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw index value.
    pub fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ElementIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broad classification of an element.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ElementCategory {
    /// Physical elements (metal, wood, earth, ...).
    Physical,
    /// Classic elemental types (fire, water, lightning, ...).
    Elemental,
    /// Spiritual elements (soul, mind, dream, ...).
    Spiritual,
    /// Dimensional elements (void, time, space, ...).
    Dimensional,
    /// Combinations of two or more base elements.
    Hybrid,
    /// Unique elements outside the normal classification.
    Special,
}

/// Base numeric properties configured per element.
///
/// A configured property participates in aggregation as an implicit
/// lowest-priority contribution from the synthetic `"catalog"` system, so
/// an actor with no external contributions reads exactly these values. An
/// unset property contributes nothing at all, which keeps it from
/// polluting strategies with a non-zero identity (a `Multiply` over real
/// contributions must not be zeroed by an absent base).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseProperties {
    /// Base offensive power.
    #[serde(default)]
    pub power: Option<f64>,
    /// Base defensive strength.
    #[serde(default)]
    pub defense: Option<f64>,
    /// Base critical hit rate.
    #[serde(default)]
    pub crit_rate: Option<f64>,
    /// Base hit accuracy.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl BaseProperties {
    /// The configured base value for a stat, if one was set.
    pub fn value_for(&self, stat: StatKind) -> Option<f64> {
        match stat {
            StatKind::Power => self.power,
            StatKind::Defense => self.defense,
            StatKind::CritRate => self.crit_rate,
            StatKind::Accuracy => self.accuracy,
            _ => None,
        }
    }
}

/// Definition of one element type, as provided by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDefinition {
    /// Stable string identifier (e.g. `"fire"`).
    pub id: ElementId,
    /// Display name.
    pub name: String,
    /// Classification category.
    pub category: ElementCategory,
    /// Base numeric properties.
    #[serde(default)]
    pub base: BaseProperties,
}

/// Immutable registry of element definitions.
///
/// # Examples
///
/// ```rust
/// use elemstat::{BaseProperties, ElementCatalog, ElementCategory, ElementDefinition};
///
/// let mut catalog = ElementCatalog::with_capacity(8);
/// let fire = catalog
///     .register(ElementDefinition {
///         id: "fire".into(),
///         name: "Fire".into(),
///         category: ElementCategory::Elemental,
///         base: BaseProperties { power: Some(100.0), ..Default::default() },
///     })
///     .unwrap();
///
/// assert_eq!(catalog.lookup("fire"), Some(fire));
/// assert_eq!(catalog.describe(fire).unwrap().name, "Fire");
/// ```
#[derive(Debug, Clone)]
pub struct ElementCatalog {
    definitions: Vec<ElementDefinition>,
    by_id: HashMap<ElementId, ElementIndex>,
    capacity: usize,
}

impl ElementCatalog {
    /// Create an empty catalog bounded at `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            definitions: Vec::new(),
            by_id: HashMap::new(),
            capacity,
        }
    }

    /// Build a catalog from a list of definitions.
    pub fn from_definitions(
        capacity: usize,
        definitions: Vec<ElementDefinition>,
    ) -> ElemResult<Self> {
        let mut catalog = Self::with_capacity(capacity);
        for definition in definitions {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }

    /// Register an element, assigning it the next dense index.
    ///
    /// Fails with [`ElementError::DuplicateElement`] if the identifier is
    /// taken and [`ElementError::CatalogFull`] once the configured maximum
    /// is reached.
    pub fn register(&mut self, definition: ElementDefinition) -> ElemResult<ElementIndex> {
        if self.by_id.contains_key(&definition.id) {
            return Err(ElementError::DuplicateElement {
                id: definition.id.to_string(),
            });
        }
        if self.definitions.len() >= self.capacity {
            return Err(ElementError::CatalogFull {
                capacity: self.capacity,
            });
        }

        let index = ElementIndex::new(self.definitions.len());
        self.by_id.insert(definition.id.clone(), index);
        self.definitions.push(definition);
        Ok(index)
    }

    /// Resolve a string identifier to its dense index. Cold path.
    pub fn lookup(&self, id: &str) -> Option<ElementIndex> {
        self.by_id.get(&ElementId::new(id)).copied()
    }

    /// Describe a registered element.
    pub fn describe(&self, index: ElementIndex) -> ElemResult<&ElementDefinition> {
        self.definitions
            .get(index.get())
            .ok_or(ElementError::ElementIndexOutOfRange {
                index: index.get(),
                count: self.definitions.len(),
            })
    }

    /// All elements of a category, in index order.
    pub fn by_category(&self, category: ElementCategory) -> Vec<ElementIndex> {
        self.definitions
            .iter()
            .enumerate()
            .filter(|(_, d)| d.category == category)
            .map(|(i, _)| ElementIndex::new(i))
            .collect()
    }

    /// Iterate over all registered elements.
    pub fn iter(&self) -> impl Iterator<Item = (ElementIndex, &ElementDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (ElementIndex::new(i), d))
    }

    /// Number of registered elements.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog has no elements.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Configured maximum element count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
