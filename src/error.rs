//! Error types for the element engine.
//!
//! Validation and capacity errors are returned to the immediate caller and
//! never enter stored state. Consistency faults indicate a configuration or
//! implementation bug and are logged with full context before being
//! surfaced. No failure path panics.

use crate::ids::ActorId;
use crate::stat::StatKind;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type ElemResult<T> = Result<T, ElementError>;

/// Errors produced by the element engine.
///
/// # Examples
///
/// ```rust
/// use elemstat::ElementError;
///
/// let err = ElementError::UnknownElement { id: "plasma".into() };
/// assert!(err.to_string().contains("plasma"));
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ElementError {
    /// An element with this identifier is already registered.
    #[error("duplicate element id: {id}")]
    DuplicateElement { id: String },

    /// The catalog reached its configured maximum element count.
    ///
    /// Hard failure; not recoverable without reconfiguration.
    #[error("element catalog is full (capacity {capacity})")]
    CatalogFull { capacity: usize },

    /// No element with this string identifier exists in the catalog.
    #[error("unknown element: {id}")]
    UnknownElement { id: String },

    /// A dense element index outside the registered range was used.
    #[error("element index {index} out of range ({count} elements registered)")]
    ElementIndexOutOfRange { index: usize, count: usize },

    /// A stat name that does not map to any [`StatKind`].
    #[error("unknown stat: {name}")]
    UnknownStat { name: String },

    /// Contribution priorities must be non-negative.
    #[error("contribution priority must be non-negative, got {priority}")]
    NegativePriority { priority: i64 },

    /// NaN and infinite contribution values are rejected at record time
    /// and never propagate into stored state.
    #[error("contribution value must be finite, got {value}")]
    NonFiniteValue { value: f64 },

    /// Interaction factors are multiplicative scales and must be finite
    /// and non-negative (0.0 means total immunity).
    #[error("interaction factor must be finite and non-negative, got {value}")]
    NegativeFactor { value: f64 },

    /// Internal consistency fault: a stat reached aggregation with no
    /// contributions and no base value. Should never occur if invariants
    /// hold; logged with full context when it does.
    #[error("aggregation fault for actor {actor}, element {element}, stat {stat}")]
    AggregationFault {
        actor: ActorId,
        element: usize,
        stat: StatKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ElementError::CatalogFull { capacity: 50 };
        assert!(err.to_string().contains("50"));

        let err = ElementError::UnknownStat {
            name: "luck".to_string(),
        };
        assert!(err.to_string().contains("luck"));
    }

    #[test]
    fn test_fault_display_has_full_context() {
        let err = ElementError::AggregationFault {
            actor: ActorId::new("hero"),
            element: 3,
            stat: StatKind::Power,
        };
        let display = err.to_string();
        assert!(display.contains("hero"));
        assert!(display.contains('3'));
        assert!(display.contains("power"));
    }
}
