//! Stat identifiers.
//!
//! Every per-element attribute the engine aggregates is named by a
//! [`StatKind`]. The set is closed at compile time; unknown stat names are
//! rejected at the API boundary with a validation error.

use crate::error::{ElemResult, ElementError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Enumerated stat identifier.
///
/// Serialized and parsed by `snake_case` name (`"power"`, `"crit_rate"`,
/// ...). Aggregation strategies are assigned per `StatKind`.
///
/// # Examples
///
/// ```rust
/// use elemstat::StatKind;
///
/// let kind = StatKind::parse("crit_rate").unwrap();
/// assert_eq!(kind, StatKind::CritRate);
/// assert_eq!(kind.to_string(), "crit_rate");
///
/// assert!(StatKind::parse("luck").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// Offensive power of the element.
    Power,
    /// Defensive strength against the element.
    Defense,
    /// Critical hit rate.
    CritRate,
    /// Critical hit damage multiplier.
    CritDamage,
    /// Hit accuracy.
    Accuracy,
    /// Probability of applying the element's status effect.
    StatusProbability,
    /// Resistance against the element's status effect.
    StatusResistance,
    /// Duration of the element's status effect.
    StatusDuration,
    /// Intensity of the element's status effect.
    StatusIntensity,
    /// Elemental mastery; grows with use, decays with disuse.
    MasteryLevel,
}

impl StatKind {
    /// Parse a stat name, mapping failures to a validation error.
    pub fn parse(name: &str) -> ElemResult<Self> {
        name.parse::<StatKind>().map_err(|_| ElementError::UnknownStat {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(StatKind::parse("power").unwrap(), StatKind::Power);
        assert_eq!(
            StatKind::parse("status_probability").unwrap(),
            StatKind::StatusProbability
        );
        assert_eq!(
            StatKind::parse("mastery_level").unwrap(),
            StatKind::MasteryLevel
        );
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = StatKind::parse("charisma").unwrap_err();
        assert_eq!(
            err,
            ElementError::UnknownStat {
                name: "charisma".to_string()
            }
        );
    }

    #[test]
    fn test_display_round_trips() {
        for kind in StatKind::iter() {
            assert_eq!(StatKind::parse(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&StatKind::CritDamage).unwrap();
        assert_eq!(json, "\"crit_damage\"");
    }
}
