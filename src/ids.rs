//! Identifier types.
//!
//! Provides interned string identifiers for actors, contributing systems,
//! and elements. All three use `Arc<str>` for memory efficiency and fast
//! comparison; instances with the same content share the allocation once
//! cloned from one another.
//!
//! Identifiers are cold-path keys: external systems resolve an
//! [`ElementId`](crate::ElementId) to a dense
//! [`ElementIndex`](crate::ElementIndex) once and use the index everywhere
//! after that.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

macro_rules! interned_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create a new identifier from a string slice.
            pub fn new(s: &str) -> Self {
                Self(Arc::from(s))
            }

            /// Get the string representation of this identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.0.as_ref().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s))
            }
        }
    };
}

interned_id! {
    /// Identifier for one game actor (player, NPC, monster).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use elemstat::ActorId;
    ///
    /// let a = ActorId::new("hero-1");
    /// let b: ActorId = "hero-1".into();
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str(), "hero-1");
    /// ```
    ActorId
}

interned_id! {
    /// Identifier for one contributing system (e.g. `"race"`, `"item"`,
    /// `"skill"`, `"cultivation"`).
    ///
    /// A system's contributions are attributed to its `SystemId` so the
    /// system can later withdraw exactly what it recorded.
    SystemId
}

interned_id! {
    /// String identifier for one element type (e.g. `"fire"`).
    ///
    /// Resolved to an [`ElementIndex`](crate::ElementIndex) through the
    /// [`ElementCatalog`](crate::ElementCatalog); hot-path code never keys
    /// by string.
    ElementId
}
