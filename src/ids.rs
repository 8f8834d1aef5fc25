//! Identifier types for catalog records.
//!
//! Catalog identifiers are interned strings backed by `Arc<str>`, so
//! cloning an id while building deltas and analysis rows is cheap and
//! comparison stays fast.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create an id from a string slice.
            pub fn new(s: &str) -> Self {
                Self(Arc::from(s))
            }

            /// Get the string representation of this id.
            pub fn as_str(&self) -> &str {
                &self.0
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
                Ok($name::from(s))
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
    };
}

interned_id!(
    /// Identifier of a catalog record (item, enchant, seal, emblem, rune, ...).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use buildcalc::CatalogId;
    ///
    /// let sword = CatalogId::new("sword_01");
    /// let same: CatalogId = "sword_01".into();
    /// assert_eq!(sword, same);
    /// assert_eq!(sword.as_str(), "sword_01");
    /// ```
    CatalogId
);

interned_id!(
    /// Identifier of a skill definition.
    SkillId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality() {
        let a = SkillId::new("upper_slash");
        let b: SkillId = String::from("upper_slash").into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "upper_slash");
    }

    #[test]
    fn test_id_serde_as_plain_string() {
        let id = CatalogId::new("ring_7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ring_7\"");
        let back: CatalogId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_ordering() {
        assert!(SkillId::new("a") < SkillId::new("b"));
    }
}
