//! Stat contributions.
//!
//! A `StatDelta` is one typed contribution to one stat, tagged with the
//! configuration choice that produced it. Catalog payloads store untagged
//! deltas; the resolver clones them with a provenance tag per run.

use crate::stat_key::StatKey;
use serde::{Deserialize, Serialize};

/// How a delta combines into its stat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    /// Raw additive value.
    Flat,
    /// Additive percentage.
    Percent,
    /// Entry of a per-skill-level map ("level 30 skills get +2").
    LevelMap(u16),
    /// Entry of the exact-skill namespace, keyed by normalized skill name.
    ExactSkill(String),
}

/// A single tagged stat contribution.
///
/// # Examples
///
/// ```rust
/// use buildcalc::{DeltaKind, StatDelta, StatKey};
///
/// let delta = StatDelta::scalar(StatKey::FinalDamage, 12.0).tagged("Weapon: Dusk Blade");
/// assert_eq!(delta.kind, DeltaKind::Percent);
/// assert_eq!(delta.source, "Weapon: Dusk Blade");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    pub key: StatKey,
    pub amount: f64,
    pub kind: DeltaKind,
    /// Provenance tag, e.g. `"Enchant (Ring): Crit +3%"`.
    pub source: String,
}

impl StatDelta {
    /// A scalar delta whose kind follows from the key.
    pub fn scalar(key: StatKey, amount: f64) -> Self {
        let kind = if key.is_percent() {
            DeltaKind::Percent
        } else {
            DeltaKind::Flat
        };
        Self {
            key,
            amount,
            kind,
            source: String::new(),
        }
    }

    /// A per-level map entry.
    pub fn level_map(key: StatKey, level: u16, amount: f64) -> Self {
        Self {
            key,
            amount,
            kind: DeltaKind::LevelMap(level),
            source: String::new(),
        }
    }

    /// An exact-skill map entry.
    pub fn exact(key: StatKey, skill: impl Into<String>, amount: f64) -> Self {
        Self {
            key,
            amount,
            kind: DeltaKind::ExactSkill(skill.into()),
            source: String::new(),
        }
    }

    /// Clone this delta with a provenance tag.
    pub fn tagged(&self, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..self.clone()
        }
    }

    /// Clone this delta with its amount multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            amount: self.amount * factor,
            ..self.clone()
        }
    }

    /// Whether this delta is a flat or percent scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, DeltaKind::Flat | DeltaKind::Percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_kind_follows_key() {
        assert_eq!(StatDelta::scalar(StatKey::Strength, 5.0).kind, DeltaKind::Flat);
        assert_eq!(StatDelta::scalar(StatKey::SkillAttack, 5.0).kind, DeltaKind::Percent);
    }

    #[test]
    fn test_tagged_and_scaled_leave_original_untouched() {
        let base = StatDelta::level_map(StatKey::SkillLevel, 30, 1.0);
        let tagged = base.tagged("Emblem").scaled(2.0);
        assert_eq!(base.amount, 1.0);
        assert!(base.source.is_empty());
        assert_eq!(tagged.amount, 2.0);
        assert_eq!(tagged.kind, DeltaKind::LevelMap(30));
        assert!(!tagged.is_scalar());
    }
}
