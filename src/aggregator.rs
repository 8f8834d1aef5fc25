//! Stat aggregator module.
//!
//! Folds a flat list of tagged deltas into [`FinalStats`]. Scalar stats
//! are arithmetic sums, per-skill maps are summed per key, and the
//! elemental quartet is derived afterwards. The provenance map is
//! rebuilt from scratch on every call, so `sources_for(key)` always sums
//! to `value(key)` for scalar keys.

use crate::build_config::AttackType;
use crate::catalog::SkillDefinition;
use crate::delta::{DeltaKind, StatDelta};
use crate::stat_key::{Element, StatKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// A per-skill bonus map: level-keyed entries plus the exact-skill
/// namespace, kept disjoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillBonusMap {
    pub by_level: BTreeMap<u16, f64>,
    pub exact: BTreeMap<String, f64>,
    /// Scalar entries, applied to every skill.
    pub all: f64,
}

impl SkillBonusMap {
    /// Bonus that applies to `skill`: the entry at its start level plus
    /// the entry under its normalized name plus any global entry.
    pub fn for_skill(&self, skill: &SkillDefinition) -> f64 {
        self.level(skill.start_level) + self.exact(&skill.name_key) + self.all
    }

    pub fn level(&self, level: u16) -> f64 {
        self.by_level.get(&level).copied().unwrap_or(0.0)
    }

    pub fn exact(&self, name: &str) -> f64 {
        self.exact.get(name).copied().unwrap_or(0.0)
    }

    fn add(&mut self, kind: &DeltaKind, amount: f64) {
        match kind {
            DeltaKind::LevelMap(level) => *self.by_level.entry(*level).or_insert(0.0) += amount,
            DeltaKind::ExactSkill(name) => *self.exact.entry(name.clone()).or_insert(0.0) += amount,
            DeltaKind::Flat | DeltaKind::Percent => self.all += amount,
        }
    }
}

/// The elemental quartet after the highest-element bonus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementalProfile {
    /// Own element value plus all-elements, indexed by `Element::index`.
    pub base: [f64; 4],
    pub highest_bonus: f64,
    /// The element that received the bonus.
    pub boosted: Option<Element>,
    /// Values after the bonus.
    pub display: [f64; 4],
}

impl ElementalProfile {
    fn derive(values: &BTreeMap<StatKey, f64>) -> Self {
        let get = |key| values.get(&key).copied().unwrap_or(0.0);
        let all = get(StatKey::AllElements);
        let base = Element::ALL.map(|e| get(StatKey::Element(e)) + all);
        let highest_bonus = get(StatKey::HighestElement);

        let mut display = base;
        let mut boosted = None;
        if highest_bonus != 0.0 {
            // Strict comparison keeps the first element on ties.
            let mut best = Element::Fire;
            for element in Element::ALL {
                if base[element.index()] > base[best.index()] {
                    best = element;
                }
            }
            display[best.index()] += highest_bonus;
            boosted = Some(best);
        }
        Self {
            base,
            highest_bonus,
            boosted,
            display,
        }
    }

    /// Elemental strength of `element` after the bonus.
    pub fn value(&self, element: Element) -> f64 {
        self.display[element.index()]
    }

    /// The strongest element, first in declaration order on ties.
    pub fn strongest(&self) -> Element {
        let mut best = Element::Fire;
        for element in Element::ALL {
            if self.display[element.index()] > self.display[best.index()] {
                best = element;
            }
        }
        best
    }
}

/// The aggregated character statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalStats {
    /// Scalar stat sums.
    #[serde(with = "key_pairs")]
    pub values: BTreeMap<StatKey, f64>,
    pub skill_levels: SkillBonusMap,
    pub skill_damage: SkillBonusMap,
    pub skill_cooldown: SkillBonusMap,
    pub elements: ElementalProfile,
    /// Every contributing delta, per key.
    #[serde(with = "key_pairs")]
    pub sources: BTreeMap<StatKey, Vec<StatDelta>>,
}

/// Stat-keyed maps serialize as `[key, value]` pairs, since keys such as
/// `{"element": "fire"}` are not valid JSON object keys.
mod key_pairs {
    use crate::stat_key::StatKey;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, V>(map: &BTreeMap<StatKey, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<StatKey, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        let pairs = Vec::<(StatKey, V)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

impl FinalStats {
    pub fn value(&self, key: StatKey) -> f64 {
        self.values.get(&key).copied().unwrap_or(0.0)
    }

    /// Base critical rate.
    pub fn crit_rate(&self) -> f64 {
        self.value(StatKey::CritRate)
    }

    /// Critical rate including bonus critical rate.
    pub fn real_crit_rate(&self) -> f64 {
        self.value(StatKey::CritRate) + self.value(StatKey::CritRateBonus)
    }

    pub fn has_super_armor(&self) -> bool {
        self.value(StatKey::SuperArmor) > 0.0
    }

    /// The deltas that contributed to `key`.
    pub fn sources_for(&self, key: StatKey) -> &[StatDelta] {
        self.sources.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Attack power for an attack type.
    pub fn main_attack(&self, attack_type: AttackType) -> f64 {
        match attack_type {
            AttackType::Physical => self.value(StatKey::PhysicalAttack),
            AttackType::Magical => self.value(StatKey::MagicalAttack),
            AttackType::Independent => self.value(StatKey::IndependentAttack),
        }
    }

    /// Main stat for an attack type. Independent attack scales from
    /// whichever of strength and intelligence is higher.
    pub fn main_stat(&self, attack_type: AttackType) -> f64 {
        let strength = self.value(StatKey::Strength);
        let intelligence = self.value(StatKey::Intelligence);
        match attack_type {
            AttackType::Physical => strength,
            AttackType::Magical => intelligence,
            AttackType::Independent => strength.max(intelligence),
        }
    }
}

/// Aggregate deltas into final statistics.
///
/// # Examples
///
/// ```rust
/// use buildcalc::aggregator::aggregate;
/// use buildcalc::{StatDelta, StatKey};
///
/// let stats = aggregate(&[
///     StatDelta::scalar(StatKey::Strength, 100.0).tagged("Weapon"),
///     StatDelta::scalar(StatKey::Strength, 50.0).tagged("Ring"),
/// ]);
/// assert_eq!(stats.value(StatKey::Strength), 150.0);
/// assert_eq!(stats.sources_for(StatKey::Strength).len(), 2);
/// ```
pub fn aggregate(deltas: &[StatDelta]) -> FinalStats {
    let mut stats = FinalStats::default();
    for delta in deltas {
        let map = match delta.key {
            StatKey::SkillLevel => Some(&mut stats.skill_levels),
            StatKey::SkillDamage => Some(&mut stats.skill_damage),
            StatKey::SkillCooldown => Some(&mut stats.skill_cooldown),
            _ => None,
        };
        match map {
            Some(map) => map.add(&delta.kind, delta.amount),
            None => *stats.values.entry(delta.key).or_insert(0.0) += delta.amount,
        }
        stats
            .sources
            .entry(delta.key)
            .or_default()
            .push(delta.clone());
    }
    stats.elements = ElementalProfile::derive(&stats.values);
    trace!(
        deltas = deltas.len(),
        keys = stats.values.len(),
        "stats aggregated"
    );
    stats
}
