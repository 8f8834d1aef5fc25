//! Stat key module.
//!
//! Provides the closed `StatKey` enumeration of every character attribute
//! the engine knows about, along with the `Element` and `StatusAilment`
//! sub-enumerations and the column-name table used by the catalog loader.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four elemental strengths, in declaration order.
///
/// Declaration order matters: when two elements tie for the highest
/// value, the first one listed here receives the highest-element bonus.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Water,
    Light,
    Shadow,
}

impl Element {
    /// All elements in declaration order.
    pub const ALL: [Element; 4] = [Element::Fire, Element::Water, Element::Light, Element::Shadow];

    /// Parse an element from a column or catalog token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "fire" => Some(Element::Fire),
            "water" | "ice" => Some(Element::Water),
            "light" => Some(Element::Light),
            "shadow" | "dark" => Some(Element::Shadow),
            _ => None,
        }
    }

    /// Position of this element in `Element::ALL`.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Status ailments that carry their own damage and chance sub-record.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAilment {
    Bleed,
    Poison,
    Burn,
    Shock,
}

impl StatusAilment {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "bleed" | "bleeding" => Some(StatusAilment::Bleed),
            "poison" => Some(StatusAilment::Poison),
            "burn" => Some(StatusAilment::Burn),
            "shock" => Some(StatusAilment::Shock),
            _ => None,
        }
    }
}

/// Closed enumeration of character stats.
///
/// Every contribution the resolver emits targets exactly one `StatKey`.
/// Whether a key is a flat value, a percentage, or a per-level map is a
/// property of the key itself (see [`StatKey::is_percent`] and
/// [`StatKey::is_skill_map`]).
///
/// # Examples
///
/// ```rust
/// use buildcalc::{Element, StatKey};
///
/// assert_eq!(StatKey::from_column("str"), Some(StatKey::Strength));
/// assert_eq!(StatKey::from_column("fire_element"), Some(StatKey::Element(Element::Fire)));
/// assert!(StatKey::FinalDamage.is_percent());
/// assert!(!StatKey::PhysicalAttack.is_percent());
/// ```
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Strength,
    Intelligence,
    Vitality,
    Spirit,
    PhysicalAttack,
    MagicalAttack,
    IndependentAttack,
    Hp,
    Mp,
    PhysicalDefense,
    MagicalDefense,
    /// Flat strength of a single element.
    Element(Element),
    /// Flat strength added to all four elements.
    AllElements,
    /// Added only to whichever element currently holds the maximum.
    HighestElement,
    ElementResist(Element),
    AllResist,
    /// Crit rate from base sources.
    CritRate,
    /// Additive crit-rate modifiers on top of the base crit rate.
    CritRateBonus,
    DamageIncrease,
    AdditionalDamage,
    CritDamageIncrease,
    FinalDamage,
    SkillAttack,
    AllTypeDamage,
    CounterDamage,
    BackAttackDamage,
    AttackSpeed,
    CastSpeed,
    MoveSpeed,
    /// Non-zero means the character has super armor.
    SuperArmor,
    StatusDamage(StatusAilment),
    StatusChance(StatusAilment),
    /// Skill level bonus, keyed by level or exact skill.
    SkillLevel,
    /// Skill damage bonus (%), keyed by level or exact skill.
    SkillDamage,
    /// Cooldown reduction (%), keyed by level or exact skill.
    SkillCooldown,
}

impl StatKey {
    /// Whether contributions to this key are percentages.
    pub fn is_percent(self) -> bool {
        matches!(
            self,
            StatKey::CritRate
                | StatKey::CritRateBonus
                | StatKey::DamageIncrease
                | StatKey::AdditionalDamage
                | StatKey::CritDamageIncrease
                | StatKey::FinalDamage
                | StatKey::SkillAttack
                | StatKey::AllTypeDamage
                | StatKey::CounterDamage
                | StatKey::BackAttackDamage
                | StatKey::AttackSpeed
                | StatKey::CastSpeed
                | StatKey::MoveSpeed
                | StatKey::StatusDamage(_)
                | StatKey::StatusChance(_)
                | StatKey::SkillDamage
                | StatKey::SkillCooldown
        )
    }

    /// Whether this key is a per-level / per-skill map rather than a scalar.
    pub fn is_skill_map(self) -> bool {
        matches!(
            self,
            StatKey::SkillLevel | StatKey::SkillDamage | StatKey::SkillCooldown
        )
    }

    /// Map a `stats_` column suffix (already snake_case) to a scalar key.
    ///
    /// Returns `None` for unknown names; the loader drops those columns.
    pub fn from_column(name: &str) -> Option<Self> {
        let key = match name {
            "str" | "strength" => StatKey::Strength,
            "int" | "intelligence" => StatKey::Intelligence,
            "vit" | "vitality" => StatKey::Vitality,
            "spr" | "spirit" => StatKey::Spirit,
            "physical_attack" | "phys_atk" => StatKey::PhysicalAttack,
            "magical_attack" | "mag_atk" => StatKey::MagicalAttack,
            "independent_attack" | "indep_atk" => StatKey::IndependentAttack,
            "hp" => StatKey::Hp,
            "mp" => StatKey::Mp,
            "physical_defense" => StatKey::PhysicalDefense,
            "magical_defense" => StatKey::MagicalDefense,
            "all_element" | "all_elements" => StatKey::AllElements,
            "highest_element" => StatKey::HighestElement,
            "all_resist" => StatKey::AllResist,
            "crit_rate" => StatKey::CritRate,
            "crit_rate_bonus" => StatKey::CritRateBonus,
            "damage_increase" | "dmg_inc" => StatKey::DamageIncrease,
            "additional_damage" | "add_dmg" => StatKey::AdditionalDamage,
            "crit_damage_increase" | "crit_dmg_inc" => StatKey::CritDamageIncrease,
            "final_damage" => StatKey::FinalDamage,
            "skill_attack" | "skill_atk" => StatKey::SkillAttack,
            "all_type_damage" => StatKey::AllTypeDamage,
            "counter_damage" => StatKey::CounterDamage,
            "back_attack_damage" => StatKey::BackAttackDamage,
            "attack_speed" => StatKey::AttackSpeed,
            "cast_speed" => StatKey::CastSpeed,
            "move_speed" => StatKey::MoveSpeed,
            "super_armor" => StatKey::SuperArmor,
            other => {
                if let Some(element) = other.strip_suffix("_element").and_then(Element::parse) {
                    StatKey::Element(element)
                } else if let Some(element) = other.strip_suffix("_resist").and_then(Element::parse) {
                    StatKey::ElementResist(element)
                } else {
                    return None;
                }
            }
        };
        Some(key)
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKey::Element(e) => write!(f, "{:?} element", e),
            StatKey::ElementResist(e) => write!(f, "{:?} resist", e),
            StatKey::StatusDamage(a) => write!(f, "{:?} damage", a),
            StatKey::StatusChance(a) => write!(f, "{:?} chance", a),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_aliases() {
        assert_eq!(StatKey::from_column("strength"), Some(StatKey::Strength));
        assert_eq!(StatKey::from_column("dmg_inc"), Some(StatKey::DamageIncrease));
        assert_eq!(
            StatKey::from_column("dark_resist"),
            Some(StatKey::ElementResist(Element::Shadow))
        );
        assert_eq!(StatKey::from_column("nonsense"), None);
    }

    #[test]
    fn test_element_declaration_order() {
        assert!(Element::Fire < Element::Water);
        assert!(Element::Light < Element::Shadow);
        assert_eq!(Element::Light.index(), 2);
    }

    #[test]
    fn test_map_keys_are_not_scalars() {
        assert!(StatKey::SkillLevel.is_skill_map());
        assert!(!StatKey::SkillLevel.is_percent());
        assert!(StatKey::SkillCooldown.is_percent());
    }
}
