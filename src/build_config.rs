//! Build configuration.
//!
//! `BuildConfiguration` is the caller-owned input snapshot: character,
//! equipment and everything slotted into it, training, skill investments,
//! the rune page, job triggers and damage options. The engine only reads
//! it; the mutation helpers here exist for the caller's own editing flows.

use crate::catalog::{Catalog, EmblemColor, EquipSlot};
use crate::ids::{CatalogId, SkillId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum technique points on a single skill.
pub const MAX_TECHNIQUE_POINTS: u8 = 5;

/// Number of rune slots on the rune page.
pub const RUNE_SLOTS: usize = 20;

/// Highest emblem level.
pub const MAX_EMBLEM_LEVEL: u8 = 15;

/// Which attack power a job scales from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    #[default]
    Physical,
    Magical,
    Independent,
}

/// Character-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    pub job_group: String,
    pub job_class: String,
    pub level: u16,
    /// Weapon sub-type chosen for the job, e.g. `"greatsword"`.
    pub weapon_type: Option<String>,
    pub attack_type: AttackType,
    /// Lowers every skill's unlock level by a fixed offset.
    pub master_contract: bool,
}

impl Default for CharacterProfile {
    fn default() -> Self {
        Self {
            job_group: String::new(),
            job_class: String::new(),
            level: 1,
            weapon_type: None,
            attack_type: AttackType::Physical,
            master_contract: false,
        }
    }
}

/// An emblem socketed into a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmblemAssignment {
    pub emblem: CatalogId,
    pub level: u8,
    /// Set for platinum emblems, which are keyed by option.
    #[serde(default)]
    pub option: Option<String>,
}

/// Everything configured on one equipment slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotLoadout {
    pub item: Option<CatalogId>,
    pub reinforcement: u8,
    pub polish: u8,
    pub enchant: Option<CatalogId>,
    pub magic_seals: Vec<CatalogId>,
    pub emblems: Vec<Option<EmblemAssignment>>,
}

/// Level and technique points invested in a skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInvestment {
    pub level: u16,
    pub technique_points: u8,
}

/// Skill investments keyed by skill id.
///
/// Skills without an entry sit at their minimum level with no technique
/// points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillInvestments(BTreeMap<SkillId, SkillInvestment>);

impl SkillInvestments {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored investment, if any.
    pub fn get(&self, skill: &SkillId) -> Option<SkillInvestment> {
        self.0.get(skill).copied()
    }

    /// The investment for a skill, defaulting to `min_level` and no TP.
    pub fn get_or(&self, skill: &SkillId, min_level: u16) -> SkillInvestment {
        self.get(skill).unwrap_or(SkillInvestment {
            level: min_level,
            technique_points: 0,
        })
    }

    pub fn set(&mut self, skill: SkillId, investment: SkillInvestment) {
        self.0.insert(skill, investment);
    }

    pub fn remove(&mut self, skill: &SkillId) -> Option<SkillInvestment> {
        self.0.remove(skill)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SkillId, &SkillInvestment)> {
        self.0.iter()
    }
}

/// An engraving selection: engraving name plus tier index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngravingSelection {
    pub name: String,
    /// Position in the engraving's tiers, lowest tier first.
    pub tier: usize,
}

/// Rune slots plus the engraving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunePage {
    pub slots: [Option<CatalogId>; RUNE_SLOTS],
    pub engraving: Option<EngravingSelection>,
}

/// Situational damage toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageOptions {
    pub counter: bool,
    pub back_attack: bool,
    pub consumables: bool,
}

/// The complete build snapshot the engine evaluates.
///
/// # Examples
///
/// ```rust
/// use buildcalc::{BuildConfiguration, CatalogId, EquipSlot};
///
/// let mut config = BuildConfiguration::default();
/// config.equip(EquipSlot::Ring, CatalogId::new("ring_01"));
/// assert_eq!(config.item_in(EquipSlot::Ring), Some(&CatalogId::new("ring_01")));
///
/// let draft = config.clone();
/// assert_eq!(draft, config);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfiguration {
    pub character: CharacterProfile,
    pub equipment: BTreeMap<EquipSlot, SlotLoadout>,
    pub castle_seals: Vec<CatalogId>,
    pub avatars: Vec<CatalogId>,
    /// Training sliders by track name.
    pub training: BTreeMap<String, u8>,
    pub skills: SkillInvestments,
    pub runes: RunePage,
    /// Active job-mechanic triggers.
    pub triggers: Vec<CatalogId>,
    /// Stack counts for stacking passives, by skill.
    pub mechanic_stacks: BTreeMap<SkillId, u32>,
    pub options: DamageOptions,
}

impl BuildConfiguration {
    pub fn loadout(&self, slot: EquipSlot) -> Option<&SlotLoadout> {
        self.equipment.get(&slot)
    }

    pub fn item_in(&self, slot: EquipSlot) -> Option<&CatalogId> {
        self.loadout(slot).and_then(|l| l.item.as_ref())
    }

    /// Put an item into a slot, keeping the slot's other selections.
    pub fn equip(&mut self, slot: EquipSlot, item: CatalogId) {
        self.equipment.entry(slot).or_default().item = Some(item);
    }

    /// Empty a slot and everything that depends on it.
    ///
    /// Reinforcement, polish, enchant, seals and emblems go with the item.
    /// Unequipping the weapon also resets every skill that requires a
    /// weapon sub-type. Returns the skills that were reset.
    pub fn unequip(&mut self, slot: EquipSlot, catalog: &Catalog) -> Vec<SkillId> {
        self.equipment.remove(&slot);
        if slot != EquipSlot::Weapon {
            return Vec::new();
        }
        let mut reset = Vec::new();
        for skill in catalog.skills.values() {
            if skill.required_weapon.is_some() && self.skills.remove(&skill.id).is_some() {
                reset.push(skill.id.clone());
            }
        }
        reset
    }
}

/// Emblem sockets and colours accepted by one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmblemSlotRule {
    pub slot: EquipSlot,
    pub sockets: usize,
    pub allowed: &'static [EmblemColor],
}

const COLOURED: &[EmblemColor] = &[
    EmblemColor::Red,
    EmblemColor::Yellow,
    EmblemColor::Green,
    EmblemColor::Blue,
];

/// Per-slot emblem rules. Slots not listed take no emblems.
pub const EMBLEM_SLOT_RULES: &[EmblemSlotRule] = &[
    EmblemSlotRule { slot: EquipSlot::Weapon, sockets: 2, allowed: COLOURED },
    EmblemSlotRule { slot: EquipSlot::Title, sockets: 1, allowed: &[EmblemColor::Platinum] },
    EmblemSlotRule { slot: EquipSlot::Head, sockets: 2, allowed: COLOURED },
    EmblemSlotRule { slot: EquipSlot::Top, sockets: 2, allowed: COLOURED },
    EmblemSlotRule { slot: EquipSlot::Bottom, sockets: 2, allowed: COLOURED },
    EmblemSlotRule { slot: EquipSlot::Belt, sockets: 2, allowed: COLOURED },
    EmblemSlotRule { slot: EquipSlot::Shoes, sockets: 2, allowed: COLOURED },
    EmblemSlotRule { slot: EquipSlot::Bracelet, sockets: 2, allowed: COLOURED },
    EmblemSlotRule { slot: EquipSlot::Necklace, sockets: 2, allowed: COLOURED },
    EmblemSlotRule { slot: EquipSlot::Ring, sockets: 2, allowed: COLOURED },
    EmblemSlotRule { slot: EquipSlot::Support, sockets: 1, allowed: COLOURED },
];

pub fn emblem_rule(slot: EquipSlot) -> Option<&'static EmblemSlotRule> {
    EMBLEM_SLOT_RULES.iter().find(|rule| rule.slot == slot)
}
