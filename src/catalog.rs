//! Stat catalog loader.
//!
//! Raw catalog tables are ordered collections of flat JSON rows whose
//! column names mix snake_case and camelCase. Loading normalizes every
//! column name to snake_case, extracts the sparse stat columns into
//! untagged [`StatDelta`] payloads, and indexes the result by id.
//!
//! Loading never fails per row: a malformed value drops that stat, a row
//! without an id is skipped, and both are logged.

use crate::delta::StatDelta;
use crate::error::EngineError;
use crate::ids::{CatalogId, SkillId};
use crate::mechanics::MechanicDescriptor;
use crate::stat_key::{Element, StatKey, StatusAilment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A raw catalog row as delivered by the external data source.
pub type RawRow = serde_json::Map<String, Value>;

/// Equipment slots.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    Weapon,
    Title,
    Head,
    Top,
    Bottom,
    Belt,
    Shoes,
    Bracelet,
    Necklace,
    Ring,
    Support,
    MagicStone,
    Earring,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 13] = [
        EquipSlot::Weapon,
        EquipSlot::Title,
        EquipSlot::Head,
        EquipSlot::Top,
        EquipSlot::Bottom,
        EquipSlot::Belt,
        EquipSlot::Shoes,
        EquipSlot::Bracelet,
        EquipSlot::Necklace,
        EquipSlot::Ring,
        EquipSlot::Support,
        EquipSlot::MagicStone,
        EquipSlot::Earring,
    ];

    pub fn parse(token: &str) -> Option<Self> {
        let slot = match token {
            "weapon" => EquipSlot::Weapon,
            "title" => EquipSlot::Title,
            "head" | "shoulder" => EquipSlot::Head,
            "top" | "coat" => EquipSlot::Top,
            "bottom" | "pants" => EquipSlot::Bottom,
            "belt" => EquipSlot::Belt,
            "shoes" => EquipSlot::Shoes,
            "bracelet" => EquipSlot::Bracelet,
            "necklace" => EquipSlot::Necklace,
            "ring" => EquipSlot::Ring,
            "support" | "sub_equipment" => EquipSlot::Support,
            "magic_stone" => EquipSlot::MagicStone,
            "earring" => EquipSlot::Earring,
            _ => return None,
        };
        Some(slot)
    }

    /// The broad category this slot belongs to.
    pub fn category(self) -> SlotCategory {
        match self {
            EquipSlot::Weapon => SlotCategory::Weapon,
            EquipSlot::Title => SlotCategory::Title,
            EquipSlot::Head
            | EquipSlot::Top
            | EquipSlot::Bottom
            | EquipSlot::Belt
            | EquipSlot::Shoes => SlotCategory::Armor,
            EquipSlot::Bracelet | EquipSlot::Necklace | EquipSlot::Ring => SlotCategory::Accessory,
            EquipSlot::Support | EquipSlot::MagicStone | EquipSlot::Earring => SlotCategory::Special,
        }
    }
}

/// Broad slot categories, used by reinforcement/polish tables and gear points.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    Weapon,
    Title,
    Armor,
    Accessory,
    Special,
}

impl SlotCategory {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "weapon" => Some(SlotCategory::Weapon),
            "title" => Some(SlotCategory::Title),
            "armor" => Some(SlotCategory::Armor),
            "accessory" => Some(SlotCategory::Accessory),
            "special" => Some(SlotCategory::Special),
            _ => None,
        }
    }
}

/// Emblem colours. Platinum emblems are keyed by an option instead.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmblemColor {
    Red,
    Yellow,
    Green,
    Blue,
    Platinum,
}

impl EmblemColor {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "red" => Some(EmblemColor::Red),
            "yellow" => Some(EmblemColor::Yellow),
            "green" => Some(EmblemColor::Green),
            "blue" => Some(EmblemColor::Blue),
            "platinum" => Some(EmblemColor::Platinum),
            _ => None,
        }
    }
}

/// A normalized catalog record with a stat payload.
///
/// Used for equipment, enchant options, seals, avatars, job triggers and
/// consumables. Fields a table does not use stay at their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogId,
    pub name: String,
    pub grade: Option<String>,
    pub slot: Option<EquipSlot>,
    pub weapon_type: Option<String>,
    /// Intrinsic gear-point value.
    pub item_code: u32,
    /// Job class restriction, for job triggers.
    pub job: Option<String>,
    pub stats: Vec<StatDelta>,
}

/// A level-indexed emblem definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmblemDefinition {
    pub id: CatalogId,
    pub name: String,
    pub color: EmblemColor,
    /// Platinum option key (usually a skill name).
    pub option: Option<String>,
    pub levels: BTreeMap<u8, Vec<StatDelta>>,
}

/// Skill definition with unlock rules, costs and damage coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    /// Snake-case name used by the exact-skill bonus namespace.
    pub name_key: String,
    /// `None` means the skill is shared by every job.
    pub job_group: Option<String>,
    pub job_class: Option<String>,
    pub start_level: u16,
    pub level_step: u16,
    pub min_level: u16,
    pub max_level: u16,
    /// Hard cap on the effective level including bonus levels.
    pub limit_level: u16,
    pub sp_cost: u32,
    pub tp_cost: u32,
    /// Cooldown in seconds.
    pub cooldown: f64,
    pub base_damage_rate: f64,
    pub base_flat_damage: f64,
    pub damage_rate_growth: f64,
    pub flat_damage_growth: f64,
    pub element: Option<Element>,
    pub hit_count: u32,
    /// Damage bonus (%) per technique point; falls back to the engine setting.
    pub tp_damage_rate: Option<f64>,
    pub required_weapon: Option<String>,
    /// Passive stats granted per invested level.
    pub passive: Vec<StatDelta>,
    pub mechanic: Option<MechanicDescriptor>,
}

impl SkillDefinition {
    /// Damage rate (%) at `level`.
    pub fn rate(&self, level: u16) -> f64 {
        if level == 0 {
            return 0.0;
        }
        self.base_damage_rate + self.damage_rate_growth * f64::from(level - 1)
    }

    /// Flat damage at `level`.
    pub fn flat(&self, level: u16) -> f64 {
        if level == 0 {
            return 0.0;
        }
        self.base_flat_damage + self.flat_damage_growth * f64::from(level - 1)
    }

    /// Binary skills are acquired or not and never consume skill points.
    pub fn is_binary(&self) -> bool {
        self.min_level == 1 && self.max_level == 1
    }

    /// Whether the skill deals damage by itself or through a mechanic.
    pub fn is_offensive(&self) -> bool {
        self.base_damage_rate > 0.0 || self.base_flat_damage > 0.0 || self.mechanic.is_some()
    }

    pub fn available_to(&self, job_group: &str, job_class: &str) -> bool {
        match (&self.job_group, &self.job_class) {
            (None, _) => true,
            (Some(group), None) => group == job_group,
            (Some(group), Some(class)) => group == job_group && class == job_class,
        }
    }
}

/// A skill rune.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRune {
    pub id: CatalogId,
    pub name: String,
    pub grade: Option<String>,
    pub target_skill: Option<String>,
    pub stats: Vec<StatDelta>,
}

/// One tier of an engraving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngravingTier {
    pub tier: u32,
    pub stats: Vec<StatDelta>,
}

/// An N-piece set bonus tier for items sharing a name prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetBonus {
    pub prefix: String,
    pub name: String,
    pub pieces: u32,
    pub stats: Vec<StatDelta>,
}

/// Gear point categories.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearCategory {
    Armor,
    Accessory,
    Special,
}

impl GearCategory {
    pub const ALL: [GearCategory; 3] = [
        GearCategory::Armor,
        GearCategory::Accessory,
        GearCategory::Special,
    ];

    pub fn of_slot(slot: EquipSlot) -> Option<Self> {
        match slot.category() {
            SlotCategory::Armor => Some(GearCategory::Armor),
            SlotCategory::Accessory => Some(GearCategory::Accessory),
            SlotCategory::Special => Some(GearCategory::Special),
            SlotCategory::Weapon | SlotCategory::Title => None,
        }
    }
}

/// One gear-point threshold with its tier label and bonus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearPointThreshold {
    pub category: GearCategory,
    pub threshold: u32,
    pub tier: String,
    pub stats: Vec<StatDelta>,
}

/// Raw catalog tables, as fetched by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCatalog {
    pub weapons: Vec<RawRow>,
    pub armor: Vec<RawRow>,
    pub accessories: Vec<RawRow>,
    #[serde(alias = "specialItems")]
    pub special_items: Vec<RawRow>,
    pub reinforcement: Vec<RawRow>,
    pub polish: Vec<RawRow>,
    pub training: Vec<RawRow>,
    #[serde(alias = "castleSeals")]
    pub castle_seals: Vec<RawRow>,
    pub avatars: Vec<RawRow>,
    #[serde(alias = "magicSeals")]
    pub magic_seals: Vec<RawRow>,
    pub enchants: Vec<RawRow>,
    pub emblems: Vec<RawRow>,
    pub skills: Vec<RawRow>,
    #[serde(alias = "skillRunes")]
    pub skill_runes: Vec<RawRow>,
    pub engravings: Vec<RawRow>,
    #[serde(alias = "jobTriggers")]
    pub job_triggers: Vec<RawRow>,
    pub consumables: Vec<RawRow>,
    #[serde(alias = "setBonuses")]
    pub set_bonuses: Vec<RawRow>,
    #[serde(alias = "gearPoints")]
    pub gear_points: Vec<RawRow>,
}

/// The normalized, immutable catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub(crate) items: BTreeMap<CatalogId, CatalogItem>,
    pub(crate) reinforcement: BTreeMap<(SlotCategory, u8), Vec<StatDelta>>,
    pub(crate) polish: BTreeMap<(SlotCategory, u8), Vec<StatDelta>>,
    pub(crate) training: BTreeMap<String, BTreeMap<u8, Vec<StatDelta>>>,
    pub(crate) castle_seals: BTreeMap<CatalogId, CatalogItem>,
    pub(crate) avatars: BTreeMap<CatalogId, CatalogItem>,
    pub(crate) magic_seals: BTreeMap<CatalogId, CatalogItem>,
    pub(crate) enchants: BTreeMap<CatalogId, CatalogItem>,
    pub(crate) emblems: BTreeMap<CatalogId, EmblemDefinition>,
    pub(crate) platinum_emblems: BTreeMap<String, EmblemDefinition>,
    pub(crate) skills: BTreeMap<SkillId, SkillDefinition>,
    pub(crate) runes: BTreeMap<CatalogId, SkillRune>,
    pub(crate) engravings: BTreeMap<String, Vec<EngravingTier>>,
    pub(crate) job_triggers: BTreeMap<CatalogId, CatalogItem>,
    pub(crate) consumables: Vec<CatalogItem>,
    pub(crate) set_bonuses: Vec<SetBonus>,
    pub(crate) gear_points: BTreeMap<GearCategory, Vec<GearPointThreshold>>,
}

impl Catalog {
    /// Parse a JSON document of raw tables and load it.
    ///
    /// Only a syntactically invalid document is an error; bad rows are
    /// dropped during loading.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Ok(Self::load(&raw))
    }

    /// Normalize every raw table into the catalog.
    pub fn load(raw: &RawCatalog) -> Self {
        let mut catalog = Catalog::default();

        for row in rows("weapons", &raw.weapons) {
            if let Some(mut item) = row.item() {
                item.slot = Some(EquipSlot::Weapon);
                catalog.items.insert(item.id.clone(), item);
            }
        }
        for (table, source) in [
            ("armor", &raw.armor),
            ("accessories", &raw.accessories),
            ("special_items", &raw.special_items),
        ] {
            for row in rows(table, source) {
                match row.item() {
                    Some(item) if item.slot.is_some() => {
                        catalog.items.insert(item.id.clone(), item);
                    }
                    Some(item) => warn!(table, id = %item.id, "equipment row without a slot, skipped"),
                    None => {}
                }
            }
        }

        catalog.reinforcement = tier_table(rows("reinforcement", &raw.reinforcement));
        catalog.polish = tier_table(rows("polish", &raw.polish));

        for row in rows("training", &raw.training) {
            let Ok(level) = row.narrow::<u8>(&["level", "tier"]) else {
                continue;
            };
            let (Some(track), Some(level)) = (row.text(&["track", "name"]), level) else {
                row.skip("missing track or level");
                continue;
            };
            catalog
                .training
                .entry(track)
                .or_default()
                .insert(level, row.stats());
        }

        catalog.castle_seals = item_map(rows("castle_seals", &raw.castle_seals));
        catalog.avatars = item_map(rows("avatars", &raw.avatars));
        catalog.magic_seals = item_map(rows("magic_seals", &raw.magic_seals));
        catalog.enchants = item_map(rows("enchants", &raw.enchants));
        catalog.job_triggers = item_map(rows("job_triggers", &raw.job_triggers));
        catalog.consumables = rows("consumables", &raw.consumables)
            .filter_map(|row| row.item())
            .collect();

        for row in rows("emblems", &raw.emblems) {
            catalog.load_emblem(&row);
        }

        for row in rows("skills", &raw.skills) {
            if let Some(skill) = row.skill() {
                catalog.skills.insert(skill.id.clone(), skill);
            }
        }

        for row in rows("skill_runes", &raw.skill_runes) {
            if let Some(rune) = row.rune() {
                catalog.runes.insert(rune.id.clone(), rune);
            }
        }

        for row in rows("engravings", &raw.engravings) {
            let Some(name) = row.text(&["name", "engraving"]) else {
                row.skip("missing name");
                continue;
            };
            let Ok(tier) = row.narrow::<u32>(&["tier", "level"]) else {
                continue;
            };
            catalog.engravings.entry(name).or_default().push(EngravingTier {
                tier: tier.unwrap_or(0),
                stats: row.stats(),
            });
        }
        for tiers in catalog.engravings.values_mut() {
            tiers.sort_by_key(|t| t.tier);
        }

        for row in rows("set_bonuses", &raw.set_bonuses) {
            let Ok(pieces) = row.narrow::<u32>(&["pieces", "required", "count"]) else {
                continue;
            };
            let (Some(prefix), Some(pieces)) = (row.text(&["prefix", "set_prefix", "group"]), pieces) else {
                row.skip("missing prefix or piece count");
                continue;
            };
            catalog.set_bonuses.push(SetBonus {
                name: row.text(&["name"]).unwrap_or_else(|| prefix.clone()),
                prefix,
                pieces,
                stats: row.stats(),
            });
        }

        for row in rows("gear_points", &raw.gear_points) {
            let category = row
                .text(&["category", "type"])
                .and_then(|c| match c.as_str() {
                    "armor" => Some(GearCategory::Armor),
                    "accessory" => Some(GearCategory::Accessory),
                    "special" => Some(GearCategory::Special),
                    _ => None,
                });
            let Ok(threshold) = row.narrow::<u32>(&["threshold", "points"]) else {
                continue;
            };
            let (Some(category), Some(threshold)) = (category, threshold) else {
                row.skip("missing category or threshold");
                continue;
            };
            catalog.gear_points.entry(category).or_default().push(GearPointThreshold {
                category,
                threshold,
                tier: row.text(&["tier", "name", "grade"]).unwrap_or_default(),
                stats: row.stats(),
            });
        }
        for thresholds in catalog.gear_points.values_mut() {
            thresholds.sort_by_key(|t| t.threshold);
        }

        debug!(
            items = catalog.items.len(),
            skills = catalog.skills.len(),
            emblems = catalog.emblems.len() + catalog.platinum_emblems.len(),
            "catalog loaded"
        );
        catalog
    }

    fn load_emblem(&mut self, row: &Row<'_>) {
        let (Some(id), Some(color)) = (
            row.text(&["id", "emblem_id"]),
            row.text(&["color", "type"]).and_then(|c| EmblemColor::parse(&to_snake_case(&c))),
        ) else {
            row.skip("missing id or colour");
            return;
        };
        let Ok(level) = row.narrow::<u8>(&["level"]) else {
            return;
        };
        let level = level.unwrap_or(1);
        let option = row.text(&["option", "option_id", "skill"]).map(|o| to_snake_case(&o));
        let definition = if color == EmblemColor::Platinum {
            let Some(key) = option.clone() else {
                row.skip("platinum emblem without an option");
                return;
            };
            self.platinum_emblems
                .entry(key)
                .or_insert_with(|| new_emblem(&id, row, color, option))
        } else {
            self.emblems
                .entry(CatalogId::new(&id))
                .or_insert_with(|| new_emblem(&id, row, color, None))
        };
        definition.levels.insert(level, row.stats());
    }

    pub fn item(&self, id: &CatalogId) -> Option<&CatalogItem> {
        self.items.get(id)
    }

    pub fn skill(&self, id: &SkillId) -> Option<&SkillDefinition> {
        self.skills.get(id)
    }

    /// Skills usable by a job, in id order.
    pub fn skills_for<'a>(
        &'a self,
        job_group: &'a str,
        job_class: &'a str,
    ) -> impl Iterator<Item = &'a SkillDefinition> + 'a {
        self.skills
            .values()
            .filter(move |skill| skill.available_to(job_group, job_class))
    }

    pub fn emblem(&self, id: &CatalogId) -> Option<&EmblemDefinition> {
        self.emblems.get(id)
    }

    pub fn platinum_emblem(&self, option: &str) -> Option<&EmblemDefinition> {
        self.platinum_emblems.get(&to_snake_case(option))
    }

    pub fn rune(&self, id: &CatalogId) -> Option<&SkillRune> {
        self.runes.get(id)
    }

    pub fn set_bonuses(&self) -> &[SetBonus] {
        &self.set_bonuses
    }

    /// Ascending thresholds for a gear category.
    pub fn gear_thresholds(&self, category: GearCategory) -> &[GearPointThreshold] {
        self.gear_points
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn new_emblem(id: &str, row: &Row<'_>, color: EmblemColor, option: Option<String>) -> EmblemDefinition {
    EmblemDefinition {
        id: CatalogId::new(id),
        name: row.text(&["name"]).unwrap_or_default(),
        color,
        option,
        levels: BTreeMap::new(),
    }
}

fn item_map<'a>(rows: impl Iterator<Item = Row<'a>>) -> BTreeMap<CatalogId, CatalogItem> {
    rows.filter_map(|row| row.item())
        .map(|item| (item.id.clone(), item))
        .collect()
}

fn tier_table<'a>(rows: impl Iterator<Item = Row<'a>>) -> BTreeMap<(SlotCategory, u8), Vec<StatDelta>> {
    let mut table = BTreeMap::new();
    for row in rows {
        let category = row
            .text(&["category", "slot_type", "slot"])
            .and_then(|c| SlotCategory::parse(&c).or_else(|| EquipSlot::parse(&c).map(EquipSlot::category)));
        let Ok(level) = row.narrow::<u8>(&["level", "amount"]) else {
            continue;
        };
        let (Some(category), Some(level)) = (category, level) else {
            row.skip("missing category or level");
            continue;
        };
        table.insert((category, level), row.stats());
    }
    table
}

/// Normalize a column name or token to snake_case.
///
/// `statsFireElement` becomes `stats_fire_element`; `Upper Slash`
/// becomes `upper_slash`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for ch in name.trim().chars() {
        if ch == '-' || ch == ' ' {
            if prev != Some('_') {
                out.push('_');
            }
            prev = Some('_');
            continue;
        }
        if ch.is_uppercase() {
            if matches!(prev, Some(p) if p.is_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    out
}

/// Parse a catalog cell as a number. Empty cells are absent.
fn parse_number(table: &str, column: &str, value: &Value) -> Result<Option<f64>, EngineError> {
    let number = match value {
        Value::Null | Value::Bool(_) => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim().trim_end_matches('%').replace(',', "");
            if trimmed.is_empty() {
                return Ok(None);
            }
            Some(trimmed.parse::<f64>().map_err(|_| EngineError::Data {
                table: table.to_string(),
                detail: format!("{column}: not a number ({s:?})"),
            })?)
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(EngineError::Data {
                table: table.to_string(),
                detail: format!("{column}: nested value"),
            })
        }
    };
    Ok(number.filter(|n| n.is_finite()))
}

fn rows<'a>(table: &'static str, raw: &'a [RawRow]) -> impl Iterator<Item = Row<'a>> + 'a {
    raw.iter().map(move |fields| Row::new(table, fields))
}

/// A raw row with snake_case column names.
struct Row<'a> {
    table: &'static str,
    fields: BTreeMap<String, &'a Value>,
}

impl<'a> Row<'a> {
    fn new(table: &'static str, raw: &'a RawRow) -> Self {
        let fields = raw.iter().map(|(k, v)| (to_snake_case(k), v)).collect();
        Self { table, fields }
    }

    fn skip(&self, reason: &str) {
        warn!(table = self.table, reason, "catalog row skipped");
    }

    fn value(&self, names: &[&str]) -> Option<&'a Value> {
        names.iter().find_map(|name| self.fields.get(*name).copied())
    }

    fn text(&self, names: &[&str]) -> Option<String> {
        match self.value(names)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn number(&self, names: &[&str]) -> Option<f64> {
        let name = names.iter().find(|name| self.fields.contains_key(**name))?;
        self.number_at(name)
    }

    fn number_at(&self, column: &str) -> Option<f64> {
        let value = self.fields.get(column)?;
        match parse_number(self.table, column, value) {
            Ok(n) => n,
            Err(err) => {
                debug!(%err, "catalog value dropped");
                None
            }
        }
    }

    /// A stat amount. Zero means absent.
    fn amount(&self, names: &[&str]) -> Option<f64> {
        self.number(names).filter(|n| *n != 0.0)
    }

    fn integer(&self, names: &[&str]) -> Option<i64> {
        self.number(names).map(|n| n.max(0.0) as i64)
    }

    /// An integer column that must fit `T`. An out-of-range value skips the row.
    fn narrow<T: TryFrom<i64>>(&self, names: &[&str]) -> Result<Option<T>, OutOfRange> {
        let Some(value) = self.integer(names) else {
            return Ok(None);
        };
        T::try_from(value).map(Some).map_err(|_| {
            let column = names.first().copied().unwrap_or_default();
            self.skip(&format!("{column} out of range ({value})"));
            OutOfRange
        })
    }

    /// Extract the sparse stat columns into untagged deltas.
    fn stats(&self) -> Vec<StatDelta> {
        let mut stats = Vec::new();
        for column in self.fields.keys() {
            let delta = if let Some(name) = column.strip_prefix("stats_") {
                StatKey::from_column(name).map(|key| (column, Target::Scalar(key)))
            } else if let Some(rest) = column.strip_prefix("skill_") {
                skill_column(rest).map(|target| (column, target))
            } else if let Some(rest) = column.strip_prefix("status_") {
                status_column(rest).map(|key| (column, Target::Scalar(key)))
            } else {
                None
            };
            let Some((column, target)) = delta else {
                continue;
            };
            let Some(amount) = self.number_at(column).filter(|n| *n != 0.0) else {
                continue;
            };
            stats.push(match target {
                Target::Scalar(key) => StatDelta::scalar(key, amount),
                Target::Level(key, level) => StatDelta::level_map(key, level, amount),
                Target::Exact(key, skill) => StatDelta::exact(key, skill, amount),
            });
        }
        stats
    }

    fn item(&self) -> Option<CatalogItem> {
        let Some(id) = self.text(&["id", "item_id", "option_id", "code"]) else {
            self.skip("missing id");
            return None;
        };
        Some(CatalogItem {
            name: self.text(&["name", "item_name", "option_name"]).unwrap_or_else(|| id.clone()),
            id: CatalogId::from(id),
            grade: self.text(&["grade", "rarity"]),
            slot: self.text(&["slot", "part"]).and_then(|s| EquipSlot::parse(&to_snake_case(&s))),
            weapon_type: self.text(&["weapon_type", "sub_type"]).map(|w| to_snake_case(&w)),
            item_code: self.narrow::<u32>(&["item_code", "gear_point"]).ok()?.unwrap_or(0),
            job: self.text(&["job", "job_class"]),
            stats: self.stats(),
        })
    }

    fn skill(&self) -> Option<SkillDefinition> {
        let Some(id) = self.text(&["id", "skill_id"]) else {
            self.skip("missing id");
            return None;
        };
        let name = self.text(&["name", "skill_name"]).unwrap_or_else(|| id.clone());
        let min_level = self.narrow::<u16>(&["min_level"]).ok()?.unwrap_or(0);
        let max_level = self
            .narrow::<u16>(&["max_level"])
            .ok()?
            .unwrap_or(1)
            .max(min_level)
            .max(1);
        let mechanic = self.value(&["mechanic"]).and_then(|value| {
            let parsed = match value {
                Value::String(s) => serde_json::from_str::<MechanicDescriptor>(s),
                other => serde_json::from_value::<MechanicDescriptor>((*other).clone()),
            };
            parsed
                .map_err(|err| debug!(table = self.table, skill = %id, %err, "mechanic dropped"))
                .ok()
        });
        Some(SkillDefinition {
            id: SkillId::from(id),
            name_key: to_snake_case(&name),
            name,
            job_group: self.text(&["job_group", "job"]),
            job_class: self.text(&["job_class", "class"]),
            start_level: self.narrow::<u16>(&["start_level", "required_level"]).ok()?.unwrap_or(1),
            level_step: self.narrow::<u16>(&["level_step", "step"]).ok()?.unwrap_or(1).max(1),
            min_level,
            max_level,
            limit_level: self.narrow::<u16>(&["limit_level"]).ok()?.unwrap_or(0).max(max_level),
            sp_cost: self.narrow::<u32>(&["sp_cost", "sp"]).ok()?.unwrap_or(0),
            tp_cost: self.narrow::<u32>(&["tp_cost", "tp"]).ok()?.unwrap_or(0),
            cooldown: self.number(&["cooldown", "cool_time"]).unwrap_or(0.0),
            base_damage_rate: self.number(&["base_damage_rate", "damage_rate"]).unwrap_or(0.0),
            base_flat_damage: self.number(&["base_flat_damage", "flat_damage"]).unwrap_or(0.0),
            damage_rate_growth: self.number(&["damage_rate_growth", "rate_growth"]).unwrap_or(0.0),
            flat_damage_growth: self.number(&["flat_damage_growth", "flat_growth"]).unwrap_or(0.0),
            element: self.text(&["element"]).and_then(|e| Element::parse(&to_snake_case(&e))),
            hit_count: self.narrow::<u32>(&["hit_count", "hits"]).ok()?.unwrap_or(1).max(1),
            tp_damage_rate: self.amount(&["tp_damage_rate"]),
            required_weapon: self.text(&["required_weapon", "weapon_type"]).map(|w| to_snake_case(&w)),
            passive: self.stats(),
            mechanic,
        })
    }

    fn rune(&self) -> Option<SkillRune> {
        let Some(id) = self.text(&["id", "rune_id"]) else {
            self.skip("missing id");
            return None;
        };
        let target_skill = self.text(&["target_skill", "target"]).map(|s| to_snake_case(&s));
        let mut stats = self.stats();
        if let Some(target) = &target_skill {
            if let Some(amount) = self.amount(&["rune_dmg", "rune_damage"]) {
                stats.push(StatDelta::exact(StatKey::SkillDamage, target.clone(), amount));
            }
            if let Some(amount) = self.amount(&["rune_cdr", "rune_cooldown"]) {
                stats.push(StatDelta::exact(StatKey::SkillCooldown, target.clone(), amount));
            }
        }
        Some(SkillRune {
            name: self.text(&["name"]).unwrap_or_else(|| id.clone()),
            id: CatalogId::from(id),
            grade: self.text(&["grade"]),
            target_skill,
            stats,
        })
    }
}

/// A structural integer that does not fit its field.
struct OutOfRange;

enum Target {
    Scalar(StatKey),
    Level(StatKey, u16),
    Exact(StatKey, String),
}

/// Parse `<type>_<target>` after the `skill_` prefix.
fn skill_column(rest: &str) -> Option<Target> {
    let (kind, target) = rest.split_once('_')?;
    let key = match kind {
        "dmg" => StatKey::SkillDamage,
        "lv" => StatKey::SkillLevel,
        "cdr" => StatKey::SkillCooldown,
        _ => return None,
    };
    if let Some(name) = target.strip_prefix("exact_") {
        return Some(Target::Exact(key, name.to_string()));
    }
    let level = target.strip_prefix("lv")?.parse::<u16>().ok()?;
    Some(Target::Level(key, level))
}

/// Parse `<ailment>_<field>` after the `status_` prefix.
fn status_column(rest: &str) -> Option<StatKey> {
    let (ailment, field) = rest.split_once('_')?;
    let ailment = StatusAilment::parse(ailment)?;
    match field {
        "dmg" | "damage" => Some(StatKey::StatusDamage(ailment)),
        "chance" | "rate" => Some(StatKey::StatusChance(ailment)),
        _ => None,
    }
}
