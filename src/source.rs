//! Stat sources module.
//!
//! Every configurable dimension of a build is a [`StatSource`]. A source
//! looks up the catalog entries selected in the configuration and emits
//! their stat payloads as deltas tagged with where they came from.
//! Sources are stateless and deterministic: the same configuration and
//! catalog always produce the same deltas in the same order.
//!
//! Selections the catalog does not know, or that do not fit their slot,
//! contribute nothing and are logged as [`EngineError::InvalidSelection`].

use crate::build_config::{emblem_rule, BuildConfiguration, SlotLoadout, MAX_EMBLEM_LEVEL};
use crate::catalog::{Catalog, CatalogItem, EquipSlot};
use crate::delta::StatDelta;
use crate::error::EngineError;
use crate::ids::CatalogId;
use crate::settings::EngineSettings;
use crate::skill_tree::SkillTree;
use std::collections::BTreeMap;
use tracing::warn;

/// Everything a source may read.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub config: &'a BuildConfiguration,
    pub catalog: &'a Catalog,
    pub settings: &'a EngineSettings,
}

/// Trait for stat sources.
///
/// Multiple sources are concatenated; the aggregator sums their deltas.
pub trait StatSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Append this source's tagged deltas to `out`.
    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>);
}

fn push_tagged(out: &mut Vec<StatDelta>, stats: &[StatDelta], tag: &str) {
    out.extend(stats.iter().map(|delta| delta.tagged(tag)));
}

fn invalid(category: &'static str, id: impl ToString) -> EngineError {
    EngineError::InvalidSelection {
        category,
        id: id.to_string(),
    }
}

fn log_invalid(source: &'static str, err: EngineError) {
    warn!(source, %err, "selection ignored");
}

fn slot_label(slot: EquipSlot) -> String {
    format!("{slot:?}")
}

/// The item in `slot`, if it exists and fits the slot.
///
/// Weapons with a sub-type only fit when it matches the character's.
fn valid_item<'a>(
    ctx: &ResolveContext<'a>,
    slot: EquipSlot,
    loadout: &SlotLoadout,
) -> Result<Option<&'a CatalogItem>, EngineError> {
    let Some(id) = &loadout.item else {
        return Ok(None);
    };
    let item = ctx.catalog.item(id).ok_or_else(|| invalid("equipment", id))?;
    if item.slot != Some(slot) {
        return Err(invalid("equipment", format!("{id} in {slot:?}")));
    }
    if let Some(weapon_type) = &item.weapon_type {
        if ctx.config.character.weapon_type.as_ref() != Some(weapon_type) {
            return Err(invalid("weapon sub-type", format!("{id} ({weapon_type})")));
        }
    }
    Ok(Some(item))
}

/// Validly equipped items, in slot order.
pub fn equipped<'a>(ctx: &ResolveContext<'a>) -> Vec<(EquipSlot, &'a SlotLoadout, &'a CatalogItem)> {
    ctx.config
        .equipment
        .iter()
        .filter_map(|(slot, loadout)| {
            valid_item(ctx, *slot, loadout)
                .ok()
                .flatten()
                .map(|item| (*slot, loadout, item))
        })
        .collect()
}

/// Stats of the equipped items themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct EquipmentSource;

impl StatSource for EquipmentSource {
    fn name(&self) -> &'static str {
        "equipment"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        for (slot, loadout) in &ctx.config.equipment {
            match valid_item(ctx, *slot, loadout) {
                Ok(Some(item)) => {
                    push_tagged(out, &item.stats, &format!("{}: {}", slot_label(*slot), item.name))
                }
                Ok(None) => {}
                Err(err) => log_invalid(self.name(), err),
            }
        }
    }
}

/// Set bonuses for items sharing a name prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetBonusSource;

impl StatSource for SetBonusSource {
    fn name(&self) -> &'static str {
        "set bonus"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        let items = equipped(ctx);
        for bonus in ctx.catalog.set_bonuses() {
            let pieces = items
                .iter()
                .filter(|(_, _, item)| item.name.starts_with(&bonus.prefix))
                .count() as u32;
            if pieces >= bonus.pieces {
                push_tagged(out, &bonus.stats, &format!("Set: {} ({}pc)", bonus.name, bonus.pieces));
            }
        }
    }
}

/// Reinforcement levels on equipped items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReinforcementSource;

impl StatSource for ReinforcementSource {
    fn name(&self) -> &'static str {
        "reinforcement"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        for (slot, loadout, _) in equipped(ctx) {
            if loadout.reinforcement == 0 {
                continue;
            }
            if let Some(stats) = ctx.catalog.reinforcement.get(&(slot.category(), loadout.reinforcement)) {
                let tag = format!("Reinforcement ({}) +{}", slot_label(slot), loadout.reinforcement);
                push_tagged(out, stats, &tag);
            }
        }
    }
}

/// Polish levels on equipped items.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolishSource;

impl StatSource for PolishSource {
    fn name(&self) -> &'static str {
        "polish"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        for (slot, loadout, _) in equipped(ctx) {
            if loadout.polish == 0 {
                continue;
            }
            if let Some(stats) = ctx.catalog.polish.get(&(slot.category(), loadout.polish)) {
                let tag = format!("Polish ({}) +{}", slot_label(slot), loadout.polish);
                push_tagged(out, stats, &tag);
            }
        }
    }
}

/// Look up a slot-bound option (enchant or magic seal) and check its slot.
fn slot_option<'a>(
    table: &'a BTreeMap<CatalogId, CatalogItem>,
    category: &'static str,
    slot: EquipSlot,
    id: &CatalogId,
) -> Result<&'a CatalogItem, EngineError> {
    let option = table.get(id).ok_or_else(|| invalid(category, id))?;
    match option.slot {
        Some(allowed) if allowed != slot => Err(invalid(category, format!("{id} in {slot:?}"))),
        _ => Ok(option),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnchantSource;

impl StatSource for EnchantSource {
    fn name(&self) -> &'static str {
        "enchant"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        for (slot, loadout, _) in equipped(ctx) {
            let Some(id) = &loadout.enchant else {
                continue;
            };
            match slot_option(&ctx.catalog.enchants, "enchant", slot, id) {
                Ok(enchant) => push_tagged(
                    out,
                    &enchant.stats,
                    &format!("Enchant ({}): {}", slot_label(slot), enchant.name),
                ),
                Err(err) => log_invalid(self.name(), err),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSealSource;

impl StatSource for MagicSealSource {
    fn name(&self) -> &'static str {
        "magic seal"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        for (slot, loadout, _) in equipped(ctx) {
            for id in &loadout.magic_seals {
                match slot_option(&ctx.catalog.magic_seals, "magic seal", slot, id) {
                    Ok(seal) => push_tagged(
                        out,
                        &seal.stats,
                        &format!("Magic Seal ({}): {}", slot_label(slot), seal.name),
                    ),
                    Err(err) => log_invalid(self.name(), err),
                }
            }
        }
    }
}

/// Emblems socketed into equipped items.
///
/// Socket count and allowed colours come from the slot's emblem rule.
/// Levels are clamped to `1..=15` and the highest defined level at or
/// below the assigned one is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmblemSource;

impl StatSource for EmblemSource {
    fn name(&self) -> &'static str {
        "emblem"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        for (slot, loadout, _) in equipped(ctx) {
            let assignments = loadout.emblems.iter().enumerate();
            let Some(rule) = emblem_rule(slot) else {
                if loadout.emblems.iter().any(Option::is_some) {
                    log_invalid(self.name(), invalid("emblem", format!("{slot:?} takes no emblems")));
                }
                continue;
            };
            for (socket, assignment) in assignments {
                let Some(assignment) = assignment else {
                    continue;
                };
                if socket >= rule.sockets {
                    log_invalid(self.name(), invalid("emblem", format!("{slot:?} socket {socket}")));
                    continue;
                }
                let definition = match &assignment.option {
                    Some(option) => ctx.catalog.platinum_emblem(option),
                    None => ctx.catalog.emblem(&assignment.emblem),
                };
                let Some(definition) = definition else {
                    log_invalid(self.name(), invalid("emblem", &assignment.emblem));
                    continue;
                };
                if !rule.allowed.contains(&definition.color) {
                    log_invalid(
                        self.name(),
                        invalid("emblem", format!("{:?} emblem in {slot:?}", definition.color)),
                    );
                    continue;
                }
                let level = assignment.level.clamp(1, MAX_EMBLEM_LEVEL);
                if let Some((defined, stats)) = definition.levels.range(..=level).next_back() {
                    let tag = format!("Emblem ({}): {} Lv{}", slot_label(slot), definition.name, defined);
                    push_tagged(out, stats, &tag);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CastleSealSource;

impl StatSource for CastleSealSource {
    fn name(&self) -> &'static str {
        "castle seal"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        collect_listed(
            self.name(),
            "Castle Seal",
            &ctx.catalog.castle_seals,
            &ctx.config.castle_seals,
            out,
        );
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AvatarSource;

impl StatSource for AvatarSource {
    fn name(&self) -> &'static str {
        "avatar"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        collect_listed(self.name(), "Avatar", &ctx.catalog.avatars, &ctx.config.avatars, out);
    }
}

fn collect_listed(
    source: &'static str,
    label: &str,
    table: &BTreeMap<CatalogId, CatalogItem>,
    selected: &[CatalogId],
    out: &mut Vec<StatDelta>,
) {
    for id in selected {
        match table.get(id) {
            Some(entry) => push_tagged(out, &entry.stats, &format!("{label}: {}", entry.name)),
            None => log_invalid(source, invalid(source, id)),
        }
    }
}

/// Training sliders. Each track uses its highest tier at or below the
/// slider value.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrainingSource;

impl StatSource for TrainingSource {
    fn name(&self) -> &'static str {
        "training"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        for (track, slider) in &ctx.config.training {
            if *slider == 0 {
                continue;
            }
            let Some(tiers) = ctx.catalog.training.get(track) else {
                log_invalid(self.name(), invalid("training", track));
                continue;
            };
            if let Some((tier, stats)) = tiers.range(..=*slider).next_back() {
                push_tagged(out, stats, &format!("Training ({track}) Lv{tier}"));
            }
        }
    }
}

/// Passive stats of invested skills, scaled by the readable level.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillPassiveSource;

impl StatSource for SkillPassiveSource {
    fn name(&self) -> &'static str {
        "skill passive"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        let tree = SkillTree::new(ctx.catalog, ctx.settings, &ctx.config.character);
        for skill in tree.job_skills() {
            if skill.passive.is_empty() {
                continue;
            }
            let level = tree.readable_level(skill, &ctx.config.skills);
            if level == 0 {
                continue;
            }
            let tag = format!("Skill: {} Lv{level}", skill.name);
            out.extend(
                skill
                    .passive
                    .iter()
                    .map(|delta| delta.scaled(f64::from(level)).tagged(tag.as_str())),
            );
        }
    }
}

/// Skill runes on the rune page plus the selected engraving tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuneSource;

impl StatSource for RuneSource {
    fn name(&self) -> &'static str {
        "rune"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        for id in ctx.config.runes.slots.iter().flatten() {
            match ctx.catalog.rune(id) {
                Some(rune) => push_tagged(out, &rune.stats, &format!("Rune: {}", rune.name)),
                None => log_invalid(self.name(), invalid("rune", id)),
            }
        }
        let Some(selection) = &ctx.config.runes.engraving else {
            return;
        };
        let tier = ctx
            .catalog
            .engravings
            .get(&selection.name)
            .and_then(|tiers| tiers.get(selection.tier));
        match tier {
            Some(tier) => push_tagged(
                out,
                &tier.stats,
                &format!("Engraving: {} T{}", selection.name, tier.tier),
            ),
            None => log_invalid(
                self.name(),
                invalid("engraving", format!("{} #{}", selection.name, selection.tier)),
            ),
        }
    }
}

/// Active job-mechanic triggers for the character's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerSource;

impl StatSource for TriggerSource {
    fn name(&self) -> &'static str {
        "job trigger"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        for id in &ctx.config.triggers {
            let Some(trigger) = ctx.catalog.job_triggers.get(id) else {
                log_invalid(self.name(), invalid("job trigger", id));
                continue;
            };
            if trigger
                .job
                .as_ref()
                .is_some_and(|job| *job != ctx.config.character.job_class)
            {
                log_invalid(self.name(), invalid("job trigger", format!("{id} for another job")));
                continue;
            }
            push_tagged(out, &trigger.stats, &format!("Trigger: {}", trigger.name));
        }
    }
}

/// Consumable buffs, only while the consumable toggle is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumableSource;

impl StatSource for ConsumableSource {
    fn name(&self) -> &'static str {
        "consumable"
    }

    fn collect(&self, ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
        if !ctx.config.options.consumables {
            return;
        }
        for consumable in &ctx.catalog.consumables {
            push_tagged(out, &consumable.stats, &format!("Consumable: {}", consumable.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_config::{EmblemAssignment, EngravingSelection};
    use crate::catalog::RawCatalog;
    use crate::stat_key::StatKey;
    use serde_json::json;

    fn catalog() -> Catalog {
        let raw: RawCatalog = serde_json::from_value(json!({
            "weapons": [
                { "id": "gs", "name": "Dusk Greatsword", "weaponType": "greatsword", "stats_physical_attack": 1000 },
                { "id": "katana", "name": "Katana", "weaponType": "katana", "stats_physical_attack": 900 }
            ],
            "armor": [
                { "id": "top", "name": "Ember Top", "slot": "top", "stats_str": 50 }
            ],
            "accessories": [
                { "id": "ring", "name": "Ember Ring", "slot": "ring", "stats_crit_rate": 3 }
            ],
            "reinforcement": [
                { "category": "weapon", "level": 12, "stats_physical_attack": 300 }
            ],
            "enchants": [
                { "id": "ench_ring", "name": "Crit +2", "slot": "ring", "stats_crit_rate": 2 }
            ],
            "emblems": [
                { "id": "red", "name": "Red", "color": "red", "level": 1, "stats_str": 5 },
                { "id": "red", "name": "Red", "color": "red", "level": 10, "stats_str": 20 },
                { "id": "plat", "name": "Plat", "color": "platinum", "option": "Upper Slash", "level": 1, "skill_lv_exact_upper_slash": 1 }
            ],
            "training": [
                { "track": "attack", "level": 5, "stats_physical_attack": 50 },
                { "track": "attack", "level": 10, "stats_physical_attack": 120 }
            ],
            "engravings": [
                { "name": "Fury", "tier": 1, "stats_final_damage": 2 },
                { "name": "Fury", "tier": 2, "stats_final_damage": 4 }
            ],
            "jobTriggers": [
                { "id": "rage", "name": "Rage", "job": "berserker", "stats_final_damage": 5 }
            ],
            "consumables": [
                { "id": "potion", "name": "Potion", "stats_str": 100 }
            ]
        }))
        .unwrap();
        Catalog::load(&raw)
    }

    fn config() -> BuildConfiguration {
        let mut config = BuildConfiguration::default();
        config.character.job_class = "berserker".into();
        config.character.weapon_type = Some("greatsword".into());
        config
    }

    fn collect(source: &dyn StatSource, config: &BuildConfiguration, catalog: &Catalog) -> Vec<StatDelta> {
        let settings = EngineSettings::default();
        let ctx = ResolveContext {
            config,
            catalog,
            settings: &settings,
        };
        let mut out = Vec::new();
        source.collect(&ctx, &mut out);
        out
    }

    #[test]
    fn test_equipment_tags_slot_and_name() {
        let catalog = catalog();
        let mut config = config();
        config.equip(EquipSlot::Weapon, CatalogId::new("gs"));
        let out = collect(&EquipmentSource, &config, &catalog);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "Weapon: Dusk Greatsword");
    }

    #[test]
    fn test_weapon_sub_type_must_match() {
        let catalog = catalog();
        let mut config = config();
        config.equip(EquipSlot::Weapon, CatalogId::new("katana"));
        assert!(collect(&EquipmentSource, &config, &catalog).is_empty());
    }

    #[test]
    fn test_item_in_wrong_slot_or_unknown_is_ignored() {
        let catalog = catalog();
        let mut config = config();
        config.equip(EquipSlot::Head, CatalogId::new("top"));
        config.equip(EquipSlot::Ring, CatalogId::new("nope"));
        assert!(collect(&EquipmentSource, &config, &catalog).is_empty());
    }

    #[test]
    fn test_reinforcement_and_enchant_need_an_item() {
        let catalog = catalog();
        let mut config = config();
        config.equipment.entry(EquipSlot::Weapon).or_default().reinforcement = 12;
        assert!(collect(&ReinforcementSource, &config, &catalog).is_empty());

        config.equip(EquipSlot::Weapon, CatalogId::new("gs"));
        let out = collect(&ReinforcementSource, &config, &catalog);
        assert_eq!(out[0].amount, 300.0);
        assert_eq!(out[0].source, "Reinforcement (Weapon) +12");

        config.equip(EquipSlot::Ring, CatalogId::new("ring"));
        config.equipment.get_mut(&EquipSlot::Ring).unwrap().enchant = Some(CatalogId::new("ench_ring"));
        config.equipment.get_mut(&EquipSlot::Weapon).unwrap().enchant = Some(CatalogId::new("ench_ring"));
        let out = collect(&EnchantSource, &config, &catalog);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "Enchant (Ring): Crit +2");
    }

    #[test]
    fn test_emblem_levels_and_rules() {
        let catalog = catalog();
        let mut config = config();
        config.equip(EquipSlot::Top, CatalogId::new("top"));
        config.equip(EquipSlot::Title, CatalogId::new("missing_title"));
        config.equipment.get_mut(&EquipSlot::Top).unwrap().emblems = vec![
            Some(EmblemAssignment {
                emblem: CatalogId::new("red"),
                level: 12,
                option: None,
            }),
            Some(EmblemAssignment {
                emblem: CatalogId::new("plat"),
                level: 1,
                option: Some("upper_slash".into()),
            }),
            Some(EmblemAssignment {
                emblem: CatalogId::new("red"),
                level: 1,
                option: None,
            }),
        ];
        let out = collect(&EmblemSource, &config, &catalog);
        // Platinum is not allowed in armor and the third socket does not exist.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].amount, 20.0);
        assert_eq!(out[0].source, "Emblem (Top): Red Lv10");
    }

    #[test]
    fn test_training_uses_highest_reached_tier() {
        let catalog = catalog();
        let mut config = config();
        config.training.insert("attack".into(), 7);
        let out = collect(&TrainingSource, &config, &catalog);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, StatKey::PhysicalAttack);
        assert_eq!(out[0].amount, 50.0);
    }

    #[test]
    fn test_engraving_tier() {
        let catalog = catalog();
        let mut config = config();
        config.runes.engraving = Some(EngravingSelection {
            name: "Fury".into(),
            tier: 1,
        });
        let out = collect(&RuneSource, &config, &catalog);
        assert_eq!(out[0].amount, 4.0);
        assert_eq!(out[0].source, "Engraving: Fury T2");

        config.runes.engraving = Some(EngravingSelection {
            name: "Fury".into(),
            tier: 0,
        });
        let out = collect(&RuneSource, &config, &catalog);
        assert_eq!(out[0].amount, 2.0);

        config.runes.engraving = Some(EngravingSelection {
            name: "Fury".into(),
            tier: 2,
        });
        assert!(collect(&RuneSource, &config, &catalog).is_empty());
    }

    #[test]
    fn test_trigger_job_and_consumable_toggle() {
        let catalog = catalog();
        let mut config = config();
        config.triggers.push(CatalogId::new("rage"));
        assert_eq!(collect(&TriggerSource, &config, &catalog).len(), 1);
        config.character.job_class = "paladin".into();
        assert!(collect(&TriggerSource, &config, &catalog).is_empty());

        assert!(collect(&ConsumableSource, &config, &catalog).is_empty());
        config.options.consumables = true;
        assert_eq!(collect(&ConsumableSource, &config, &catalog).len(), 1);
    }
}
