//! Gear point scorer.
//!
//! Every equipped item carries an intrinsic gear-point value. Each item is
//! looked up on its own in its category's ascending threshold table: the
//! highest threshold at or below the item's value names the item's tier and
//! unlocks that tier's bonus stats. Per category the item values and the
//! unlocked bonuses are summed.

use crate::build_config::BuildConfiguration;
use crate::catalog::{Catalog, EquipSlot, GearCategory, GearPointThreshold};
use crate::delta::StatDelta;
use crate::ids::CatalogId;
use crate::settings::EngineSettings;
use crate::source::{equipped, ResolveContext};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tier reached by one equipped item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemGearPoint {
    pub slot: EquipSlot,
    pub item: CatalogId,
    pub points: u32,
    pub tier: Option<String>,
    pub threshold: Option<u32>,
    pub bonus: Vec<StatDelta>,
}

/// Score of one gear category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Sum of the item values.
    pub points: u32,
    /// Best tier any item of the category reached.
    pub tier: Option<String>,
    pub threshold: Option<u32>,
    pub items: Vec<ItemGearPoint>,
}

impl CategoryScore {
    fn push(&mut self, item: ItemGearPoint) {
        self.points += item.points;
        if item.threshold > self.threshold {
            self.threshold = item.threshold;
            self.tier.clone_from(&item.tier);
        }
        self.items.push(item);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GearPointScore {
    pub armor: CategoryScore,
    pub accessory: CategoryScore,
    pub special: CategoryScore,
    pub total: u32,
}

impl GearPointScore {
    pub fn category(&self, category: GearCategory) -> &CategoryScore {
        match category {
            GearCategory::Armor => &self.armor,
            GearCategory::Accessory => &self.accessory,
            GearCategory::Special => &self.special,
        }
    }

    fn category_mut(&mut self, category: GearCategory) -> &mut CategoryScore {
        match category {
            GearCategory::Armor => &mut self.armor,
            GearCategory::Accessory => &mut self.accessory,
            GearCategory::Special => &mut self.special,
        }
    }

    /// Activated bonus stats, one block per item, tagged by category and tier.
    pub fn bonus_deltas(&self) -> Vec<StatDelta> {
        GearCategory::ALL
            .iter()
            .flat_map(|category| self.category(*category).items.iter().map(move |item| (category, item)))
            .flat_map(|(category, item)| {
                let tag = format!(
                    "Gear Point ({category:?}): {}",
                    item.tier.as_deref().unwrap_or_default()
                );
                item.bonus.iter().map(move |delta| delta.tagged(tag.as_str()))
            })
            .collect()
    }
}

/// Highest threshold at or below `points`.
fn reached(thresholds: &[GearPointThreshold], points: u32) -> Option<&GearPointThreshold> {
    thresholds.iter().rev().find(|t| t.threshold <= points)
}

/// Score the equipped items of a configuration.
///
/// Only validly equipped items count, the same ones the equipment source
/// reads.
pub fn score(config: &BuildConfiguration, catalog: &Catalog, settings: &EngineSettings) -> GearPointScore {
    let ctx = ResolveContext {
        config,
        catalog,
        settings,
    };
    let mut result = GearPointScore::default();
    for (slot, _, item) in equipped(&ctx) {
        let Some(category) = GearCategory::of_slot(slot) else {
            continue;
        };
        let threshold = reached(catalog.gear_thresholds(category), item.item_code);
        debug!(
            ?slot,
            item = %item.id,
            points = item.item_code,
            tier = ?threshold.map(|t| t.tier.as_str()),
            "gear points scored"
        );
        result.category_mut(category).push(ItemGearPoint {
            slot,
            item: item.id.clone(),
            points: item.item_code,
            tier: threshold.map(|t| t.tier.clone()),
            threshold: threshold.map(|t| t.threshold),
            bonus: threshold.map(|t| t.stats.clone()).unwrap_or_default(),
        });
    }
    result.total = result.armor.points + result.accessory.points + result.special.points;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RawCatalog;
    use crate::stat_key::StatKey;
    use serde_json::json;

    fn catalog() -> Catalog {
        let raw: RawCatalog = serde_json::from_value(json!({
            "armor": [
                { "id": "top", "slot": "top", "itemCode": 300 },
                { "id": "bottom", "slot": "bottom", "itemCode": 300 },
                { "id": "head", "slot": "head", "itemCode": 550 }
            ],
            "accessories": [
                { "id": "ring", "slot": "ring", "itemCode": 120 }
            ],
            "gearPoints": [
                { "category": "armor", "threshold": 600, "tier": "T2", "stats_str": 50 },
                { "category": "armor", "threshold": 300, "tier": "T1", "stats_str": 5 },
                { "category": "armor", "threshold": 500, "tier": "Rare", "stats_final_damage": 2 },
                { "category": "accessory", "threshold": 200, "tier": "Common", "stats_str": 10 }
            ]
        }))
        .unwrap();
        Catalog::load(&raw)
    }

    #[test]
    fn test_each_item_is_looked_up_on_its_own() {
        let catalog = catalog();
        let mut config = BuildConfiguration::default();
        config.equip(EquipSlot::Top, CatalogId::new("top"));
        config.equip(EquipSlot::Bottom, CatalogId::new("bottom"));

        let score = score(&config, &catalog, &EngineSettings::default());
        assert_eq!(score.armor.points, 600);
        assert_eq!(score.armor.items.len(), 2);
        assert!(score.armor.items.iter().all(|i| i.tier.as_deref() == Some("T1")));
        assert_eq!(score.armor.tier.as_deref(), Some("T1"));

        let bonus = score.bonus_deltas();
        assert_eq!(bonus.len(), 2);
        assert!(bonus.iter().all(|d| d.key == StatKey::Strength && d.amount == 5.0));
        assert_eq!(bonus[0].source, "Gear Point (Armor): T1");
    }

    #[test]
    fn test_highest_reached_threshold() {
        let catalog = catalog();
        let mut config = BuildConfiguration::default();
        config.equip(EquipSlot::Top, CatalogId::new("top"));
        config.equip(EquipSlot::Head, CatalogId::new("head"));
        config.equip(EquipSlot::Ring, CatalogId::new("ring"));

        let score = score(&config, &catalog, &EngineSettings::default());
        assert_eq!(score.armor.points, 850);
        assert_eq!(score.armor.tier.as_deref(), Some("Rare"));
        assert_eq!(score.armor.threshold, Some(500));
        assert_eq!(score.accessory.points, 120);
        assert_eq!(score.accessory.tier, None);
        assert_eq!(score.total, 970);

        let bonus = score.bonus_deltas();
        assert_eq!(bonus.len(), 2);
        assert!(bonus
            .iter()
            .any(|d| d.key == StatKey::FinalDamage && d.amount == 2.0 && d.source == "Gear Point (Armor): Rare"));
        assert!(bonus.iter().any(|d| d.key == StatKey::Strength && d.amount == 5.0));
    }

    #[test]
    fn test_zero_threshold_is_the_base_tier() {
        let raw: RawCatalog = serde_json::from_value(json!({
            "armor": [ { "id": "cap", "slot": "head", "itemCode": 50 } ],
            "gearPoints": [ { "category": "armor", "threshold": 0, "tier": "Base" } ]
        }))
        .unwrap();
        let catalog = Catalog::load(&raw);
        let mut config = BuildConfiguration::default();
        config.equip(EquipSlot::Head, CatalogId::new("cap"));

        let score = score(&config, &catalog, &EngineSettings::default());
        assert_eq!(score.armor.tier.as_deref(), Some("Base"));
        assert_eq!(score.armor.threshold, Some(0));
        assert!(score.bonus_deltas().is_empty());
    }

    #[test]
    fn test_empty_build_scores_zero() {
        let score = score(&BuildConfiguration::default(), &catalog(), &EngineSettings::default());
        assert_eq!(score.total, 0);
        assert!(score.bonus_deltas().is_empty());
    }
}
