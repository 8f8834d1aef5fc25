//! Evaluate example: a full build from catalog to damage report
//!
//! This example demonstrates:
//! - Loading a catalog from raw JSON tables
//! - Equipping items, emblems and skill levels
//! - Reading final stats with their provenance
//! - The three damage analyses
//!
//! Run with `RUST_LOG=buildcalc=debug` to see the engine's trace.

use buildcalc::build_config::{EmblemAssignment, SkillInvestment};
use buildcalc::*;
use tracing_subscriber::EnvFilter;

const CATALOG: &str = r#"{
    "weapons": [
        { "id": "dusk_gs", "name": "Dusk Greatsword", "weaponType": "greatsword",
          "statsPhysicalAttack": 8200, "stats_str": 120, "itemCode": 0 }
    ],
    "armor": [
        { "id": "ember_top", "name": "Ember Coat", "slot": "top", "itemCode": 320, "stats_str": 60 },
        { "id": "ember_bottom", "name": "Ember Greaves", "slot": "bottom", "itemCode": 320, "stats_str": 60 },
        { "id": "ember_head", "name": "Ember Helm", "slot": "head", "itemCode": 300, "stats_hp": 900 }
    ],
    "accessories": [
        { "id": "flame_ring", "name": "Flame Ring", "slot": "ring", "stats_fire_element": 45,
          "stats_crit_rate": 6, "skillLvLv30": 1 }
    ],
    "setBonuses": [
        { "prefix": "Ember", "name": "Ember Set", "pieces": 3, "stats_final_damage": 12 }
    ],
    "reinforcement": [
        { "category": "weapon", "level": 12, "stats_physical_attack": 640 }
    ],
    "emblems": [
        { "id": "red", "name": "Red Emblem", "color": "red", "level": 10, "stats_str": 25 }
    ],
    "gearPoints": [
        { "category": "armor", "threshold": 900, "tier": "Heroic", "statsAllElements": 12 }
    ],
    "skills": [
        { "id": "upper_slash", "name": "Upper Slash", "minLevel": 0, "maxLevel": 20, "spCost": 20,
          "tpCost": 1, "cooldown": 6, "baseDamageRate": 120, "damageRateGrowth": 5 },
        { "id": "flame_wave", "name": "Flame Wave", "startLevel": 30, "minLevel": 0, "maxLevel": 10,
          "spCost": 40, "cooldown": 15, "baseDamageRate": 900, "damageRateGrowth": 60, "element": "fire",
          "hitCount": 3 },
        { "id": "echo_blade", "name": "Echo Blade", "startLevel": 40, "minLevel": 0, "maxLevel": 5,
          "spCost": 60, "cooldown": 10, "baseDamageRate": 1,
          "mechanic": { "type": "copy_damage", "target": "flame_wave" } }
    ]
}"#;

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let engine = BuildEngine::new(Catalog::from_json(CATALOG)?);

    let mut config = BuildConfiguration::default();
    config.character.job_class = "berserker".into();
    config.character.level = 60;
    config.character.weapon_type = Some("greatsword".into());

    config.equip(EquipSlot::Weapon, CatalogId::new("dusk_gs"));
    config.equip(EquipSlot::Top, CatalogId::new("ember_top"));
    config.equip(EquipSlot::Bottom, CatalogId::new("ember_bottom"));
    config.equip(EquipSlot::Head, CatalogId::new("ember_head"));
    config.equip(EquipSlot::Ring, CatalogId::new("flame_ring"));
    if let Some(weapon) = config.equipment.get_mut(&EquipSlot::Weapon) {
        weapon.reinforcement = 12;
        weapon.emblems = vec![Some(EmblemAssignment {
            emblem: CatalogId::new("red"),
            level: 10,
            option: None,
        })];
    }

    for (skill, level, tp) in [("upper_slash", 15, 2), ("flame_wave", 8, 0), ("echo_blade", 3, 0)] {
        config.skills.set(
            SkillId::new(skill),
            SkillInvestment {
                level,
                technique_points: tp,
            },
        );
    }

    let report = engine.evaluate(&config);

    println!("=== Final Stats ===");
    for (key, value) in &report.stats.values {
        println!("{key}: {value:.1}");
        for delta in report.stats.sources_for(*key) {
            println!("    {:+.1}  {}", delta.amount, delta.source);
        }
    }
    println!(
        "Strongest element: {:?} ({:.1})",
        report.stats.elements.strongest(),
        report.stats.elements.value(report.stats.elements.strongest())
    );

    println!("\n=== Gear Points ===");
    println!(
        "Armor {} ({}), accessory {}, special {}",
        report.gear.armor.points,
        report.gear.armor.tier.as_deref().unwrap_or("-"),
        report.gear.accessory.points,
        report.gear.special.points
    );

    for analysis in [&report.theoretical, &report.practical, &report.potential] {
        println!("\n=== {:?} ({:.0} per minute) ===", analysis.mode, analysis.total);
        for row in &analysis.rows {
            println!(
                "{:<14} Lv{:<3} hit {:>12.0}  cast {:>12.0}  cd {:>5.2}s  {:>5.1}%{}",
                row.name,
                row.level,
                row.hit_damage,
                row.cast_damage,
                row.cooldown,
                row.share,
                row.note.as_deref().map(|n| format!("  ({n})")).unwrap_or_default()
            );
        }
    }

    println!("\n=== Skill Points ===");
    println!(
        "SP {} spent, {} left; TP {} spent, {} left",
        report.skill_tree.sp_spent,
        report.skill_tree.sp_remaining,
        report.skill_tree.tp_spent,
        report.skill_tree.tp_remaining
    );

    Ok(())
}
