//! # Property-Based Tests
//!
//! Invariants that must hold for any input: provenance sums, the
//! highest-element rule, skill budgets and the cooldown reduction cap.

use buildcalc::aggregator::aggregate;
use buildcalc::build_config::{CharacterProfile, SkillInvestment, SkillInvestments};
use buildcalc::catalog::Catalog;
use buildcalc::settings::{EngineSettings, COOLDOWN_REDUCTION_CAP};
use buildcalc::skill_tree::{ChangeOutcome, SkillChange, SkillTree};
use buildcalc::{
    AnalysisMode, BuildConfiguration, DamageAnalyzer, Element, MechanicRegistry, SkillId, StatDelta,
    StatKey,
};
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

fn scalar_key() -> impl Strategy<Value = StatKey> {
    prop::sample::select(vec![
        StatKey::Strength,
        StatKey::Intelligence,
        StatKey::PhysicalAttack,
        StatKey::Hp,
        StatKey::CritRate,
        StatKey::FinalDamage,
        StatKey::Element(Element::Fire),
        StatKey::Element(Element::Shadow),
        StatKey::AllElements,
    ])
}

fn skill_change() -> impl Strategy<Value = SkillChange> {
    prop_oneof![
        any::<bool>().prop_map(|bulk| SkillChange::Raise { bulk }),
        any::<bool>().prop_map(|bulk| SkillChange::Lower { bulk }),
        any::<bool>().prop_map(|bulk| SkillChange::RaiseTechnique { bulk }),
        any::<bool>().prop_map(|bulk| SkillChange::LowerTechnique { bulk }),
        (0u16..25).prop_map(SkillChange::SetLevel),
    ]
}

fn skill_catalog() -> Catalog {
    Catalog::from_json(
        r#"{
            "skills": [
                { "id": "a", "minLevel": 1, "maxLevel": 20, "spCost": 15, "tpCost": 1 },
                { "id": "b", "startLevel": 20, "minLevel": 0, "maxLevel": 10, "spCost": 40, "tpCost": 3 },
                { "id": "c", "startLevel": 45, "minLevel": 0, "maxLevel": 5, "spCost": 60, "tpCost": 5 },
                { "id": "d", "minLevel": 1, "maxLevel": 1 }
            ]
        }"#,
    )
    .unwrap()
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Every scalar total equals the sum of its tagged contributions.
    #[test]
    fn provenance_sums_to_total(
        entries in vec((scalar_key(), -1000i32..1000), 0..60)
    ) {
        let deltas: Vec<StatDelta> = entries
            .iter()
            .enumerate()
            .map(|(i, (key, amount))| {
                StatDelta::scalar(*key, f64::from(*amount)).tagged(format!("source {i}"))
            })
            .collect();
        let stats = aggregate(&deltas);

        for (key, value) in &stats.values {
            let sum: f64 = stats.sources_for(*key).iter().map(|d| d.amount).sum();
            prop_assert!((sum - value).abs() < 1e-9);
        }
        let contributions: usize = stats.sources.values().map(Vec::len).sum();
        prop_assert_eq!(contributions, deltas.len());
    }

    /// The highest-element bonus lands on exactly one element: the first
    /// one in declaration order holding the maximum.
    #[test]
    fn highest_element_bonus_lands_once(
        values in vec(0i32..4, 4),
        bonus in 1i32..50
    ) {
        let mut deltas: Vec<StatDelta> = Element::ALL
            .iter()
            .zip(&values)
            .map(|(e, v)| StatDelta::scalar(StatKey::Element(*e), f64::from(*v * 10)))
            .collect();
        deltas.push(StatDelta::scalar(StatKey::HighestElement, f64::from(bonus)));
        let stats = aggregate(&deltas);

        let max = values.iter().copied().max().unwrap_or(0);
        let first = values.iter().position(|v| *v == max).unwrap_or(0);
        prop_assert_eq!(stats.elements.boosted, Some(Element::ALL[first]));

        let changed: Vec<usize> = (0..4)
            .filter(|i| stats.elements.display[*i] != stats.elements.base[*i])
            .collect();
        prop_assert_eq!(changed, vec![first]);
        prop_assert_eq!(
            stats.elements.display[first] - stats.elements.base[first],
            f64::from(bonus)
        );
    }

    /// No sequence of changes overspends a pool or leaves technique
    /// points on a skill at its minimum level.
    #[test]
    fn skill_changes_respect_budgets(
        level in 1u16..70,
        sp_pool in 0u32..600,
        tp_pool in 0u32..20,
        steps in vec((0usize..4, skill_change(), any::<bool>()), 1..40)
    ) {
        let catalog = skill_catalog();
        let settings = EngineSettings {
            skill_point_pool: sp_pool,
            technique_point_pool: tp_pool,
            ..EngineSettings::default()
        };
        let character = CharacterProfile { level, ..CharacterProfile::default() };
        let tree = SkillTree::new(&catalog, &settings, &character);
        let ids = ["a", "b", "c", "d"].map(SkillId::new);
        let mut skills = SkillInvestments::new();

        for (index, change, confirm) in steps {
            let id = &ids[index];
            let before = skills.clone();
            match tree.apply(&mut skills, id, change) {
                ChangeOutcome::ConfirmationRequired(pending) => {
                    prop_assert_eq!(&skills, &before);
                    if confirm {
                        prop_assert!(tree.commit(&mut skills, &pending).is_ok());
                    }
                }
                ChangeOutcome::Rejected(_) => {
                    prop_assert_eq!(&skills, &before);
                }
                ChangeOutcome::Applied(_) => {}
            }

            prop_assert!(tree.sp_spent(&skills) <= sp_pool);
            prop_assert!(tree.tp_spent(&skills) <= tp_pool);
            for (id, inv) in skills.iter() {
                let skill = catalog.skill(id).unwrap();
                prop_assert!(inv.level >= skill.min_level);
                prop_assert!(inv.level <= tree.level_ceiling(skill));
                if inv.technique_points > 0 {
                    prop_assert!(inv.level > skill.min_level);
                }
            }
        }
        prop_assert!(tree.validate(&skills).is_valid());
    }

    /// Cooldown reduction never exceeds the hard cap, whatever the stats
    /// and configured cap say.
    #[test]
    fn cooldown_reduction_is_capped(
        reductions in vec(0i32..80, 1..6),
        configured_cap in 0i32..100
    ) {
        let catalog = Catalog::from_json(
            r#"{ "skills": [ { "id": "slash", "name": "Upper Slash", "minLevel": 0, "maxLevel": 10,
                               "cooldown": 20, "baseDamageRate": 100 } ] }"#,
        )
        .unwrap();
        let settings = EngineSettings {
            cooldown_reduction_cap: f64::from(configured_cap),
            ..EngineSettings::default()
        };
        let registry = MechanicRegistry::with_defaults();
        let mut deltas = vec![StatDelta::scalar(StatKey::PhysicalAttack, 1000.0)];
        for (i, reduction) in reductions.iter().enumerate() {
            let delta = if i % 2 == 0 {
                StatDelta::level_map(StatKey::SkillCooldown, 1, f64::from(*reduction))
            } else {
                StatDelta::exact(StatKey::SkillCooldown, "upper_slash", f64::from(*reduction))
            };
            deltas.push(delta);
        }
        let stats = aggregate(&deltas);

        let mut config = BuildConfiguration::default();
        config.character.level = 60;
        config.skills.set(SkillId::new("slash"), SkillInvestment { level: 5, technique_points: 0 });

        let analysis = DamageAnalyzer::new(&catalog, &settings, &registry)
            .analyze(&config, &stats, AnalysisMode::Theoretical);
        let row = analysis.row(&SkillId::new("slash")).unwrap();
        let floor = 20.0 * (1.0 - COOLDOWN_REDUCTION_CAP / 100.0);
        prop_assert!(row.cooldown >= floor - 1e-9);
        prop_assert!(row.cooldown <= 20.0 + 1e-9);
    }
}
