//! Skill tree example: budgets and the confirm-before-clearing flow
//!
//! This example shows:
//! - Raising skills until the skill point pool runs out
//! - Technique points raising a skill off its minimum level
//! - Lowering a skill that holds technique points

use buildcalc::build_config::{CharacterProfile, SkillInvestments};
use buildcalc::skill_tree::{ChangeOutcome, SkillChange, SkillTree};
use buildcalc::*;

fn main() -> Result<(), EngineError> {
    let catalog = Catalog::from_json(
        r#"{
            "skills": [
                { "id": "slash", "name": "Upper Slash", "minLevel": 0, "maxLevel": 20, "spCost": 30, "tpCost": 2 },
                { "id": "quake", "name": "Quake", "startLevel": 30, "minLevel": 0, "maxLevel": 10, "spCost": 80, "tpCost": 3 }
            ]
        }"#,
    )?;
    let settings = EngineSettings {
        skill_point_pool: 500,
        technique_point_pool: 10,
        ..EngineSettings::default()
    };
    let character = CharacterProfile {
        level: 40,
        ..CharacterProfile::default()
    };
    let tree = SkillTree::new(&catalog, &settings, &character);
    let mut skills = SkillInvestments::new();
    let slash = SkillId::new("slash");
    let quake = SkillId::new("quake");

    println!("=== Raising skills ===\n");
    let outcome = tree.apply(&mut skills, &quake, SkillChange::Raise { bulk: true });
    println!("Quake bulk raise: {outcome:?}");
    let outcome = tree.apply(&mut skills, &slash, SkillChange::Raise { bulk: true });
    println!("Upper Slash bulk raise: {outcome:?}");
    let outcome = tree.apply(&mut skills, &slash, SkillChange::Raise { bulk: false });
    println!("Upper Slash one more: {outcome:?}");
    println!("SP spent: {} / {}", tree.sp_spent(&skills), settings.skill_point_pool);

    println!("\n=== Technique points ===\n");
    let outcome = tree.apply(&mut skills, &slash, SkillChange::RaiseTechnique { bulk: true });
    println!("Upper Slash TP: {outcome:?}");
    println!("TP spent: {} / {}", tree.tp_spent(&skills), settings.technique_point_pool);

    println!("\n=== Lowering to the minimum ===\n");
    match tree.apply(&mut skills, &slash, SkillChange::Lower { bulk: true }) {
        ChangeOutcome::ConfirmationRequired(pending) => {
            println!("Needs confirmation: {:?} -> {:?}", pending.from, pending.to);
            let committed = tree.commit(&mut skills, &pending)?;
            println!("Confirmed: {committed:?}");
        }
        other => println!("Unexpected: {other:?}"),
    }

    let report = tree.validate(&skills);
    println!("\nValid: {}", report.is_valid());
    println!("Ceilings: {:?}", report.max_levels);

    Ok(())
}
