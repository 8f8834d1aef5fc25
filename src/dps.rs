//! Damage and DPS analyzer.
//!
//! Turns final stats and skill investments into per-skill damage rows:
//!
//! ```text
//! hit  = (main_attack * rate(level) / 100 + flat(level)) * common * tech
//! cast = hit * hit_count            (then the skill's job mechanic)
//! dpm  = cast * 60 / max(cooldown * (1 - cdr / 100), min_interval)
//! ```
//!
//! `common` is the product of the [`DamageFormula`](crate::formula::DamageFormula)
//! groups and `tech` is `1 + tp * rate_per_tp / 100`.

use crate::aggregator::FinalStats;
use crate::build_config::BuildConfiguration;
use crate::catalog::{Catalog, SkillDefinition};
use crate::formula::TermInputs;
use crate::ids::SkillId;
use crate::mechanics::{MechanicContext, MechanicOutcome, MechanicRegistry};
use crate::settings::EngineSettings;
use crate::skill_tree::SkillTree;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Which skills an analysis includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Every unlocked, invested skill.
    Theoretical,
    /// The theoretical rotation cut to the skill-bar size.
    Practical,
    /// Every job skill at its level ceiling, ignoring investment.
    Potential,
}

/// One skill's line in an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDamageRow {
    pub skill: SkillId,
    pub name: String,
    /// Effective level, including bonus levels.
    pub level: u16,
    pub technique_points: u8,
    /// Damage rate (%) after skill damage bonuses.
    pub rate: f64,
    pub flat: f64,
    pub hit_damage: f64,
    /// Damage per cast after the job mechanic.
    pub cast_damage: f64,
    /// Cooldown after reduction, in seconds.
    pub cooldown: f64,
    pub casts_per_minute: f64,
    /// Damage per minute received from other skills' transfers.
    pub transfer_in: f64,
    pub damage_per_minute: f64,
    /// Percentage of the analysis total.
    pub share: f64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpsAnalysis {
    pub mode: AnalysisMode,
    /// Rows by damage per minute, highest first.
    pub rows: Vec<SkillDamageRow>,
    pub total: f64,
}

impl DpsAnalysis {
    pub fn row(&self, skill: &SkillId) -> Option<&SkillDamageRow> {
        self.rows.iter().find(|row| &row.skill == skill)
    }
}

/// A skill picked for analysis with the level and TP to read.
struct Pick<'a> {
    skill: &'a SkillDefinition,
    level: u16,
    technique_points: u8,
}

/// Computes damage tables for one catalog and settings pair.
pub struct DamageAnalyzer<'a> {
    catalog: &'a Catalog,
    settings: &'a EngineSettings,
    registry: &'a MechanicRegistry,
}

impl<'a> DamageAnalyzer<'a> {
    pub fn new(catalog: &'a Catalog, settings: &'a EngineSettings, registry: &'a MechanicRegistry) -> Self {
        Self {
            catalog,
            settings,
            registry,
        }
    }

    /// Analyze a build in one mode.
    #[instrument(skip_all, fields(mode = ?mode))]
    pub fn analyze(&self, config: &BuildConfiguration, stats: &FinalStats, mode: AnalysisMode) -> DpsAnalysis {
        let tree = SkillTree::new(self.catalog, self.settings, &config.character);
        let levels: BTreeMap<SkillId, u16> = tree
            .job_skills()
            .map(|skill| {
                let level = match mode {
                    AnalysisMode::Potential if tree.is_unlocked(skill) => tree.level_ceiling(skill),
                    AnalysisMode::Potential => 0,
                    _ => tree.readable_level(skill, &config.skills),
                };
                (skill.id.clone(), level)
            })
            .collect();

        let picks: Vec<Pick<'_>> = tree
            .job_skills()
            .filter(|skill| skill.is_offensive())
            .filter_map(|skill| {
                let level = levels.get(&skill.id).copied().unwrap_or(0);
                if level == 0 {
                    return None;
                }
                let technique_points = match mode {
                    AnalysisMode::Potential => 0,
                    _ => tree.readable_tp(skill, &config.skills),
                };
                Some(Pick {
                    skill,
                    level,
                    technique_points,
                })
            })
            .collect();

        let mut rows: Vec<SkillDamageRow> = picks
            .iter()
            .map(|pick| self.base_row(pick, config, stats))
            .collect();

        let own_damage: BTreeMap<SkillId, f64> = rows
            .iter()
            .map(|row| (row.skill.clone(), row.cast_damage))
            .collect();
        let ctx = MechanicContext {
            levels: &levels,
            own_damage: &own_damage,
            stacks: &config.mechanic_stacks,
        };
        let cyclic = MechanicRegistry::cyclic_skills(self.catalog);

        let mut transfers: Vec<(SkillId, SkillId, f64)> = Vec::new();
        for (row, pick) in rows.iter_mut().zip(&picks) {
            let outcome = if cyclic.contains(&row.skill) {
                warn!(skill = %row.skill, "mechanic on a cycle ignored");
                MechanicOutcome::unchanged(row.cast_damage)
            } else {
                self.registry
                    .apply(&config.character.job_class, pick.skill, row.cast_damage, &ctx)
            };
            row.cast_damage = outcome.final_damage;
            row.note = outcome.note;
            row.damage_per_minute = row.cast_damage * row.casts_per_minute;
            if let Some(target) = outcome.transfer_target {
                transfers.push((row.skill.clone(), target, outcome.transfer_damage * row.casts_per_minute));
            }
        }

        // The skill bar is filled before transfers, so a skill left off
        // the bar feeds nothing.
        if mode == AnalysisMode::Practical {
            sort_by_damage(&mut rows);
            rows.truncate(self.settings.skill_slot_limit);
        }

        for (from, to, amount) in transfers {
            if !rows.iter().any(|row| row.skill == from) {
                debug!(%from, %to, "transfer source not on the skill bar, dropped");
                continue;
            }
            match rows.iter_mut().find(|row| row.skill == to) {
                Some(row) => {
                    row.transfer_in += amount;
                    row.damage_per_minute += amount;
                }
                None => debug!(%from, %to, "transfer target not in analysis, dropped"),
            }
        }
        sort_by_damage(&mut rows);

        let total: f64 = rows.iter().map(|row| row.damage_per_minute).sum();
        for row in &mut rows {
            row.share = if total > 0.0 {
                row.damage_per_minute / total * 100.0
            } else {
                0.0
            };
        }
        debug!(skills = rows.len(), total, "analysis complete");
        DpsAnalysis { mode, rows, total }
    }

    /// Row with per-cast damage before the job mechanic.
    fn base_row(&self, pick: &Pick<'_>, config: &BuildConfiguration, stats: &FinalStats) -> SkillDamageRow {
        let skill = pick.skill;
        let attack_type = config.character.attack_type;

        let bonus_levels = stats.skill_levels.for_skill(skill).max(0.0).floor() as u16;
        let level = pick.level.saturating_add(bonus_levels).min(skill.limit_level.max(pick.level));

        let damage_bonus = 1.0 + stats.skill_damage.for_skill(skill) / 100.0;
        let rate = skill.rate(level) * damage_bonus;
        let flat = skill.flat(level) * damage_bonus;

        let divisor = if self.settings.stat_divisor > 0.0 {
            self.settings.stat_divisor
        } else {
            1.0
        };
        let main_attack = stats.main_attack(attack_type) * (1.0 + stats.main_stat(attack_type) / divisor);
        let common = self.settings.formula.common_factor(&TermInputs {
            stats,
            element: skill.element,
            options: &config.options,
            element_coefficient: self.settings.element_coefficient,
        });
        let rate_per_tp = skill.tp_damage_rate.unwrap_or(self.settings.tp_damage_rate);
        let tech = 1.0 + f64::from(pick.technique_points) * rate_per_tp / 100.0;

        let hit_damage = (main_attack * rate / 100.0 + flat) * common * tech;
        let cast_damage = hit_damage * f64::from(skill.hit_count.max(1));

        let reduction = stats
            .skill_cooldown
            .for_skill(skill)
            .clamp(0.0, self.settings.cooldown_cap());
        let cooldown = skill.cooldown * (1.0 - reduction / 100.0);
        let interval = cooldown.max(self.settings.min_cast_interval).max(f64::EPSILON);
        let casts_per_minute = SECONDS_PER_MINUTE / interval;

        SkillDamageRow {
            skill: skill.id.clone(),
            name: skill.name.clone(),
            level,
            technique_points: pick.technique_points,
            rate,
            flat,
            hit_damage,
            cast_damage,
            cooldown,
            casts_per_minute,
            transfer_in: 0.0,
            damage_per_minute: cast_damage * casts_per_minute,
            share: 0.0,
            note: None,
        }
    }
}

/// Highest damage per minute first, ties by skill id.
fn sort_by_damage(rows: &mut [SkillDamageRow]) {
    rows.sort_by(|a, b| {
        b.damage_per_minute
            .partial_cmp(&a.damage_per_minute)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.skill.cmp(&b.skill))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::build_config::SkillInvestment;
    use crate::catalog::RawCatalog;
    use crate::delta::StatDelta;
    use crate::stat_key::StatKey;
    use serde_json::json;

    fn catalog() -> Catalog {
        let raw: RawCatalog = serde_json::from_value(json!({
            "skills": [
                { "id": "slash", "name": "Upper Slash", "startLevel": 1, "minLevel": 0, "maxLevel": 20,
                  "spCost": 10, "tpCost": 1, "cooldown": 6, "baseDamageRate": 120, "damageRateGrowth": 5 },
                { "id": "quake", "name": "Quake", "startLevel": 30, "minLevel": 0, "maxLevel": 10,
                  "spCost": 40, "cooldown": 20, "baseDamageRate": 1000, "hitCount": 3 },
                { "id": "guard", "name": "Guard", "minLevel": 0, "maxLevel": 5 }
            ]
        }))
        .unwrap();
        Catalog::load(&raw)
    }

    fn config(slash: u16) -> BuildConfiguration {
        let mut config = BuildConfiguration::default();
        config.character.level = 60;
        config.skills.set(
            SkillId::new("slash"),
            SkillInvestment {
                level: slash,
                technique_points: 0,
            },
        );
        config
    }

    #[test]
    fn test_hit_damage_without_multipliers() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let registry = MechanicRegistry::with_defaults();
        let stats = aggregate(&[StatDelta::scalar(StatKey::PhysicalAttack, 10_000.0)]);

        let analysis = DamageAnalyzer::new(&catalog, &settings, &registry).analyze(
            &config(10),
            &stats,
            AnalysisMode::Theoretical,
        );
        let row = analysis.row(&SkillId::new("slash")).unwrap();
        assert_eq!(row.rate, 165.0);
        assert!((row.hit_damage - 16_500.0).abs() < 1e-6);
        assert!((row.casts_per_minute - 10.0).abs() < 1e-9);
        assert!(analysis.row(&SkillId::new("quake")).is_none());
        assert!(analysis.row(&SkillId::new("guard")).is_none());
    }

    #[test]
    fn test_potential_ignores_investment() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let registry = MechanicRegistry::with_defaults();
        let stats = aggregate(&[StatDelta::scalar(StatKey::PhysicalAttack, 1_000.0)]);

        let analysis = DamageAnalyzer::new(&catalog, &settings, &registry).analyze(
            &config(1),
            &stats,
            AnalysisMode::Potential,
        );
        assert_eq!(analysis.rows.len(), 2);
        assert_eq!(analysis.row(&SkillId::new("slash")).unwrap().level, 20);
        assert_eq!(analysis.row(&SkillId::new("quake")).unwrap().level, 10);
        let share: f64 = analysis.rows.iter().map(|r| r.share).sum();
        assert!((share - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_practical_keeps_top_n() {
        let catalog = catalog();
        let settings = EngineSettings {
            skill_slot_limit: 1,
            ..EngineSettings::default()
        };
        let registry = MechanicRegistry::with_defaults();
        let stats = aggregate(&[StatDelta::scalar(StatKey::PhysicalAttack, 1_000.0)]);
        let mut config = config(5);
        config.skills.set(
            SkillId::new("quake"),
            SkillInvestment {
                level: 5,
                technique_points: 0,
            },
        );

        let analyzer = DamageAnalyzer::new(&catalog, &settings, &registry);
        let theoretical = analyzer.analyze(&config, &stats, AnalysisMode::Theoretical);
        let practical = analyzer.analyze(&config, &stats, AnalysisMode::Practical);
        assert_eq!(theoretical.rows.len(), 2);
        assert_eq!(practical.rows.len(), 1);
        assert_eq!(practical.rows[0].skill, theoretical.rows[0].skill);
        assert_eq!(practical.rows[0].share, 100.0);
    }

    #[test]
    fn test_bonus_levels_capped_by_limit() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let registry = MechanicRegistry::with_defaults();
        let stats = aggregate(&[
            StatDelta::scalar(StatKey::PhysicalAttack, 1_000.0),
            StatDelta::level_map(StatKey::SkillLevel, 1, 5.0),
        ]);
        let analysis = DamageAnalyzer::new(&catalog, &settings, &registry).analyze(
            &config(18),
            &stats,
            AnalysisMode::Theoretical,
        );
        assert_eq!(analysis.row(&SkillId::new("slash")).unwrap().level, 20);
    }

    #[test]
    fn test_cooldown_reduction_capped() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let registry = MechanicRegistry::with_defaults();
        let stats = aggregate(&[
            StatDelta::scalar(StatKey::PhysicalAttack, 1_000.0),
            StatDelta::level_map(StatKey::SkillCooldown, 1, 40.0),
            StatDelta::exact(StatKey::SkillCooldown, "upper_slash", 40.0),
        ]);
        let analysis = DamageAnalyzer::new(&catalog, &settings, &registry).analyze(
            &config(10),
            &stats,
            AnalysisMode::Theoretical,
        );
        let row = analysis.row(&SkillId::new("slash")).unwrap();
        assert!((row.cooldown - 3.0).abs() < 1e-9);
    }
}
