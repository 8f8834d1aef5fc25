//! Skill tree validator.
//!
//! Enforces the unlock, ceiling and budget rules on skill investments.
//! Changes go through two phases: [`SkillTree::propose`] checks a change
//! against the current investments without mutating anything, and
//! [`SkillTree::commit`] re-checks and writes it. Changes that would
//! silently discard technique points come back as
//! [`Proposal::NeedsConfirmation`] and only take effect once committed.

use crate::build_config::{CharacterProfile, SkillInvestment, SkillInvestments, MAX_TECHNIQUE_POINTS};
use crate::catalog::{Catalog, SkillDefinition};
use crate::error::EngineError;
use crate::ids::SkillId;
use crate::settings::EngineSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A requested change to one skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillChange {
    /// One level up, or as many as affordable with `bulk`.
    Raise { bulk: bool },
    /// One level down, or straight to the minimum with `bulk`.
    Lower { bulk: bool },
    RaiseTechnique { bulk: bool },
    LowerTechnique { bulk: bool },
    SetLevel(u16),
}

/// A fully checked change, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    pub skill: SkillId,
    pub from: SkillInvestment,
    pub to: SkillInvestment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    Ready(PendingChange),
    /// The change clears technique points and needs the caller's consent.
    NeedsConfirmation(PendingChange),
    Rejected(EngineError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOutcome {
    Applied(SkillInvestment),
    ConfirmationRequired(PendingChange),
    Rejected(EngineError),
}

impl ChangeOutcome {
    /// Collapse the outcome for callers that never confirm.
    pub fn into_result(self) -> Result<SkillInvestment, EngineError> {
        match self {
            ChangeOutcome::Applied(investment) => Ok(investment),
            ChangeOutcome::ConfirmationRequired(pending) => {
                Err(EngineError::ConfirmationRequired(pending.skill))
            }
            ChangeOutcome::Rejected(err) => Err(err),
        }
    }
}

/// Budget and rule report for a set of investments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillTreeValidationResult {
    pub sp_spent: u32,
    pub sp_remaining: u32,
    pub tp_spent: u32,
    pub tp_remaining: u32,
    /// Level ceiling of every job skill.
    pub max_levels: BTreeMap<SkillId, u16>,
    /// Skills holding technique points at their minimum level; lowering
    /// them needs a confirmation that clears the points.
    pub pending_confirmations: Vec<SkillId>,
    #[serde(skip)]
    pub violations: Vec<EngineError>,
}

impl SkillTreeValidationResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty() && self.pending_confirmations.is_empty()
    }
}

/// Skill rules for one character.
///
/// # Examples
///
/// ```rust
/// use buildcalc::build_config::{CharacterProfile, SkillInvestments};
/// use buildcalc::catalog::Catalog;
/// use buildcalc::settings::EngineSettings;
/// use buildcalc::skill_tree::{ChangeOutcome, SkillChange, SkillTree};
/// use buildcalc::SkillId;
///
/// let catalog = Catalog::from_json(
///     r#"{ "skills": [ { "id": "slash", "maxLevel": 10, "spCost": 20 } ] }"#,
/// )
/// .unwrap();
/// let settings = EngineSettings::default();
/// let character = CharacterProfile { level: 50, ..CharacterProfile::default() };
/// let tree = SkillTree::new(&catalog, &settings, &character);
///
/// let mut skills = SkillInvestments::new();
/// let outcome = tree.apply(&mut skills, &SkillId::new("slash"), SkillChange::Raise { bulk: true });
/// assert!(matches!(outcome, ChangeOutcome::Applied(inv) if inv.level == 10));
/// assert_eq!(tree.sp_spent(&skills), 200);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SkillTree<'a> {
    catalog: &'a Catalog,
    settings: &'a EngineSettings,
    character: &'a CharacterProfile,
}

impl<'a> SkillTree<'a> {
    pub fn new(catalog: &'a Catalog, settings: &'a EngineSettings, character: &'a CharacterProfile) -> Self {
        Self {
            catalog,
            settings,
            character,
        }
    }

    /// Skills usable by the character's job.
    pub fn job_skills(&self) -> impl Iterator<Item = &'a SkillDefinition> + 'a {
        let catalog = self.catalog;
        let character = self.character;
        catalog.skills_for(&character.job_group, &character.job_class)
    }

    fn effective_start(&self, skill: &SkillDefinition) -> u16 {
        if self.character.master_contract {
            skill.start_level.saturating_sub(self.settings.master_contract_offset)
        } else {
            skill.start_level
        }
    }

    /// Whether the character can use the skill at all.
    pub fn is_unlocked(&self, skill: &SkillDefinition) -> bool {
        let weapon_ok = match &skill.required_weapon {
            Some(required) => self.character.weapon_type.as_ref() == Some(required),
            None => true,
        };
        weapon_ok
            && skill.available_to(&self.character.job_group, &self.character.job_class)
            && self.character.level >= self.effective_start(skill)
    }

    /// Highest level the character may invest, never below `min_level`.
    pub fn level_ceiling(&self, skill: &SkillDefinition) -> u16 {
        if !self.is_unlocked(skill) {
            return skill.min_level;
        }
        let reached = (self.character.level - self.effective_start(skill)) / skill.level_step.max(1) + 1;
        reached.min(skill.max_level).max(skill.min_level)
    }

    /// The level the damage and passive stages should read.
    ///
    /// Locked skills read as 0; binary skills read as 1 once unlocked.
    pub fn readable_level(&self, skill: &SkillDefinition, investments: &SkillInvestments) -> u16 {
        if !self.is_unlocked(skill) {
            return 0;
        }
        if skill.is_binary() {
            return 1;
        }
        let stored = investments.get_or(&skill.id, skill.min_level).level;
        stored.clamp(skill.min_level, self.level_ceiling(skill))
    }

    /// Technique points the damage stage should read.
    pub fn readable_tp(&self, skill: &SkillDefinition, investments: &SkillInvestments) -> u8 {
        if skill.tp_cost == 0 || self.readable_level(skill, investments) <= skill.min_level {
            return 0;
        }
        investments
            .get_or(&skill.id, skill.min_level)
            .technique_points
            .min(MAX_TECHNIQUE_POINTS)
    }

    fn sp_cost_of(skill: &SkillDefinition, investment: SkillInvestment) -> u32 {
        if skill.is_binary() {
            return 0;
        }
        u32::from(investment.level.saturating_sub(skill.min_level)) * skill.sp_cost
    }

    fn tp_cost_of(skill: &SkillDefinition, investment: SkillInvestment) -> u32 {
        u32::from(investment.technique_points) * skill.tp_cost
    }

    /// Skill points spent across every known skill.
    pub fn sp_spent(&self, investments: &SkillInvestments) -> u32 {
        investments
            .iter()
            .filter_map(|(id, inv)| self.catalog.skill(id).map(|s| Self::sp_cost_of(s, *inv)))
            .sum()
    }

    /// Technique points spent across every known skill.
    pub fn tp_spent(&self, investments: &SkillInvestments) -> u32 {
        investments
            .iter()
            .filter_map(|(id, inv)| self.catalog.skill(id).map(|s| Self::tp_cost_of(s, *inv)))
            .sum()
    }

    fn sp_remaining(&self, investments: &SkillInvestments) -> u32 {
        self.settings.skill_point_pool.saturating_sub(self.sp_spent(investments))
    }

    fn tp_remaining(&self, investments: &SkillInvestments) -> u32 {
        self.settings.technique_point_pool.saturating_sub(self.tp_spent(investments))
    }

    /// Check a change without mutating anything.
    pub fn propose(&self, investments: &SkillInvestments, skill_id: &SkillId, change: SkillChange) -> Proposal {
        let Some(skill) = self.catalog.skill(skill_id) else {
            return Proposal::Rejected(EngineError::InvalidSelection {
                category: "skill",
                id: skill_id.to_string(),
            });
        };
        let from = investments.get_or(skill_id, skill.min_level);
        match self.target(skill, investments, from, change) {
            Ok(to) => {
                let pending = PendingChange {
                    skill: skill_id.clone(),
                    from,
                    to,
                };
                if from.technique_points > 0 && to.technique_points == 0 && to.level <= skill.min_level {
                    Proposal::NeedsConfirmation(pending)
                } else {
                    Proposal::Ready(pending)
                }
            }
            Err(err) => Proposal::Rejected(err),
        }
    }

    fn target(
        &self,
        skill: &SkillDefinition,
        investments: &SkillInvestments,
        from: SkillInvestment,
        change: SkillChange,
    ) -> Result<SkillInvestment, EngineError> {
        let locked = |reason: &str| EngineError::SkillLocked {
            skill: skill.id.clone(),
            reason: reason.to_string(),
        };
        let sp_budget = |levels: u32| EngineError::BudgetExceeded {
            resource: "SP",
            required: levels * skill.sp_cost,
            remaining: self.sp_remaining(investments),
        };
        let ceiling = self.level_ceiling(skill);
        let sp_left = self.sp_remaining(investments);

        match change {
            SkillChange::Raise { bulk } => {
                if !self.is_unlocked(skill) {
                    return Err(locked("not unlocked"));
                }
                if skill.is_binary() || from.level >= ceiling {
                    return Err(locked("at level ceiling"));
                }
                let affordable = if skill.sp_cost == 0 {
                    u32::from(ceiling - from.level)
                } else {
                    sp_left / skill.sp_cost
                };
                if affordable == 0 {
                    return Err(sp_budget(1));
                }
                let step = if bulk { affordable.min(u32::from(ceiling - from.level)) } else { 1 };
                Ok(SkillInvestment {
                    level: from.level + step as u16,
                    ..from
                })
            }
            SkillChange::Lower { bulk } => {
                if from.level <= skill.min_level {
                    return Err(locked("already at minimum level"));
                }
                let level = if bulk { skill.min_level } else { from.level - 1 };
                let technique_points = if level <= skill.min_level { 0 } else { from.technique_points };
                Ok(SkillInvestment {
                    level,
                    technique_points,
                })
            }
            SkillChange::SetLevel(level) => {
                if level < skill.min_level || level > ceiling {
                    return Err(locked("level outside allowed range"));
                }
                if level > from.level {
                    let levels = u32::from(level - from.level);
                    if levels * skill.sp_cost > sp_left {
                        return Err(sp_budget(levels));
                    }
                }
                let technique_points = if level <= skill.min_level { 0 } else { from.technique_points };
                Ok(SkillInvestment {
                    level,
                    technique_points,
                })
            }
            SkillChange::RaiseTechnique { bulk } => {
                if skill.tp_cost == 0 {
                    return Err(locked("skill takes no technique points"));
                }
                if !self.is_unlocked(skill) {
                    return Err(locked("not unlocked"));
                }
                if from.technique_points >= MAX_TECHNIQUE_POINTS {
                    return Err(locked("technique points at maximum"));
                }
                let mut level = from.level;
                let mut sp_after = sp_left;
                if level <= skill.min_level {
                    // Technique points need at least one invested level.
                    if level + 1 > ceiling {
                        return Err(locked("at level ceiling"));
                    }
                    if skill.sp_cost > sp_left {
                        return Err(sp_budget(1));
                    }
                    level += 1;
                    sp_after -= skill.sp_cost;
                }
                debug!(skill = %skill.id, sp_after, "raising technique points");
                let tp_left = self.tp_remaining(investments);
                let affordable = tp_left / skill.tp_cost;
                if affordable == 0 {
                    return Err(EngineError::BudgetExceeded {
                        resource: "TP",
                        required: skill.tp_cost,
                        remaining: tp_left,
                    });
                }
                let room = u32::from(MAX_TECHNIQUE_POINTS - from.technique_points);
                let step = if bulk { affordable.min(room) } else { 1 };
                Ok(SkillInvestment {
                    level,
                    technique_points: from.technique_points + step as u8,
                })
            }
            SkillChange::LowerTechnique { bulk } => {
                if from.technique_points == 0 {
                    return Err(locked("no technique points to remove"));
                }
                let technique_points = if bulk { 0 } else { from.technique_points - 1 };
                Ok(SkillInvestment {
                    technique_points,
                    ..from
                })
            }
        }
    }

    /// Write a proposed change after re-checking it against the current
    /// investments.
    pub fn commit(&self, investments: &mut SkillInvestments, pending: &PendingChange) -> Result<SkillInvestment, EngineError> {
        let Some(skill) = self.catalog.skill(&pending.skill) else {
            return Err(EngineError::InvalidSelection {
                category: "skill",
                id: pending.skill.to_string(),
            });
        };
        let current = investments.get_or(&pending.skill, skill.min_level);
        if current != pending.from {
            return Err(EngineError::SkillLocked {
                skill: pending.skill.clone(),
                reason: "investment changed since the proposal".to_string(),
            });
        }
        let to = pending.to;
        if to.level > pending.from.level && to.level > self.level_ceiling(skill) {
            return Err(EngineError::SkillLocked {
                skill: pending.skill.clone(),
                reason: "at level ceiling".to_string(),
            });
        }
        if to.technique_points > 0 && to.level <= skill.min_level {
            return Err(EngineError::SkillLocked {
                skill: pending.skill.clone(),
                reason: "technique points need an invested level".to_string(),
            });
        }

        let sp_before = Self::sp_cost_of(skill, current);
        let sp_after = Self::sp_cost_of(skill, to);
        if sp_after > sp_before {
            let remaining = self.sp_remaining(investments);
            if sp_after - sp_before > remaining {
                return Err(EngineError::BudgetExceeded {
                    resource: "SP",
                    required: sp_after - sp_before,
                    remaining,
                });
            }
        }
        let tp_before = Self::tp_cost_of(skill, current);
        let tp_after = Self::tp_cost_of(skill, to);
        if tp_after > tp_before {
            let remaining = self.tp_remaining(investments);
            if tp_after - tp_before > remaining {
                return Err(EngineError::BudgetExceeded {
                    resource: "TP",
                    required: tp_after - tp_before,
                    remaining,
                });
            }
        }

        investments.set(pending.skill.clone(), to);
        debug!(skill = %pending.skill, level = to.level, tp = to.technique_points, "skill change committed");
        Ok(to)
    }

    /// Propose and, if no confirmation is needed, commit in one step.
    pub fn apply(&self, investments: &mut SkillInvestments, skill_id: &SkillId, change: SkillChange) -> ChangeOutcome {
        match self.propose(investments, skill_id, change) {
            Proposal::Ready(pending) => match self.commit(investments, &pending) {
                Ok(investment) => ChangeOutcome::Applied(investment),
                Err(err) => {
                    debug!(skill = %skill_id, %err, "skill change rejected");
                    ChangeOutcome::Rejected(err)
                }
            },
            Proposal::NeedsConfirmation(pending) => ChangeOutcome::ConfirmationRequired(pending),
            Proposal::Rejected(err) => {
                debug!(skill = %skill_id, %err, "skill change rejected");
                ChangeOutcome::Rejected(err)
            }
        }
    }

    /// Report budgets, ceilings and rule violations.
    pub fn validate(&self, investments: &SkillInvestments) -> SkillTreeValidationResult {
        let sp_spent = self.sp_spent(investments);
        let tp_spent = self.tp_spent(investments);
        let mut result = SkillTreeValidationResult {
            sp_spent,
            sp_remaining: self.settings.skill_point_pool.saturating_sub(sp_spent),
            tp_spent,
            tp_remaining: self.settings.technique_point_pool.saturating_sub(tp_spent),
            max_levels: self
                .job_skills()
                .map(|skill| (skill.id.clone(), self.level_ceiling(skill)))
                .collect(),
            ..SkillTreeValidationResult::default()
        };

        if sp_spent > self.settings.skill_point_pool {
            result.violations.push(EngineError::BudgetExceeded {
                resource: "SP",
                required: sp_spent,
                remaining: self.settings.skill_point_pool,
            });
        }
        if tp_spent > self.settings.technique_point_pool {
            result.violations.push(EngineError::BudgetExceeded {
                resource: "TP",
                required: tp_spent,
                remaining: self.settings.technique_point_pool,
            });
        }

        for (id, inv) in investments.iter() {
            let Some(skill) = self.catalog.skill(id) else {
                result.violations.push(EngineError::InvalidSelection {
                    category: "skill",
                    id: id.to_string(),
                });
                continue;
            };
            let locked = |reason: &str| EngineError::SkillLocked {
                skill: id.clone(),
                reason: reason.to_string(),
            };
            if inv.level > skill.min_level && inv.level > self.level_ceiling(skill) {
                result.violations.push(locked("level above ceiling"));
            }
            if inv.level < skill.min_level {
                result.violations.push(locked("level below minimum"));
            }
            if inv.technique_points > MAX_TECHNIQUE_POINTS {
                result.violations.push(locked("technique points above maximum"));
            }
            if inv.technique_points > 0 && skill.tp_cost == 0 {
                result.violations.push(locked("skill takes no technique points"));
            }
            if inv.technique_points > 0 && inv.level <= skill.min_level {
                result.pending_confirmations.push(id.clone());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RawCatalog;
    use serde_json::json;

    fn catalog() -> Catalog {
        let raw: RawCatalog = serde_json::from_value(json!({
            "skills": [
                { "id": "slash", "startLevel": 1, "minLevel": 1, "maxLevel": 20, "spCost": 10, "tpCost": 1 },
                { "id": "burst", "startLevel": 30, "levelStep": 2, "minLevel": 0, "maxLevel": 10, "spCost": 50, "tpCost": 3 },
                { "id": "awaken", "startLevel": 50, "minLevel": 1, "maxLevel": 1 },
                { "id": "mastery", "minLevel": 0, "maxLevel": 5, "spCost": 10, "requiredWeapon": "greatsword" }
            ]
        }))
        .unwrap();
        Catalog::load(&raw)
    }

    fn character(level: u16) -> CharacterProfile {
        CharacterProfile {
            level,
            ..CharacterProfile::default()
        }
    }

    #[test]
    fn test_level_ceiling() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let burst = catalog.skill(&SkillId::new("burst")).unwrap();

        let low = character(20);
        assert_eq!(SkillTree::new(&catalog, &settings, &low).level_ceiling(burst), 0);

        let mid = character(35);
        assert_eq!(SkillTree::new(&catalog, &settings, &mid).level_ceiling(burst), 3);

        let high = character(99);
        assert_eq!(SkillTree::new(&catalog, &settings, &high).level_ceiling(burst), 10);
    }

    #[test]
    fn test_master_contract_lowers_unlock() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let burst = catalog.skill(&SkillId::new("burst")).unwrap();
        let mut profile = character(26);
        assert!(!SkillTree::new(&catalog, &settings, &profile).is_unlocked(burst));
        profile.master_contract = true;
        let tree = SkillTree::new(&catalog, &settings, &profile);
        assert!(tree.is_unlocked(burst));
        assert_eq!(tree.level_ceiling(burst), 1);
    }

    #[test]
    fn test_binary_skill_is_free() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let profile = character(60);
        let tree = SkillTree::new(&catalog, &settings, &profile);
        let awaken = catalog.skill(&SkillId::new("awaken")).unwrap();
        let skills = SkillInvestments::new();
        assert_eq!(tree.readable_level(awaken, &skills), 1);
        assert_eq!(tree.sp_spent(&skills), 0);
        assert!(matches!(
            tree.propose(&skills, &awaken.id, SkillChange::Raise { bulk: false }),
            Proposal::Rejected(EngineError::SkillLocked { .. })
        ));
    }

    #[test]
    fn test_raise_beyond_budget_is_rejected() {
        let catalog = catalog();
        let settings = EngineSettings {
            skill_point_pool: 25,
            ..EngineSettings::default()
        };
        let profile = character(60);
        let tree = SkillTree::new(&catalog, &settings, &profile);
        let slash = SkillId::new("slash");
        let mut skills = SkillInvestments::new();

        let outcome = tree.apply(&mut skills, &slash, SkillChange::Raise { bulk: true });
        assert_eq!(
            outcome,
            ChangeOutcome::Applied(SkillInvestment {
                level: 3,
                technique_points: 0
            })
        );
        let outcome = tree.apply(&mut skills, &slash, SkillChange::Raise { bulk: false });
        assert!(matches!(
            outcome,
            ChangeOutcome::Rejected(EngineError::BudgetExceeded { resource: "SP", .. })
        ));
        assert_eq!(skills.get(&slash).unwrap().level, 3);
    }

    #[test]
    fn test_technique_auto_raises_level() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let profile = character(60);
        let tree = SkillTree::new(&catalog, &settings, &profile);
        let slash = SkillId::new("slash");
        let mut skills = SkillInvestments::new();

        let outcome = tree.apply(&mut skills, &slash, SkillChange::RaiseTechnique { bulk: false });
        assert_eq!(
            outcome,
            ChangeOutcome::Applied(SkillInvestment {
                level: 2,
                technique_points: 1
            })
        );
        assert_eq!(tree.sp_spent(&skills), 10);
        assert_eq!(tree.tp_spent(&skills), 1);
    }

    #[test]
    fn test_technique_auto_raise_needs_sp() {
        let catalog = catalog();
        let settings = EngineSettings {
            skill_point_pool: 5,
            ..EngineSettings::default()
        };
        let profile = character(60);
        let tree = SkillTree::new(&catalog, &settings, &profile);
        let mut skills = SkillInvestments::new();
        let outcome = tree.apply(&mut skills, &SkillId::new("slash"), SkillChange::RaiseTechnique { bulk: false });
        assert!(matches!(
            outcome,
            ChangeOutcome::Rejected(EngineError::BudgetExceeded { resource: "SP", .. })
        ));
        assert!(skills.get(&SkillId::new("slash")).is_none());
    }

    #[test]
    fn test_lower_to_min_with_tp_needs_confirmation() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let profile = character(60);
        let tree = SkillTree::new(&catalog, &settings, &profile);
        let slash = SkillId::new("slash");
        let mut skills = SkillInvestments::new();
        skills.set(
            slash.clone(),
            SkillInvestment {
                level: 5,
                technique_points: 2,
            },
        );
        let before = skills.clone();

        let outcome = tree.apply(&mut skills, &slash, SkillChange::Lower { bulk: true });
        let ChangeOutcome::ConfirmationRequired(pending) = outcome else {
            panic!("expected confirmation, got {outcome:?}");
        };
        assert_eq!(skills, before);
        assert_eq!(
            pending.to,
            SkillInvestment {
                level: 1,
                technique_points: 0
            }
        );

        tree.commit(&mut skills, &pending).unwrap();
        assert_eq!(skills.get(&slash).unwrap(), pending.to);
    }

    #[test]
    fn test_unconfirmed_outcome_as_error() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let profile = character(60);
        let tree = SkillTree::new(&catalog, &settings, &profile);
        let slash = SkillId::new("slash");
        let mut skills = SkillInvestments::new();
        skills.set(
            slash.clone(),
            SkillInvestment {
                level: 2,
                technique_points: 1,
            },
        );
        let result = tree
            .apply(&mut skills, &slash, SkillChange::Lower { bulk: false })
            .into_result();
        assert_eq!(result, Err(EngineError::ConfirmationRequired(slash.clone())));
        assert_eq!(skills.get(&slash).unwrap().technique_points, 1);
    }

    #[test]
    fn test_stale_commit_is_rejected() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let profile = character(60);
        let tree = SkillTree::new(&catalog, &settings, &profile);
        let slash = SkillId::new("slash");
        let mut skills = SkillInvestments::new();
        let Proposal::Ready(pending) = tree.propose(&skills, &slash, SkillChange::Raise { bulk: false }) else {
            panic!("expected ready proposal");
        };
        tree.apply(&mut skills, &slash, SkillChange::Raise { bulk: false });
        assert!(tree.commit(&mut skills, &pending).is_err());
    }

    #[test]
    fn test_weapon_skill_needs_weapon_type() {
        let catalog = catalog();
        let settings = EngineSettings::default();
        let mut profile = character(60);
        let mastery = catalog.skill(&SkillId::new("mastery")).unwrap();
        assert!(!SkillTree::new(&catalog, &settings, &profile).is_unlocked(mastery));
        profile.weapon_type = Some("greatsword".into());
        assert!(SkillTree::new(&catalog, &settings, &profile).is_unlocked(mastery));
    }

    #[test]
    fn test_validate_reports_violations() {
        let catalog = catalog();
        let settings = EngineSettings {
            skill_point_pool: 100,
            ..EngineSettings::default()
        };
        let profile = character(35);
        let tree = SkillTree::new(&catalog, &settings, &profile);
        let mut skills = SkillInvestments::new();
        skills.set(
            SkillId::new("burst"),
            SkillInvestment {
                level: 8,
                technique_points: 0,
            },
        );
        skills.set(
            SkillId::new("slash"),
            SkillInvestment {
                level: 1,
                technique_points: 1,
            },
        );
        let report = tree.validate(&skills);
        assert_eq!(report.sp_spent, 400);
        assert_eq!(report.sp_remaining, 0);
        assert_eq!(report.max_levels[&SkillId::new("burst")], 3);
        assert_eq!(report.pending_confirmations, vec![SkillId::new("slash")]);
        assert!(!report.is_valid());
        assert!(report
            .violations
            .iter()
            .any(|v| matches!(v, EngineError::BudgetExceeded { resource: "SP", .. })));
        assert!(report
            .violations
            .iter()
            .any(|v| matches!(v, EngineError::SkillLocked { .. })));
    }
}
