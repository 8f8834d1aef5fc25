//! Job mechanics module.
//!
//! Some skills do not deal damage through their own coefficients: they
//! copy another skill, scale with stacks, gain a bonus from another
//! skill's level, or hand part of their damage to another skill. Each
//! behaviour is a [`JobMechanic`] strategy registered in a
//! [`MechanicRegistry`] under a job class (or for every job) and a
//! [`MechanicKind`]. The descriptor on the skill definition carries the
//! parameters.

use crate::catalog::{Catalog, SkillDefinition};
use crate::graph::SkillGraph;
use crate::ids::SkillId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Mechanic parameters attached to a skill definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MechanicDescriptor {
    /// Deal the target skill's own damage instead of this skill's.
    CopyDamage { target: SkillId },
    /// Damage times active stacks, nothing below the threshold.
    StackPassive {
        #[serde(default)]
        min: u32,
        max: u32,
        #[serde(default)]
        threshold: u32,
    },
    /// Percentage bonus per invested level of another skill.
    ConditionalBonus {
        source: SkillId,
        percent_per_level: f64,
        #[serde(default)]
        min_level: u16,
    },
    /// Earmark a share of this skill's damage for another skill.
    DamageTransfer { target: SkillId, percent: f64 },
}

impl MechanicDescriptor {
    pub fn kind(&self) -> MechanicKind {
        match self {
            MechanicDescriptor::CopyDamage { .. } => MechanicKind::CopyDamage,
            MechanicDescriptor::StackPassive { .. } => MechanicKind::StackPassive,
            MechanicDescriptor::ConditionalBonus { .. } => MechanicKind::ConditionalBonus,
            MechanicDescriptor::DamageTransfer { .. } => MechanicKind::DamageTransfer,
        }
    }

    /// The other skill whose damage this mechanic reads or feeds, if any.
    ///
    /// A conditional bonus only reads the source's level, so it never
    /// forms a damage cycle.
    pub fn damage_reference(&self) -> Option<&SkillId> {
        match self {
            MechanicDescriptor::CopyDamage { target } => Some(target),
            MechanicDescriptor::DamageTransfer { target, .. } => Some(target),
            MechanicDescriptor::ConditionalBonus { .. } | MechanicDescriptor::StackPassive { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanicKind {
    CopyDamage,
    StackPassive,
    ConditionalBonus,
    DamageTransfer,
}

/// Result of applying a mechanic to one skill's per-cast damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicOutcome {
    pub final_damage: f64,
    /// Damage moved to `transfer_target` in the DPS stage.
    pub transfer_damage: f64,
    pub transfer_target: Option<SkillId>,
    pub note: Option<String>,
}

impl MechanicOutcome {
    /// The damage passes through untouched.
    pub fn unchanged(damage: f64) -> Self {
        Self {
            final_damage: damage,
            transfer_damage: 0.0,
            transfer_target: None,
            note: None,
        }
    }

    fn noted(damage: f64, note: String) -> Self {
        Self {
            note: Some(note),
            ..Self::unchanged(damage)
        }
    }
}

/// What a mechanic may read about the rest of the build.
#[derive(Debug, Clone, Copy)]
pub struct MechanicContext<'a> {
    /// Readable level of every skill in the analysis.
    pub levels: &'a BTreeMap<SkillId, u16>,
    /// Per-cast damage of every skill before mechanics.
    pub own_damage: &'a BTreeMap<SkillId, f64>,
    /// Configured stack counts.
    pub stacks: &'a BTreeMap<SkillId, u32>,
}

impl MechanicContext<'_> {
    fn level(&self, skill: &SkillId) -> u16 {
        self.levels.get(skill).copied().unwrap_or(0)
    }
}

/// A job mechanic strategy.
pub trait JobMechanic: Send + Sync {
    fn kind(&self) -> MechanicKind;

    fn apply(
        &self,
        skill: &SkillDefinition,
        descriptor: &MechanicDescriptor,
        damage: f64,
        ctx: &MechanicContext<'_>,
    ) -> MechanicOutcome;

    fn description(&self) -> String {
        format!("{:?}", self.kind())
    }
}

/// Replace the skill's damage with the target's own damage.
///
/// The target is read one hop deep, before its own mechanic.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyDamage;

impl JobMechanic for CopyDamage {
    fn kind(&self) -> MechanicKind {
        MechanicKind::CopyDamage
    }

    fn apply(
        &self,
        _skill: &SkillDefinition,
        descriptor: &MechanicDescriptor,
        damage: f64,
        ctx: &MechanicContext<'_>,
    ) -> MechanicOutcome {
        let MechanicDescriptor::CopyDamage { target } = descriptor else {
            return MechanicOutcome::unchanged(damage);
        };
        let copied = ctx.own_damage.get(target).copied().unwrap_or(0.0);
        MechanicOutcome::noted(copied, format!("copies {target}"))
    }

    fn description(&self) -> String {
        "Copy another skill's damage".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StackPassive;

impl JobMechanic for StackPassive {
    fn kind(&self) -> MechanicKind {
        MechanicKind::StackPassive
    }

    fn apply(
        &self,
        skill: &SkillDefinition,
        descriptor: &MechanicDescriptor,
        damage: f64,
        ctx: &MechanicContext<'_>,
    ) -> MechanicOutcome {
        let MechanicDescriptor::StackPassive { min, max, threshold } = *descriptor else {
            return MechanicOutcome::unchanged(damage);
        };
        let stacks = ctx
            .stacks
            .get(&skill.id)
            .copied()
            .unwrap_or(max)
            .clamp(min, max.max(min));
        if stacks < threshold {
            return MechanicOutcome::noted(0.0, format!("{stacks} stacks, below {threshold}"));
        }
        MechanicOutcome::noted(damage * f64::from(stacks), format!("{stacks} stacks"))
    }

    fn description(&self) -> String {
        "Scale damage by active stacks".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalBonus;

impl JobMechanic for ConditionalBonus {
    fn kind(&self) -> MechanicKind {
        MechanicKind::ConditionalBonus
    }

    fn apply(
        &self,
        _skill: &SkillDefinition,
        descriptor: &MechanicDescriptor,
        damage: f64,
        ctx: &MechanicContext<'_>,
    ) -> MechanicOutcome {
        let MechanicDescriptor::ConditionalBonus {
            source,
            percent_per_level,
            min_level,
        } = descriptor
        else {
            return MechanicOutcome::unchanged(damage);
        };
        let level = ctx.level(source);
        if level == 0 || level < *min_level {
            return MechanicOutcome::unchanged(damage);
        }
        let bonus = percent_per_level * f64::from(level);
        MechanicOutcome::noted(
            damage * (1.0 + bonus / 100.0),
            format!("+{bonus}% from {source} Lv{level}"),
        )
    }

    fn description(&self) -> String {
        "Bonus from another skill's level".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DamageTransfer;

impl JobMechanic for DamageTransfer {
    fn kind(&self) -> MechanicKind {
        MechanicKind::DamageTransfer
    }

    fn apply(
        &self,
        _skill: &SkillDefinition,
        descriptor: &MechanicDescriptor,
        damage: f64,
        _ctx: &MechanicContext<'_>,
    ) -> MechanicOutcome {
        let MechanicDescriptor::DamageTransfer { target, percent } = descriptor else {
            return MechanicOutcome::unchanged(damage);
        };
        MechanicOutcome {
            final_damage: damage,
            transfer_damage: damage * percent / 100.0,
            transfer_target: Some(target.clone()),
            note: Some(format!("{percent}% to {target}")),
        }
    }

    fn description(&self) -> String {
        "Transfer damage to another skill".to_string()
    }
}

/// Strategies keyed by job class (or `None` for every job) and kind.
///
/// # Examples
///
/// ```rust
/// use buildcalc::mechanics::{MechanicKind, MechanicRegistry};
///
/// let registry = MechanicRegistry::with_defaults();
/// assert!(registry.lookup("berserker", MechanicKind::CopyDamage).is_some());
/// ```
pub struct MechanicRegistry {
    strategies: HashMap<(Option<String>, MechanicKind), Box<dyn JobMechanic>>,
}

impl MechanicRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// A registry with the built-in strategies available to every job.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(None, Box::new(CopyDamage));
        registry.register(None, Box::new(StackPassive));
        registry.register(None, Box::new(ConditionalBonus));
        registry.register(None, Box::new(DamageTransfer));
        registry
    }

    /// Register a strategy for one job class, or for every job with `None`.
    pub fn register(&mut self, job_class: Option<&str>, mechanic: Box<dyn JobMechanic>) {
        let key = (job_class.map(str::to_string), mechanic.kind());
        self.strategies.insert(key, mechanic);
    }

    /// Job-specific strategy first, then the shared one.
    pub fn lookup(&self, job_class: &str, kind: MechanicKind) -> Option<&dyn JobMechanic> {
        self.strategies
            .get(&(Some(job_class.to_string()), kind))
            .or_else(|| self.strategies.get(&(None, kind)))
            .map(Box::as_ref)
    }

    /// Apply the skill's mechanic, if it has one and a strategy exists.
    pub fn apply(
        &self,
        job_class: &str,
        skill: &SkillDefinition,
        damage: f64,
        ctx: &MechanicContext<'_>,
    ) -> MechanicOutcome {
        let Some(descriptor) = &skill.mechanic else {
            return MechanicOutcome::unchanged(damage);
        };
        match self.lookup(job_class, descriptor.kind()) {
            Some(mechanic) => {
                let outcome = mechanic.apply(skill, descriptor, damage, ctx);
                debug!(skill = %skill.id, mechanic = %mechanic.description(), damage = outcome.final_damage, "mechanic applied");
                outcome
            }
            None => {
                debug!(skill = %skill.id, kind = ?descriptor.kind(), "no strategy registered");
                MechanicOutcome::unchanged(damage)
            }
        }
    }

    /// Skills whose mechanic references lie on a cycle.
    pub fn cyclic_skills(catalog: &Catalog) -> BTreeSet<SkillId> {
        let mut graph = SkillGraph::new();
        for skill in catalog.skills.values() {
            if let Some(reference) = skill.mechanic.as_ref().and_then(MechanicDescriptor::damage_reference) {
                graph.add_edge(skill.id.clone(), reference.clone());
            }
        }
        if let Err(err) = graph.detect_cycles() {
            warn!(%err, "mechanics on a cycle are ignored");
        }
        graph.cyclic_skills()
    }
}

impl Default for MechanicRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
