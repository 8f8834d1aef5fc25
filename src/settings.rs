//! Engine settings.
//!
//! Tunable constants of the engine: resource pools, unlock offsets, the
//! practical skill-bar size and the damage formula table. Settings are
//! plain serde data so a caller can ship them next to the catalog.

use crate::error::EngineError;
use crate::formula::DamageFormula;
use serde::{Deserialize, Serialize};

/// Cooldown reduction never exceeds this percentage.
pub const COOLDOWN_REDUCTION_CAP: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub skill_point_pool: u32,
    pub technique_point_pool: u32,
    /// Levels subtracted from every unlock level under a master contract.
    pub master_contract_offset: u16,
    /// Skills kept by the practical rotation.
    pub skill_slot_limit: usize,
    /// Cooldown reduction cap in percent. Values above
    /// [`COOLDOWN_REDUCTION_CAP`] are clamped to it.
    pub cooldown_reduction_cap: f64,
    /// Shortest interval between casts, in seconds.
    pub min_cast_interval: f64,
    /// Main stat points per +100% attack.
    pub stat_divisor: f64,
    /// Percent damage per point of elemental strength.
    pub element_coefficient: f64,
    /// Default percent damage per technique point.
    pub tp_damage_rate: f64,
    pub formula: DamageFormula,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            skill_point_pool: 6_000,
            technique_point_pool: 30,
            master_contract_offset: 5,
            skill_slot_limit: 14,
            cooldown_reduction_cap: COOLDOWN_REDUCTION_CAP,
            min_cast_interval: 1.0,
            stat_divisor: 250.0,
            element_coefficient: 0.45,
            tp_damage_rate: 10.0,
            formula: DamageFormula::default(),
        }
    }
}

impl EngineSettings {
    /// The effective cooldown reduction cap.
    pub fn cooldown_cap(&self) -> f64 {
        self.cooldown_reduction_cap.clamp(0.0, COOLDOWN_REDUCTION_CAP)
    }

    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}
