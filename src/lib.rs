//! # buildcalc - Deterministic Character Build Calculator
//!
//! A stat aggregation and damage estimation engine for RPG character
//! builds that provides:
//! - **Deterministic** evaluation (same snapshot → same report)
//! - **Catalog-driven** data (items, emblems and skills come from tables)
//! - **Provenance** for every stat (each delta remembers its source)
//! - **Pluggable** stat sources and job mechanics
//!
//! ## Core Concepts
//!
//! ### Evaluation Pipeline
//!
//! A build flows through a simple pipeline:
//!
//! ```text
//! [Catalog] + [BuildConfiguration]
//!     → [StatSource]s → [StatDelta]s → [FinalStats]
//!     → [DamageAnalyzer] + [MechanicRegistry] → [DpsAnalysis]
//! ```
//!
//! 1. **Catalog** normalizes raw tables once
//! 2. **Sources** turn each configured choice into tagged deltas
//! 3. **Aggregation** sums deltas into final stats with a breakdown
//! 4. **Analysis** computes per-skill damage in three modes
//!
//! The skill tree validator and the gear point scorer run alongside.
//!
//! ## Example
//!
//! ```rust
//! use buildcalc::catalog::Catalog;
//! use buildcalc::engine::BuildEngine;
//! use buildcalc::{BuildConfiguration, CatalogId, EquipSlot, SkillId, StatKey};
//! use buildcalc::build_config::SkillInvestment;
//!
//! let catalog = Catalog::from_json(r#"{
//!     "weapons": [ { "id": "blade", "name": "Dusk Blade", "stats_physical_attack": 10000 } ],
//!     "skills": [ { "id": "slash", "name": "Upper Slash", "maxLevel": 20, "spCost": 10,
//!                   "cooldown": 6, "baseDamageRate": 120, "damageRateGrowth": 5 } ]
//! }"#).unwrap();
//! let engine = BuildEngine::new(catalog);
//!
//! let mut config = BuildConfiguration::default();
//! config.character.level = 60;
//! config.equip(EquipSlot::Weapon, CatalogId::new("blade"));
//! config.skills.set(SkillId::new("slash"), SkillInvestment { level: 10, technique_points: 0 });
//!
//! let report = engine.evaluate(&config);
//! assert_eq!(report.stats.value(StatKey::PhysicalAttack), 10000.0);
//! let row = report.theoretical.row(&SkillId::new("slash")).unwrap();
//! assert_eq!(row.hit_damage, 16500.0);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Raw table loading and normalization
//! - [`build_config`] - The evaluated configuration snapshot
//! - [`source`] - Stat sources (one per configurable dimension)
//! - [`resolver`] - Runs the sources
//! - [`aggregator`] - Final stats with provenance
//! - [`gear_point`] - Gear point tiers
//! - [`mechanics`] - Job mechanic strategies
//! - [`graph`] - Mechanic reference graph
//! - [`skill_tree`] - Skill budgets and two-phase changes
//! - [`formula`] - Damage formula table
//! - [`dps`] - Damage analysis
//! - [`engine`] - Facade producing a [`BuildReport`]
//! - [`error`] - Error types

pub mod aggregator;
pub mod build_config;
pub mod catalog;
pub mod delta;
pub mod dps;
pub mod engine;
pub mod error;
pub mod formula;
pub mod gear_point;
pub mod graph;
pub mod ids;
pub mod mechanics;
pub mod resolver;
pub mod settings;
pub mod skill_tree;
pub mod source;
pub mod stat_key;

// Re-export main types for convenience
pub use aggregator::FinalStats;
pub use build_config::BuildConfiguration;
pub use catalog::{Catalog, EquipSlot};
pub use delta::{DeltaKind, StatDelta};
pub use dps::{AnalysisMode, DamageAnalyzer, DpsAnalysis};
pub use engine::{BuildEngine, BuildReport};
pub use error::EngineError;
pub use ids::{CatalogId, SkillId};
pub use mechanics::MechanicRegistry;
pub use settings::EngineSettings;
pub use source::StatSource;
pub use stat_key::{Element, StatKey};
