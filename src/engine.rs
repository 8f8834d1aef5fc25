//! Build engine facade.
//!
//! `BuildEngine` owns the catalog, settings, stat sources and mechanic
//! strategies, and evaluates configuration snapshots into a
//! [`BuildReport`]. Evaluation is a pure function of the snapshot; the
//! engine holds no per-run state and can be shared across threads.

use crate::aggregator::{aggregate, FinalStats};
use crate::build_config::BuildConfiguration;
use crate::catalog::Catalog;
use crate::dps::{AnalysisMode, DamageAnalyzer, DpsAnalysis};
use crate::gear_point::{self, GearPointScore};
use crate::mechanics::MechanicRegistry;
use crate::resolver::SourceResolver;
use crate::settings::EngineSettings;
use crate::skill_tree::{SkillTree, SkillTreeValidationResult};
use crate::source::{ResolveContext, StatSource};
use serde::Serialize;
use tracing::{debug, instrument};

/// Everything computed for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub stats: FinalStats,
    pub gear: GearPointScore,
    pub theoretical: DpsAnalysis,
    pub practical: DpsAnalysis,
    pub potential: DpsAnalysis,
    pub skill_tree: SkillTreeValidationResult,
}

/// The build evaluation engine.
///
/// # Examples
///
/// ```rust
/// use buildcalc::catalog::Catalog;
/// use buildcalc::engine::BuildEngine;
/// use buildcalc::{BuildConfiguration, CatalogId, EquipSlot, StatKey};
///
/// let catalog = Catalog::from_json(r#"{
///     "weapons": [ { "id": "blade", "name": "Dusk Blade", "stats_physical_attack": 1200 } ]
/// }"#).unwrap();
/// let engine = BuildEngine::new(catalog);
///
/// let mut config = BuildConfiguration::default();
/// config.equip(EquipSlot::Weapon, CatalogId::new("blade"));
///
/// let report = engine.evaluate(&config);
/// assert_eq!(report.stats.value(StatKey::PhysicalAttack), 1200.0);
/// ```
pub struct BuildEngine {
    catalog: Catalog,
    settings: EngineSettings,
    resolver: SourceResolver,
    registry: MechanicRegistry,
}

impl BuildEngine {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_settings(catalog, EngineSettings::default())
    }

    pub fn with_settings(catalog: Catalog, settings: EngineSettings) -> Self {
        Self {
            catalog,
            settings,
            resolver: SourceResolver::new(),
            registry: MechanicRegistry::with_defaults(),
        }
    }

    /// Replace the mechanic strategies.
    pub fn with_registry(mut self, registry: MechanicRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register an additional stat source.
    pub fn register_source(&mut self, source: Box<dyn StatSource>) {
        self.resolver.register_source(source);
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// A skill tree for a configuration's character.
    pub fn skill_tree<'a>(&'a self, config: &'a BuildConfiguration) -> SkillTree<'a> {
        SkillTree::new(&self.catalog, &self.settings, &config.character)
    }

    /// Resolve and aggregate final stats, including gear point bonuses.
    pub fn final_stats(&self, config: &BuildConfiguration) -> (FinalStats, GearPointScore) {
        let ctx = ResolveContext {
            config,
            catalog: &self.catalog,
            settings: &self.settings,
        };
        let mut deltas = self.resolver.resolve(&ctx);
        let gear = gear_point::score(config, &self.catalog, &self.settings);
        deltas.extend(gear.bonus_deltas());
        (aggregate(&deltas), gear)
    }

    /// Evaluate a configuration snapshot.
    #[instrument(skip_all, fields(job = %config.character.job_class, level = config.character.level))]
    pub fn evaluate(&self, config: &BuildConfiguration) -> BuildReport {
        let (stats, gear) = self.final_stats(config);
        let analyzer = DamageAnalyzer::new(&self.catalog, &self.settings, &self.registry);
        let theoretical = analyzer.analyze(config, &stats, AnalysisMode::Theoretical);
        let practical = analyzer.analyze(config, &stats, AnalysisMode::Practical);
        let potential = analyzer.analyze(config, &stats, AnalysisMode::Potential);
        let skill_tree = self.skill_tree(config).validate(&config.skills);
        debug!(
            total = theoretical.total,
            gear_points = gear.total,
            sp_remaining = skill_tree.sp_remaining,
            "build evaluated"
        );
        BuildReport {
            stats,
            gear,
            theoretical,
            practical,
            potential,
            skill_tree,
        }
    }
}
