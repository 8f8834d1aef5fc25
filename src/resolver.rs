//! Source resolver module.
//!
//! Provides the `SourceResolver` type, which runs every registered
//! [`StatSource`] over a configuration and concatenates their tagged
//! deltas in registration order.

use crate::delta::StatDelta;
use crate::source::{
    AvatarSource, CastleSealSource, ConsumableSource, EmblemSource, EnchantSource, EquipmentSource,
    MagicSealSource, PolishSource, ReinforcementSource, ResolveContext, RuneSource, SetBonusSource,
    SkillPassiveSource, StatSource, TrainingSource, TriggerSource,
};
use tracing::{instrument, trace};

/// Runs stat sources in registration order.
///
/// # Examples
///
/// ```rust
/// use buildcalc::catalog::Catalog;
/// use buildcalc::resolver::SourceResolver;
/// use buildcalc::settings::EngineSettings;
/// use buildcalc::source::ResolveContext;
/// use buildcalc::BuildConfiguration;
///
/// let catalog = Catalog::default();
/// let settings = EngineSettings::default();
/// let config = BuildConfiguration::default();
/// let ctx = ResolveContext { config: &config, catalog: &catalog, settings: &settings };
///
/// assert!(SourceResolver::new().resolve(&ctx).is_empty());
/// ```
pub struct SourceResolver {
    sources: Vec<Box<dyn StatSource>>,
}

impl SourceResolver {
    /// A resolver with every built-in source registered.
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        resolver.register_source(Box::new(EquipmentSource));
        resolver.register_source(Box::new(SetBonusSource));
        resolver.register_source(Box::new(ReinforcementSource));
        resolver.register_source(Box::new(PolishSource));
        resolver.register_source(Box::new(EnchantSource));
        resolver.register_source(Box::new(MagicSealSource));
        resolver.register_source(Box::new(CastleSealSource));
        resolver.register_source(Box::new(EmblemSource));
        resolver.register_source(Box::new(AvatarSource));
        resolver.register_source(Box::new(TrainingSource));
        resolver.register_source(Box::new(SkillPassiveSource));
        resolver.register_source(Box::new(RuneSource));
        resolver.register_source(Box::new(TriggerSource));
        resolver.register_source(Box::new(ConsumableSource));
        resolver
    }

    /// A resolver with no sources.
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register_source(&mut self, source: Box<dyn StatSource>) {
        self.sources.push(source);
    }

    /// Collect the tagged deltas of every source.
    #[instrument(skip_all)]
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Vec<StatDelta> {
        let mut deltas = Vec::new();
        for source in &self.sources {
            let before = deltas.len();
            source.collect(ctx, &mut deltas);
            trace!(source = source.name(), deltas = deltas.len() - before, "source collected");
        }
        deltas
    }
}

impl Default for SourceResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_config::BuildConfiguration;
    use crate::catalog::Catalog;
    use crate::settings::EngineSettings;
    use crate::stat_key::StatKey;

    struct Fixed(f64);

    impl StatSource for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn collect(&self, _ctx: &ResolveContext<'_>, out: &mut Vec<StatDelta>) {
            out.push(StatDelta::scalar(StatKey::Hp, self.0).tagged("Fixed"));
        }
    }

    #[test]
    fn test_sources_run_in_registration_order() {
        let catalog = Catalog::default();
        let settings = EngineSettings::default();
        let config = BuildConfiguration::default();
        let ctx = ResolveContext {
            config: &config,
            catalog: &catalog,
            settings: &settings,
        };

        let mut resolver = SourceResolver::empty();
        resolver.register_source(Box::new(Fixed(100.0)));
        resolver.register_source(Box::new(Fixed(50.0)));
        let deltas = resolver.resolve(&ctx);
        assert_eq!(
            deltas.iter().map(|d| d.amount).collect::<Vec<_>>(),
            vec![100.0, 50.0]
        );
    }
}
