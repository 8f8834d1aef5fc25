//! Damage formula table.
//!
//! The common damage factor is a product of groups. Each group combines
//! its terms by a [`StackRule`]: additive groups sum their percentages
//! before a single multiplication, multiplicative groups compound every
//! term. Which categories share a group is configuration, not code.

use crate::aggregator::FinalStats;
use crate::build_config::DamageOptions;
use crate::stat_key::{Element, StatKey};
use serde::{Deserialize, Serialize};

/// How terms inside one formula group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackRule {
    /// `1 + Σ terms / 100`
    Additive,
    /// `Π (1 + term / 100)`
    Multiplicative,
}

/// One percentage input of the damage formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaTerm {
    /// A percent stat read straight from the final stats.
    Stat(StatKey),
    /// The elemental strength of the skill's own element.
    SkillElement,
    /// Counter damage, only while the counter option is on.
    Counter,
    /// Back-attack damage, only while the back-attack option is on.
    BackAttack,
}

/// A named group of terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaGroup {
    pub name: String,
    pub rule: StackRule,
    pub terms: Vec<FormulaTerm>,
}

impl FormulaGroup {
    pub fn new(name: impl Into<String>, rule: StackRule, terms: Vec<FormulaTerm>) -> Self {
        Self {
            name: name.into(),
            rule,
            terms,
        }
    }

    fn single(name: &str, term: FormulaTerm) -> Self {
        Self::new(name, StackRule::Additive, vec![term])
    }
}

/// Inputs needed to evaluate formula terms for one skill.
#[derive(Debug, Clone, Copy)]
pub struct TermInputs<'a> {
    pub stats: &'a FinalStats,
    pub element: Option<Element>,
    pub options: &'a DamageOptions,
    /// Percent bonus per point of elemental strength.
    pub element_coefficient: f64,
}

impl TermInputs<'_> {
    /// Percentage value of a term.
    pub fn value(&self, term: FormulaTerm) -> f64 {
        match term {
            FormulaTerm::Stat(key) => self.stats.value(key),
            FormulaTerm::SkillElement => self
                .element
                .map(|e| self.stats.elements.value(e) * self.element_coefficient)
                .unwrap_or(0.0),
            FormulaTerm::Counter if self.options.counter => self.stats.value(StatKey::CounterDamage),
            FormulaTerm::BackAttack if self.options.back_attack => {
                self.stats.value(StatKey::BackAttackDamage)
            }
            FormulaTerm::Counter | FormulaTerm::BackAttack => 0.0,
        }
    }
}

/// The damage formula table.
///
/// # Examples
///
/// ```rust
/// use buildcalc::formula::DamageFormula;
///
/// let formula = DamageFormula::default();
/// assert!(formula.groups.iter().any(|g| g.name == "skill attack"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageFormula {
    pub groups: Vec<FormulaGroup>,
}

impl Default for DamageFormula {
    /// Every documented category multiplies against the others.
    fn default() -> Self {
        Self {
            groups: vec![
                FormulaGroup::single("damage increase", FormulaTerm::Stat(StatKey::DamageIncrease)),
                FormulaGroup::single("additional damage", FormulaTerm::Stat(StatKey::AdditionalDamage)),
                FormulaGroup::single(
                    "critical damage increase",
                    FormulaTerm::Stat(StatKey::CritDamageIncrease),
                ),
                FormulaGroup::single("final damage", FormulaTerm::Stat(StatKey::FinalDamage)),
                FormulaGroup::single("skill attack", FormulaTerm::Stat(StatKey::SkillAttack)),
                FormulaGroup::single("all-type damage", FormulaTerm::Stat(StatKey::AllTypeDamage)),
                FormulaGroup::single("element", FormulaTerm::SkillElement),
                FormulaGroup::single("counter", FormulaTerm::Counter),
                FormulaGroup::single("back attack", FormulaTerm::BackAttack),
            ],
        }
    }
}

impl DamageFormula {
    /// Factor of every group, in table order.
    pub fn breakdown(&self, inputs: &TermInputs<'_>) -> Vec<(String, f64)> {
        self.groups
            .iter()
            .map(|group| (group.name.clone(), group_factor(group, inputs)))
            .collect()
    }

    /// Product of all group factors.
    pub fn common_factor(&self, inputs: &TermInputs<'_>) -> f64 {
        self.groups
            .iter()
            .map(|group| group_factor(group, inputs))
            .product()
    }
}

fn group_factor(group: &FormulaGroup, inputs: &TermInputs<'_>) -> f64 {
    match group.rule {
        StackRule::Additive => {
            1.0 + group.terms.iter().map(|t| inputs.value(*t)).sum::<f64>() / 100.0
        }
        StackRule::Multiplicative => group
            .terms
            .iter()
            .map(|t| 1.0 + inputs.value(*t) / 100.0)
            .product(),
    }
}
