//! Error types for the build engine.
//!
//! No condition in the engine is fatal. Data and selection errors are
//! recovered where they occur (the contribution is treated as absent and
//! the error is logged); budget and confirmation conditions are returned
//! to the caller as result variants.

use crate::ids::SkillId;
use thiserror::Error;

/// Format a cycle path as a readable string.
fn format_cycle_path(path: &[SkillId]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors surfaced by the engine.
///
/// # Examples
///
/// ```rust
/// use buildcalc::EngineError;
///
/// let err = EngineError::InvalidSelection {
///     category: "enchant",
///     id: "missing_id".into(),
/// };
/// assert!(err.to_string().contains("missing_id"));
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// A catalog row or column could not be interpreted.
    #[error("Malformed catalog data in {table}: {detail}")]
    Data { table: String, detail: String },

    /// The configuration references an id the catalog does not contain,
    /// or a selection that is not valid for its slot.
    #[error("Invalid {category} selection: {id}")]
    InvalidSelection { category: &'static str, id: String },

    /// A skill or technique point change would exceed its pool.
    #[error("{resource} budget exceeded: need {required}, {remaining} remaining")]
    BudgetExceeded {
        resource: &'static str,
        required: u32,
        remaining: u32,
    },

    /// Lowering the skill would clear its technique points.
    #[error("Lowering {0} to its minimum level clears its technique points")]
    ConfirmationRequired(SkillId),

    /// A skill change that is not allowed by the skill's unlock rules.
    #[error("Skill {skill} cannot change: {reason}")]
    SkillLocked { skill: SkillId, reason: String },

    /// Job mechanics reference each other in a loop.
    #[error("Mechanic cycle detected: {}", format_cycle_path(.path))]
    MechanicCycle { path: Vec<SkillId> },

    /// A whole document (catalog or settings) is not valid JSON.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::InvalidDocument(err.to_string())
    }
}
