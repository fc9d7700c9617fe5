//! Core engine: formulas, XP curves, stats, skills and model validation

pub mod dependencies;
pub mod formula;
pub mod report;
pub mod skills;
pub mod stats;
pub mod xp_curve;

pub use dependencies::StatDependencyGraph;
pub use report::{validate_model, ModelReport};
pub use skills::{validate_skill_formulas, SkillFormulaKind, SkillFormulaReport};
pub use stats::{find_dependent_stats, validate_stat_formula};
pub use xp_curve::{generate_previews, validate_curve, xp_for_level};
