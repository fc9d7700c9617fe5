//! Whole-model validation
//!
//! Runs every formula check a rules file needs and collects the outcome in
//! one [`ModelReport`]: stat formulas, skill formulas, the XP curve and
//! the stat dependency order.

use crate::core::dependencies::StatDependencyGraph;
use crate::core::formula::ValidationResult;
use crate::core::skills::{validate_skill_formulas, SkillFormulaReport};
use crate::core::stats::validate_stat_formula;
use crate::core::xp_curve::validate_curve;
use crate::types::ProgressionModel;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Outcome of a single stat formula check
#[derive(Debug, Clone, Serialize)]
pub struct StatFormulaReport {
    pub stat: String,
    pub formula: String,
    pub result: ValidationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub stats: Vec<StatFormulaReport>,
    pub skills: Vec<SkillFormulaReport>,
    pub xp_curve: ValidationResult,
    /// Stat names in dependency order, when the stats are acyclic
    pub resolution_order: Option<Vec<String>>,
    /// Model-level problems: duplicate names and dependency cycles
    pub problems: Vec<String>,
}

impl ModelReport {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
            && self.xp_curve.is_valid()
            && self.stats.iter().all(|s| s.result.is_valid())
            && self.skills.iter().all(SkillFormulaReport::is_valid)
    }

    /// Every failure as a `location: message` line
    pub fn errors(&self) -> Vec<String> {
        let mut errors = self.problems.clone();

        for stat in &self.stats {
            if let Some(message) = stat.result.error_message() {
                errors.push(format!("stat '{}': {}", stat.stat, message));
            }
        }

        for skill in &self.skills {
            for (kind, result) in &skill.results {
                if let Some(message) = result.error_message() {
                    errors.push(format!("skill '{}' ({}): {}", skill.skill, kind, message));
                }
            }
        }

        if let Some(message) = self.xp_curve.error_message() {
            errors.push(format!("xp curve: {message}"));
        }

        errors
    }
}

/// Validate every formula in `model` at its preview level and skill rank
pub fn validate_model(model: &ProgressionModel) -> ModelReport {
    let mut problems = duplicate_names(model);

    let stats = model
        .stats
        .iter()
        .filter_map(|stat| {
            let formula = stat.formula_text()?;
            Some(StatFormulaReport {
                stat: stat.name.clone(),
                formula: formula.to_string(),
                result: validate_stat_formula(stat, &model.stats, model.preview_level),
            })
        })
        .collect();

    let skills = model
        .skills
        .iter()
        .map(|skill| {
            validate_skill_formulas(
                skill,
                &model.stats,
                model.preview_level,
                model.preview_skill_rank,
            )
        })
        .collect();

    let xp_curve = validate_curve(&model.xp_curve, model.preview_level);

    let resolution_order = match StatDependencyGraph::build(&model.stats).resolution_order() {
        Ok(order) => Some(order),
        Err(e) => {
            problems.push(e.to_string());
            None
        }
    };

    let report = ModelReport {
        stats,
        skills,
        xp_curve,
        resolution_order,
        problems,
    };
    debug!(
        valid = report.is_valid(),
        stats = model.stats.len(),
        skills = model.skills.len(),
        "model validated"
    );
    report
}

fn duplicate_names(model: &ProgressionModel) -> Vec<String> {
    let mut problems = Vec::new();

    let mut seen = HashSet::new();
    for stat in &model.stats {
        if !seen.insert(stat.name.to_lowercase()) {
            problems.push(format!("duplicate stat name '{}'", stat.name));
        }
    }

    let mut seen = HashSet::new();
    for skill in &model.skills {
        if !seen.insert(skill.name.to_lowercase()) {
            problems.push(format!("duplicate skill name '{}'", skill.name));
        }
    }

    problems
}
