//! Stat catalogue operations
//!
//! Formula checks here bind every stat the sample level can resolve, so a
//! derived stat may be built on another derived stat (`Shield = HP * 0.1`).

use crate::core::dependencies::resolve_stat_values;
use crate::core::formula::{extract_variables, validate, ValidationResult};
use crate::types::StatDefinition;
use std::collections::HashMap;
use tracing::debug;

/// Sample values for every resolvable stat at `level`, plus `Level` itself
pub fn preview_values(stats: &[StatDefinition], level: u32) -> HashMap<String, f64> {
    let mut values = resolve_stat_values(stats, level);
    values.insert("Level".to_string(), f64::from(level));
    values
}

/// Check a stat's formula against the rest of the catalogue.
///
/// Base stats (no formula) are always valid. Otherwise every stat name is
/// a known variable, and the sample result is computed at `preview_level`
/// with `BaseValue` bound to the stat's own base value (or `0`).
pub fn validate_stat_formula(
    stat: &StatDefinition,
    all_stats: &[StatDefinition],
    preview_level: u32,
) -> ValidationResult {
    let Some(formula) = stat.formula_text() else {
        return ValidationResult::valid(None);
    };

    let mut test_values = preview_values(all_stats, preview_level);
    test_values.remove(&stat.name);
    test_values.insert(
        "BaseValue".to_string(),
        f64::from(stat.base_value.unwrap_or(0)),
    );

    let known = all_stats.iter().map(|s| s.name.as_str());
    let result = validate(formula, known, Some(&test_values));
    if let Some(message) = result.error_message() {
        debug!(stat = %stat.name, %message, "stat formula rejected");
    }
    result
}

/// Stats whose formula references `stat` by name.
///
/// Matching is by whole identifier, ignoring case: removing `INT` does not
/// flag a formula that only uses `POINTS`.
pub fn find_dependent_stats<'a>(
    stat: &StatDefinition,
    all_stats: &'a [StatDefinition],
) -> Vec<&'a StatDefinition> {
    all_stats
        .iter()
        .filter(|s| {
            s.formula_text().is_some_and(|formula| {
                extract_variables(formula)
                    .iter()
                    .any(|v| v.eq_ignore_ascii_case(&stat.name))
            })
        })
        .collect()
}

/// The starter catalogue: four base stats and three derived ones
pub fn default_stats() -> Vec<StatDefinition> {
    vec![
        StatDefinition::base("STR", 10, 2)
            .with_description("Physical strength, affects melee damage")
            .with_bounds(Some(1), Some(999)),
        StatDefinition::base("VIT", 8, 3)
            .with_description("Vitality, affects HP and stamina")
            .with_bounds(Some(1), Some(999)),
        StatDefinition::base("INT", 12, 2)
            .with_description("Intelligence, affects mana and magic damage")
            .with_bounds(Some(1), Some(999)),
        StatDefinition::base("AGI", 10, 2)
            .with_description("Agility, affects speed and evasion")
            .with_bounds(Some(1), Some(999)),
        StatDefinition::derived("HP", "VIT * 12 + Level * 5")
            .with_description("Health Points - derived from VIT")
            .with_bounds(Some(1), None),
        StatDefinition::derived("Mana", "INT * 10 + Level * 3")
            .with_description("Magical energy - derived from INT")
            .with_bounds(Some(0), None),
        StatDefinition::derived("PhysDmg", "STR * 2 + Level")
            .with_description("Physical damage - derived from STR")
            .with_bounds(Some(1), None),
    ]
}

pub fn new_base_stat(name: &str) -> StatDefinition {
    StatDefinition::base(name, 10, 1)
        .with_description("New base stat")
        .with_bounds(Some(1), Some(999))
}

pub fn new_derived_stat(name: &str) -> StatDefinition {
    StatDefinition::derived(name, "STR + INT")
        .with_description("New derived stat")
        .with_bounds(Some(0), None)
}

/// Copy of `stat` named `<name>_Copy`
pub fn clone_stat(stat: &StatDefinition) -> StatDefinition {
    StatDefinition {
        name: format!("{}_Copy", stat.name),
        ..stat.clone()
    }
}
