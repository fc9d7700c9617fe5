//! Skill formula checks and skill factories

use crate::core::formula::{validate, ValidationResult};
use crate::core::stats::preview_values;
use crate::types::{SkillDefinition, SkillType, StatDefinition};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Names a skill formula may use besides stat names
pub const SKILL_VARIABLES: [&str; 3] = ["Level", "SkillRank", "BaseValue"];

/// The four formulas a skill can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SkillFormulaKind {
    Damage,
    ManaCost,
    Cooldown,
    PassiveEffect,
}

impl SkillFormulaKind {
    pub const ALL: [SkillFormulaKind; 4] = [
        SkillFormulaKind::Damage,
        SkillFormulaKind::ManaCost,
        SkillFormulaKind::Cooldown,
        SkillFormulaKind::PassiveEffect,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SkillFormulaKind::Damage => "damage",
            SkillFormulaKind::ManaCost => "mana cost",
            SkillFormulaKind::Cooldown => "cooldown",
            SkillFormulaKind::PassiveEffect => "passive effect",
        }
    }

    /// The skill's formula of this kind, if any
    pub fn formula_of(self, skill: &SkillDefinition) -> Option<&str> {
        let formula = match self {
            SkillFormulaKind::Damage => &skill.damage_formula,
            SkillFormulaKind::ManaCost => &skill.mana_cost_formula,
            SkillFormulaKind::Cooldown => &skill.cooldown_formula,
            SkillFormulaKind::PassiveEffect => &skill.passive_effect_formula,
        };
        formula.as_deref()
    }
}

impl fmt::Display for SkillFormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validation outcome for each of a skill's formulas
#[derive(Debug, Clone, Serialize)]
pub struct SkillFormulaReport {
    pub skill: String,
    pub results: Vec<(SkillFormulaKind, ValidationResult)>,
}

impl SkillFormulaReport {
    pub fn get(&self, kind: SkillFormulaKind) -> Option<&ValidationResult> {
        self.results
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, result)| result)
    }

    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_valid())
    }
}

/// Check all four formulas of `skill`.
///
/// Known names are the stat names plus `Level`, `SkillRank` and
/// `BaseValue`. Samples use stat previews at `preview_level`, the given
/// `skill_rank`, and `BaseValue = 0`. Absent or blank formulas are valid.
pub fn validate_skill_formulas(
    skill: &SkillDefinition,
    stats: &[StatDefinition],
    preview_level: u32,
    skill_rank: u32,
) -> SkillFormulaReport {
    let known: Vec<&str> = stats
        .iter()
        .map(|s| s.name.as_str())
        .chain(SKILL_VARIABLES)
        .collect();

    let mut test_values = preview_values(stats, preview_level);
    test_values.insert("SkillRank".to_string(), f64::from(skill_rank));
    test_values.insert("BaseValue".to_string(), 0.0);

    let results = SkillFormulaKind::ALL
        .into_iter()
        .map(|kind| {
            let result = match kind.formula_of(skill) {
                Some(formula) => validate(formula, known.iter().copied(), Some(&test_values)),
                None => ValidationResult::valid(None),
            };
            if let Some(message) = result.error_message() {
                debug!(skill = %skill.name, formula = %kind, %message, "skill formula rejected");
            }
            (kind, result)
        })
        .collect();

    SkillFormulaReport {
        skill: skill.name.clone(),
        results,
    }
}

pub fn new_active_skill(name: &str) -> SkillDefinition {
    SkillDefinition {
        description: "New active skill".to_string(),
        max_rank: 10,
        damage_formula: Some("INT * 2 + SkillRank * 5".to_string()),
        mana_cost_formula: Some("20 + SkillRank * 2".to_string()),
        cooldown_formula: Some("Max(1, 5 - SkillRank * 0.5)".to_string()),
        ..SkillDefinition::new(name, SkillType::Active)
    }
}

pub fn new_passive_skill(name: &str) -> SkillDefinition {
    SkillDefinition {
        description: "New passive skill".to_string(),
        passive_effect_formula: Some("Level * SkillRank * 0.5".to_string()),
        ..SkillDefinition::new(name, SkillType::Passive)
    }
}

/// Copy of `skill` named `<name>_Copy`
pub fn clone_skill(skill: &SkillDefinition) -> SkillDefinition {
    SkillDefinition {
        name: format!("{}_Copy", skill.name),
        ..skill.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::default_stats;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_active_skill_previews() {
        let skill = new_active_skill("Fireball");
        let report = validate_skill_formulas(&skill, &default_stats(), 10, 3);
        assert!(report.is_valid());

        // INT = 12 + 2 * 10
        let damage = report.get(SkillFormulaKind::Damage).unwrap();
        assert_eq!(damage.sample_result(), Some(32.0 * 2.0 + 15.0));

        let cooldown = report.get(SkillFormulaKind::Cooldown).unwrap();
        assert_eq!(cooldown.sample_result(), Some(3.5));

        // no passive formula on an active skill
        let passive = report.get(SkillFormulaKind::PassiveEffect).unwrap();
        assert!(passive.is_valid());
        assert!(passive.sample_result().is_none());
    }

    #[test]
    fn test_new_passive_skill_previews() {
        let skill = new_passive_skill("Toughness");
        let report = validate_skill_formulas(&skill, &default_stats(), 4, 2);
        let passive = report.get(SkillFormulaKind::PassiveEffect).unwrap();
        assert_eq!(passive.sample_result(), Some(4.0));
        assert!(!skill.is_active());
    }

    #[test]
    fn test_each_formula_reported_separately() {
        let mut skill = new_active_skill("Smite");
        skill.mana_cost_formula = Some("20 + Faith".to_string());
        skill.cooldown_formula = Some("(3".to_string());

        let report = validate_skill_formulas(&skill, &default_stats(), 10, 1);
        assert!(!report.is_valid());
        assert!(report.get(SkillFormulaKind::Damage).unwrap().is_valid());
        assert_eq!(
            report.get(SkillFormulaKind::ManaCost).unwrap().error_message(),
            Some("Unknown variable(s): Faith")
        );
        assert_eq!(
            report.get(SkillFormulaKind::Cooldown).unwrap().error_message(),
            Some("Unbalanced parentheses: missing closing parenthesis")
        );
    }

    #[test]
    fn test_base_value_is_zero_for_skills() {
        let mut skill = SkillDefinition::new("Probe", SkillType::Active);
        skill.damage_formula = Some("BaseValue + 1".to_string());
        let report = validate_skill_formulas(&skill, &[], 1, 1);
        assert_eq!(
            report.get(SkillFormulaKind::Damage).unwrap().sample_result(),
            Some(1.0)
        );
    }

    #[test]
    fn test_clone_skill() {
        let copy = clone_skill(&new_passive_skill("Regen"));
        assert_eq!(copy.name, "Regen_Copy");
        assert_eq!(copy.skill_type, SkillType::Passive);
    }
}
