use serde::{Deserialize, Serialize};

//==============================================================================
// Stats
//==============================================================================

/// A character stat.
///
/// Base stats (STR, INT, ...) carry a base value and growth; derived stats
/// (HP, Mana, ...) carry a formula over other stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub base_value: Option<i32>,
    #[serde(default)]
    pub growth_per_level: Option<i32>,
    #[serde(default)]
    pub min_value: Option<i32>,
    #[serde(default)]
    pub max_value: Option<i32>,
    #[serde(default)]
    pub formula: Option<String>,
}

impl StatDefinition {
    /// Create a base stat with the given starting value and growth
    pub fn base(name: impl Into<String>, base_value: i32, growth_per_level: i32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            base_value: Some(base_value),
            growth_per_level: Some(growth_per_level),
            min_value: None,
            max_value: None,
            formula: None,
        }
    }

    /// Create a derived stat computed by `formula`
    pub fn derived(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            base_value: None,
            growth_per_level: None,
            min_value: None,
            max_value: None,
            formula: Some(formula.into()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_bounds(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    /// A stat is derived when it has a non-blank formula
    pub fn is_derived(&self) -> bool {
        self.formula_text().is_some()
    }

    /// The formula, if present and not blank
    pub fn formula_text(&self) -> Option<&str> {
        self.formula.as_deref().filter(|f| !f.trim().is_empty())
    }
}

//==============================================================================
// Skills
//==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillType {
    #[default]
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "passive")]
    Passive,
}

/// A skill with up to four balance formulas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skill_type: SkillType,
    #[serde(default = "default_max_rank")]
    pub max_rank: u32,
    #[serde(default = "default_required_level")]
    pub required_level: u32,
    #[serde(default)]
    pub required_class: Option<String>,
    #[serde(default)]
    pub damage_formula: Option<String>,
    #[serde(default)]
    pub mana_cost_formula: Option<String>,
    #[serde(default)]
    pub cooldown_formula: Option<String>,
    #[serde(default)]
    pub passive_effect_formula: Option<String>,
}

fn default_max_rank() -> u32 {
    5
}

fn default_required_level() -> u32 {
    1
}

impl SkillDefinition {
    pub fn new(name: impl Into<String>, skill_type: SkillType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            skill_type,
            max_rank: default_max_rank(),
            required_level: default_required_level(),
            required_class: None,
            damage_formula: None,
            mana_cost_formula: None,
            cooldown_formula: None,
            passive_effect_formula: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.skill_type == SkillType::Active
    }
}

//==============================================================================
// XP curve
//==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum XpCurveKind {
    #[serde(alias = "linear")]
    Linear,
    #[default]
    #[serde(alias = "exponential")]
    Exponential,
    #[serde(alias = "custom", alias = "custom_formula")]
    CustomFormula,
}

impl std::str::FromStr for XpCurveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(XpCurveKind::Linear),
            "exponential" | "exp" => Ok(XpCurveKind::Exponential),
            "custom" | "customformula" | "custom_formula" | "formula" => {
                Ok(XpCurveKind::CustomFormula)
            }
            other => Err(format!(
                "unknown curve kind '{other}' (expected linear, exponential or custom)"
            )),
        }
    }
}

/// How much XP each level costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpCurveDefinition {
    pub kind: XpCurveKind,
    pub base_xp: f64,
    pub linear_multiplier: f64,
    pub exponential_base: f64,
    /// Used when `kind` is `CustomFormula`; may reference `Level` and `BaseXP`
    pub formula: String,
}

impl Default for XpCurveDefinition {
    fn default() -> Self {
        Self {
            kind: XpCurveKind::Exponential,
            base_xp: 100.0,
            linear_multiplier: 100.0,
            exponential_base: 1.15,
            formula: "Level * 100".to_string(),
        }
    }
}

impl XpCurveDefinition {
    pub fn linear(base_xp: f64, linear_multiplier: f64) -> Self {
        Self {
            kind: XpCurveKind::Linear,
            base_xp,
            linear_multiplier,
            ..Self::default()
        }
    }

    pub fn exponential(base_xp: f64, exponential_base: f64) -> Self {
        Self {
            kind: XpCurveKind::Exponential,
            base_xp,
            exponential_base,
            ..Self::default()
        }
    }

    pub fn custom(base_xp: f64, formula: impl Into<String>) -> Self {
        Self {
            kind: XpCurveKind::CustomFormula,
            base_xp,
            formula: formula.into(),
            ..Self::default()
        }
    }
}

/// One row of an XP curve preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XpLevelPreview {
    pub level: u32,
    pub xp_required: i64,
    pub total_xp: i64,
}

//==============================================================================
// Rules file
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelUpRules {
    pub stat_points_per_level: u32,
    pub skill_points_per_level: u32,
    pub bonus_rule_description: String,
}

impl Default for LevelUpRules {
    fn default() -> Self {
        Self {
            stat_points_per_level: 5,
            skill_points_per_level: 1,
            bonus_rule_description: String::new(),
        }
    }
}

/// A complete set of progression rules, as stored in a rules file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionModel {
    pub stats: Vec<StatDefinition>,
    pub skills: Vec<SkillDefinition>,
    pub xp_curve: XpCurveDefinition,
    pub level_up: LevelUpRules,
    /// Level used for sample values while validating
    pub preview_level: u32,
    /// Skill rank used for sample values while validating skills
    pub preview_skill_rank: u32,
}

impl Default for ProgressionModel {
    fn default() -> Self {
        Self {
            stats: Vec::new(),
            skills: Vec::new(),
            xp_curve: XpCurveDefinition::default(),
            level_up: LevelUpRules::default(),
            preview_level: 10,
            preview_skill_rank: 1,
        }
    }
}

impl ProgressionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a stat by name (case-insensitive)
    pub fn stat(&self, name: &str) -> Option<&StatDefinition> {
        self.stats
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn stat_names(&self) -> Vec<&str> {
        self.stats.iter().map(|s| s.name.as_str()).collect()
    }
}
