use crate::error::{StatforgeError, StatforgeResult};
use crate::types::ProgressionModel;
use std::path::Path;
use tracing::debug;

/// Supported rules file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesFormat {
    Yaml,
    Json,
}

impl RulesFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> StatforgeResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(RulesFormat::Yaml),
            Some("json") => Ok(RulesFormat::Json),
            Some(other) => Err(StatforgeError::Parse(format!(
                "Unsupported rules file extension '.{}' for {} (expected .yaml, .yml or .json)",
                other,
                path.display()
            ))),
            None => Err(StatforgeError::Parse(format!(
                "Rules file {} has no extension (expected .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }
}

/// Load a progression rules file.
///
/// Missing sections take their defaults, so `{}` is a valid (empty) model.
///
/// # Example
/// ```no_run
/// use statforge::parser::parse_model;
/// use std::path::Path;
///
/// let model = parse_model(Path::new("rules.yaml"))?;
/// println!("Stats: {}", model.stats.len());
/// # Ok::<(), statforge::error::StatforgeError>(())
/// ```
pub fn parse_model(path: &Path) -> StatforgeResult<ProgressionModel> {
    let format = RulesFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let model = parse_model_str(&content, format)?;

    debug!(
        path = %path.display(),
        stats = model.stats.len(),
        skills = model.skills.len(),
        "rules file loaded"
    );
    Ok(model)
}

/// Parse rules from text in the given format
pub fn parse_model_str(content: &str, format: RulesFormat) -> StatforgeResult<ProgressionModel> {
    let model = match format {
        RulesFormat::Yaml => {
            // an empty YAML document deserializes as null
            if content.trim().is_empty() {
                ProgressionModel::default()
            } else {
                serde_yaml::from_str(content)?
            }
        }
        RulesFormat::Json => serde_json::from_str(content)?,
    };

    check_names(&model)?;
    Ok(model)
}

fn check_names(model: &ProgressionModel) -> StatforgeResult<()> {
    if let Some(stat) = model.stats.iter().find(|s| s.name.trim().is_empty()) {
        return Err(StatforgeError::Validation(format!(
            "Stat with formula {:?} has an empty name",
            stat.formula.as_deref().unwrap_or("")
        )));
    }
    if model.skills.iter().any(|s| s.name.trim().is_empty()) {
        return Err(StatforgeError::Validation(
            "Skill with an empty name".to_string(),
        ));
    }
    Ok(())
}

/// Write a model back out in the given format
pub fn to_string(model: &ProgressionModel, format: RulesFormat) -> StatforgeResult<String> {
    Ok(match format {
        RulesFormat::Yaml => serde_yaml::to_string(model)?,
        RulesFormat::Json => serde_json::to_string_pretty(model)?,
    })
}
