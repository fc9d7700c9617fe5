//! XP curve calculations
//!
//! Linear and exponential curves are closed-form. Custom curves evaluate a
//! designer formula over `Level` and `BaseXP`, and never fail: a level whose
//! formula cannot be evaluated costs `level * 100` instead, so a half-typed
//! formula still produces a usable preview.

use crate::core::formula::{evaluate, validate, EvalError, ValidationResult};
use crate::types::{XpCurveDefinition, XpCurveKind, XpLevelPreview};
use std::collections::HashMap;
use tracing::debug;

/// Levels shown by default in a curve preview
pub const DEFAULT_PREVIEW_LEVELS: u32 = 20;

/// Variable names a custom curve formula may use
pub const CURVE_VARIABLES: [&str; 2] = ["Level", "BaseXP"];

fn curve_bindings(curve: &XpCurveDefinition, level: u32) -> HashMap<String, f64> {
    HashMap::from([
        ("Level".to_string(), f64::from(level)),
        ("BaseXP".to_string(), curve.base_xp),
    ])
}

fn fallback_xp(level: u32) -> i64 {
    i64::from(level) * 100
}

/// XP required to complete `level`, truncated toward zero
pub fn xp_for_level(curve: &XpCurveDefinition, level: u32) -> i64 {
    let steps = f64::from(level) - 1.0;
    match curve.kind {
        XpCurveKind::Linear => (curve.base_xp + steps * curve.linear_multiplier) as i64,
        XpCurveKind::Exponential => {
            (curve.base_xp * curve.exponential_base.powf(steps)) as i64
        }
        XpCurveKind::CustomFormula => match custom_xp(curve, level) {
            Ok(xp) => xp,
            Err(e) => {
                debug!(level, formula = %curve.formula, error = %e, "custom XP formula failed, using fallback");
                fallback_xp(level)
            }
        },
    }
}

fn custom_xp(curve: &XpCurveDefinition, level: u32) -> Result<i64, EvalError> {
    let value = evaluate(&curve.formula, &curve_bindings(curve, level))?;
    if !value.is_finite() {
        return Err(EvalError::NonFiniteResult(value));
    }
    Ok(value as i64)
}

/// Per-level and cumulative XP for levels `1..=max_level`.
///
/// The cumulative total never decreases for linear and exponential curves
/// with non-negative parameters; custom formulas may yield negative costs.
pub fn generate_previews(curve: &XpCurveDefinition, max_level: u32) -> Vec<XpLevelPreview> {
    let mut total_xp: i64 = 0;

    (1..=max_level)
        .map(|level| {
            let xp_required = xp_for_level(curve, level);
            total_xp = total_xp.saturating_add(xp_required);
            XpLevelPreview {
                level,
                xp_required,
                total_xp,
            }
        })
        .collect()
}

/// Check a curve's formula at `preview_level`.
///
/// Only custom curves have a formula; other kinds are always valid.
pub fn validate_curve(curve: &XpCurveDefinition, preview_level: u32) -> ValidationResult {
    if curve.kind != XpCurveKind::CustomFormula {
        return ValidationResult::valid(None);
    }

    let test_values = curve_bindings(curve, preview_level);
    validate(&curve.formula, CURVE_VARIABLES, Some(&test_values))
}
