//! Static formula validation
//!
//! Checks run in a fixed order and the first failure wins:
//! unknown variables, parenthesis balance, operator adjacency, then (only
//! when sample values are supplied) a trial evaluation.

use super::evaluator::{evaluate, EvalError};
use super::scanner::referenced_identifiers;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Names that are legal in every formula
pub const RESERVED_KEYWORDS: [&str; 2] = ["Level", "BaseValue"];

/// Which side of a parenthesis pair is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenImbalance {
    ExtraClosing,
    MissingClosing,
}

impl std::fmt::Display for ParenImbalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParenImbalance::ExtraClosing => f.write_str("extra closing parenthesis"),
            ParenImbalance::MissingClosing => f.write_str("missing closing parenthesis"),
        }
    }
}

/// Why a formula was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaIssue {
    #[error("Unknown variable(s): {}", .0.join(", "))]
    UnknownVariables(Vec<String>),

    #[error("Unbalanced parentheses: {0}")]
    UnbalancedParens(ParenImbalance),

    #[error("Invalid operator sequence detected")]
    InvalidOperatorSequence,

    #[error("Evaluation error: {0}")]
    Evaluation(EvalError),
}

/// Outcome of [`validate`].
///
/// Either the formula is valid (optionally with a sample value) or it
/// carries exactly one issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    is_valid: bool,
    error_message: Option<String>,
    sample_result: Option<f64>,
    #[serde(skip)]
    issue: Option<FormulaIssue>,
}

impl ValidationResult {
    pub fn valid(sample_result: Option<f64>) -> Self {
        Self {
            is_valid: true,
            error_message: None,
            sample_result,
            issue: None,
        }
    }

    pub fn invalid(issue: FormulaIssue) -> Self {
        Self {
            is_valid: false,
            error_message: Some(issue.to_string()),
            sample_result: None,
            issue: Some(issue),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn sample_result(&self) -> Option<f64> {
        self.sample_result
    }

    pub fn issue(&self) -> Option<&FormulaIssue> {
        self.issue.as_ref()
    }
}

/// Validate a formula against the names legal in its context.
///
/// `Level` and `BaseValue` are always accepted. When `test_values` is
/// given and the static checks pass, the formula is evaluated and the
/// value returned as the sample; evaluation failures become
/// [`FormulaIssue::Evaluation`].
pub fn validate<I, S>(
    formula: &str,
    known_variables: I,
    test_values: Option<&HashMap<String, f64>>,
) -> ValidationResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if formula.trim().is_empty() {
        return ValidationResult::valid(None);
    }

    let known = known_set(known_variables);

    if let Err(issue) = check_static(formula, &known) {
        debug!(formula, %issue, "formula failed static validation");
        return ValidationResult::invalid(issue);
    }

    match test_values {
        Some(values) => match evaluate(formula, values) {
            Ok(sample) => ValidationResult::valid(Some(sample)),
            Err(e) => {
                debug!(formula, error = %e, "formula failed sample evaluation");
                ValidationResult::invalid(FormulaIssue::Evaluation(e))
            }
        },
        None => ValidationResult::valid(None),
    }
}

/// Effective known-name set: caller names plus reserved keywords, lowercased
fn known_set<I, S>(known_variables: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    known_variables
        .into_iter()
        .map(|name| name.as_ref().to_lowercase())
        .chain(RESERVED_KEYWORDS.iter().map(|k| k.to_lowercase()))
        .collect()
}

fn check_static(formula: &str, known: &HashSet<String>) -> Result<(), FormulaIssue> {
    let unknown = unknown_variables(formula, known);
    if !unknown.is_empty() {
        return Err(FormulaIssue::UnknownVariables(unknown));
    }
    check_parentheses(formula).map_err(FormulaIssue::UnbalancedParens)?;
    if has_invalid_operator_sequence(formula) {
        return Err(FormulaIssue::InvalidOperatorSequence);
    }
    Ok(())
}

/// Referenced variables missing from `known` (lowercased names), in
/// first-occurrence order with exact duplicates removed
pub fn unknown_variables(formula: &str, known: &HashSet<String>) -> Vec<String> {
    let mut unknown: Vec<String> = Vec::new();
    for ident in referenced_identifiers(formula) {
        if !known.contains(&ident.to_lowercase()) && !unknown.iter().any(|u| u == ident) {
            unknown.push(ident.to_string());
        }
    }
    unknown
}

/// Left-to-right depth scan; going negative fails immediately
pub fn check_parentheses(formula: &str) -> Result<(), ParenImbalance> {
    let mut depth: i64 = 0;
    for c in formula.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err(ParenImbalance::ExtraClosing);
        }
    }
    if depth > 0 {
        return Err(ParenImbalance::MissingClosing);
    }
    Ok(())
}

/// Two binary operators in a row, or a trailing operator.
///
/// A `-` at the start, after `(`, or after another operator is unary and
/// clears the "last was operator" flag, so `2 * -3` passes but `2 +* 3`
/// does not.
pub fn has_invalid_operator_sequence(formula: &str) -> bool {
    const OPERATORS: [char; 5] = ['+', '-', '*', '/', '^'];

    let mut last_was_operator = false;
    let mut last_char: Option<char> = None;

    for c in formula.chars().filter(|c| !c.is_whitespace()) {
        let is_operator = OPERATORS.contains(&c);

        if c == '-' && (last_was_operator || matches!(last_char, None | Some('('))) {
            last_was_operator = false;
            last_char = Some(c);
            continue;
        }

        if is_operator && last_was_operator {
            return true;
        }

        last_was_operator = is_operator;
        last_char = Some(c);
    }

    last_was_operator
}
