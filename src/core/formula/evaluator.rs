//! Formula evaluator
//!
//! Evaluation runs in three steps:
//!
//! 1. every bound variable is replaced by its numeric literal
//!    ([`prepare_expression`]), longest name first;
//! 2. the prepared text is tokenized and parsed into an [`Expr`];
//! 3. the AST is folded to an `f64`.

use super::parser::{parse, BinaryOp, Expr, ParseError};
use super::tokenizer::{tokenize, TokenizeError};
use regex::{NoExpand, Regex};
use std::collections::HashMap;
use thiserror::Error;

/// Error during evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unresolved variable: {0}")]
    UnresolvedVariable(String),

    #[error("Function '{0}' requires at least one argument")]
    MissingArguments(String),

    #[error("Variable '{name}' has no finite value ({value})")]
    NonFiniteBinding { name: String, value: f64 },

    #[error("Result is not a finite number ({0})")]
    NonFiniteResult(f64),

    #[error("Cannot substitute variable '{name}': {message}")]
    Substitution { name: String, message: String },
}

/// Evaluate a formula against a set of variable bindings.
///
/// Binding names match case-insensitively and only as whole words, so
/// binding `HP` never touches `HPMax`. A blank formula evaluates to `0`.
pub fn evaluate(formula: &str, variables: &HashMap<String, f64>) -> Result<f64, EvalError> {
    if formula.trim().is_empty() {
        return Ok(0.0);
    }

    let prepared = prepare_expression(formula, variables)?;
    let tokens = tokenize(&prepared)?;
    let expr = parse(tokens)?;
    eval_expr(&expr)
}

/// Replace each bound variable with its invariant decimal literal.
///
/// Longer names are substituted first so a name that is a prefix of
/// another cannot corrupt it.
pub fn prepare_expression(
    formula: &str,
    variables: &HashMap<String, f64>,
) -> Result<String, EvalError> {
    let mut bindings: Vec<(&String, f64)> = variables.iter().map(|(k, v)| (k, *v)).collect();
    bindings.sort_by(|a, b| {
        b.0.chars()
            .count()
            .cmp(&a.0.chars().count())
            .then_with(|| a.0.cmp(b.0))
    });

    let mut result = formula.to_string();

    for (name, value) in bindings {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(name));
        let re = Regex::new(&pattern).map_err(|e| EvalError::Substitution {
            name: name.clone(),
            message: e.to_string(),
        })?;

        if !re.is_match(&result) {
            continue;
        }

        // NaN and infinities have no literal form
        if !value.is_finite() {
            return Err(EvalError::NonFiniteBinding {
                name: name.clone(),
                value,
            });
        }

        // f64's Display never uses exponent notation
        let literal = value.to_string();
        result = re.replace_all(&result, NoExpand(&literal)).into_owned();
    }

    Ok(result)
}

/// Evaluate a parsed expression
pub fn eval_expr(expr: &Expr) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(n) => Ok(*n),

        Expr::Variable(name) => Err(EvalError::UnresolvedVariable(name.clone())),

        Expr::Negate(operand) => Ok(-eval_expr(operand)?),

        Expr::Binary { op, left, right } => {
            let left = eval_expr(left)?;
            let right = eval_expr(right)?;
            eval_binary(*op, left, right)
        }

        Expr::Call { function, args } => {
            let values = args.iter().map(eval_expr).collect::<Result<Vec<_>, _>>()?;
            function.apply(&values)
        }
    }
}

fn eval_binary(op: BinaryOp, left: f64, right: f64) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(left + right),
        BinaryOp::Sub => Ok(left - right),
        BinaryOp::Mul => Ok(left * right),
        BinaryOp::Div => {
            if right == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(left / right)
        }
        BinaryOp::Pow => Ok(left.powf(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formula::FunctionKind;

    fn vars(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_evaluate_stat_formula() {
        let result = evaluate("VIT * 12 + Level * 5", &vars(&[("VIT", 8.0), ("Level", 10.0)]));
        assert_eq!(result, Ok(146.0));
    }

    #[test]
    fn test_evaluate_function_with_variable() {
        let result = evaluate("Max(1, 5 - SkillRank * 0.5)", &vars(&[("SkillRank", 3.0)]));
        assert_eq!(result, Ok(3.5));
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(evaluate("2^3^2", &HashMap::new()), Ok(512.0));
    }

    #[test]
    fn test_division_by_zero() {
        let result = evaluate("A / B", &vars(&[("A", 1.0), ("B", 0.0)]));
        assert_eq!(result, Err(EvalError::DivisionByZero));
        assert_eq!(
            evaluate("1 / -0", &HashMap::new()),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn test_division_by_tiny_value_is_allowed() {
        let result = evaluate("1 / 0.000001", &HashMap::new()).unwrap();
        assert!((result - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_prefix_safe_substitution() {
        let result = evaluate("HP + HPMAX", &vars(&[("HP", 1.0), ("HPMAX", 2.0)]));
        assert_eq!(result, Ok(3.0));
    }

    #[test]
    fn test_substitution_is_case_insensitive() {
        let result = evaluate("vit * 2 + VIT", &vars(&[("Vit", 4.0)]));
        assert_eq!(result, Ok(12.0));
    }

    #[test]
    fn test_prepare_expression_output() {
        let prepared =
            prepare_expression("STR * 2 + STR_BONUS", &vars(&[("STR", 10.0), ("STR_BONUS", 0.5)]))
                .unwrap();
        assert_eq!(prepared, "10 * 2 + 0.5");
    }

    #[test]
    fn test_negative_binding_after_operator() {
        let result = evaluate("10 - Penalty", &vars(&[("Penalty", -3.0)]));
        assert_eq!(result, Ok(13.0));
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_power() {
        assert_eq!(evaluate("-2^2", &HashMap::new()), Ok(4.0));
        assert_eq!(evaluate("-(2^2)", &HashMap::new()), Ok(-4.0));
    }

    #[test]
    fn test_blank_formula_is_zero() {
        assert_eq!(evaluate("   ", &HashMap::new()), Ok(0.0));
    }

    #[test]
    fn test_unresolved_variable() {
        assert_eq!(
            evaluate("STR + 1", &HashMap::new()),
            Err(EvalError::UnresolvedVariable("STR".to_string()))
        );
    }

    #[test]
    fn test_malformed_number() {
        let err = evaluate("1..5 * 2", &HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Tokenize(TokenizeError::InvalidNumber { .. })
        ));
        assert_eq!(err.to_string(), "Invalid number: 1..5");
    }

    #[test]
    fn test_unknown_function() {
        let err = evaluate("clamp(1, 2)", &HashMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown function: clamp");
    }

    #[test]
    fn test_non_finite_binding_rejected() {
        let err = evaluate("X + 1", &vars(&[("X", f64::NAN)])).unwrap_err();
        assert!(matches!(err, EvalError::NonFiniteBinding { .. }));
    }

    #[test]
    fn test_unused_non_finite_binding_ignored() {
        let bindings = vars(&[("A", 2.0), ("Unused", f64::NAN), ("Far", f64::INFINITY)]);
        assert_eq!(evaluate("A + 1", &bindings), Ok(3.0));
        assert_eq!(
            prepare_expression("A + 1", &bindings),
            Ok("2 + 1".to_string())
        );
    }

    #[test]
    fn test_eval_expr_call() {
        let expr = Expr::Call {
            function: FunctionKind::Pow,
            args: vec![Expr::Number(3.0), Expr::Number(2.0)],
        };
        assert_eq!(eval_expr(&expr), Ok(9.0));
    }

    #[test]
    fn test_all_builtins_through_evaluate() {
        let empty = HashMap::new();
        assert_eq!(evaluate("floor(2.7)", &empty), Ok(2.0));
        assert_eq!(evaluate("CEIL(2.1)", &empty), Ok(3.0));
        assert_eq!(evaluate("round(2.5)", &empty), Ok(2.0));
        assert_eq!(evaluate("abs(-4)", &empty), Ok(4.0));
        assert_eq!(evaluate("sqrt(16)", &empty), Ok(4.0));
        assert_eq!(evaluate("min(3, 9)", &empty), Ok(3.0));
        assert_eq!(evaluate("max(3)", &empty), Ok(3.0));
        assert_eq!(evaluate("pow(2, 0.5) * pow(2, 0.5)", &empty).map(f64::round), Ok(2.0));
    }
}
