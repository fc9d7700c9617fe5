//! Built-in function table
//!
//! The set is closed: formulas are persisted as plain text, so adding or
//! removing a name here changes which stored formulas are legal.

use super::evaluator::EvalError;

/// A built-in formula function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Floor,
    Ceil,
    Round,
    Abs,
    Sqrt,
    Min,
    Max,
    Pow,
}

impl FunctionKind {
    /// Every built-in, in the order they are documented
    pub const ALL: [FunctionKind; 8] = [
        FunctionKind::Floor,
        FunctionKind::Ceil,
        FunctionKind::Round,
        FunctionKind::Abs,
        FunctionKind::Sqrt,
        FunctionKind::Min,
        FunctionKind::Max,
        FunctionKind::Pow,
    ];

    /// Look up a built-in by name (case-insensitive)
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            FunctionKind::Floor => "floor",
            FunctionKind::Ceil => "ceil",
            FunctionKind::Round => "round",
            FunctionKind::Abs => "abs",
            FunctionKind::Sqrt => "sqrt",
            FunctionKind::Min => "min",
            FunctionKind::Max => "max",
            FunctionKind::Pow => "pow",
        }
    }

    /// Number of arguments the function uses
    pub fn arity(self) -> usize {
        match self {
            FunctionKind::Min | FunctionKind::Max | FunctionKind::Pow => 2,
            _ => 1,
        }
    }

    /// Apply the function to already-evaluated arguments.
    ///
    /// Arguments past the arity are ignored. Two-argument functions called
    /// with a single argument return that argument unchanged.
    pub fn apply(self, args: &[f64]) -> Result<f64, EvalError> {
        let Some(&first) = args.first() else {
            return Err(EvalError::MissingArguments(self.name().to_string()));
        };
        let second = args.get(1).copied();

        let value = match self {
            FunctionKind::Floor => first.floor(),
            FunctionKind::Ceil => first.ceil(),
            // Midpoints go to the even neighbour: round(2.5) == 2
            FunctionKind::Round => first.round_ties_even(),
            FunctionKind::Abs => first.abs(),
            FunctionKind::Sqrt => first.sqrt(),
            FunctionKind::Min => second.map_or(first, |s| first.min(s)),
            FunctionKind::Max => second.map_or(first, |s| first.max(s)),
            FunctionKind::Pow => second.map_or(first, |s| first.powf(s)),
        };
        Ok(value)
    }
}

impl std::fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `name` is a built-in function name
pub fn is_builtin(name: &str) -> bool {
    FunctionKind::lookup(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(FunctionKind::lookup("Max"), Some(FunctionKind::Max));
        assert_eq!(FunctionKind::lookup("FLOOR"), Some(FunctionKind::Floor));
        assert_eq!(FunctionKind::lookup("sum"), None);
    }

    #[test]
    fn test_two_arg_functions() {
        assert_eq!(FunctionKind::Min.apply(&[3.0, 7.0]).unwrap(), 3.0);
        assert_eq!(FunctionKind::Max.apply(&[3.0, 7.0]).unwrap(), 7.0);
        assert_eq!(FunctionKind::Pow.apply(&[2.0, 10.0]).unwrap(), 1024.0);
    }

    #[test]
    fn test_single_arg_passthrough() {
        assert_eq!(FunctionKind::Max.apply(&[4.5]).unwrap(), 4.5);
        assert_eq!(FunctionKind::Pow.apply(&[9.0]).unwrap(), 9.0);
    }

    #[test]
    fn test_extra_args_ignored() {
        assert_eq!(FunctionKind::Abs.apply(&[-2.0, 100.0]).unwrap(), 2.0);
        assert_eq!(FunctionKind::Min.apply(&[5.0, 1.0, -10.0]).unwrap(), 1.0);
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(FunctionKind::Round.apply(&[2.5]).unwrap(), 2.0);
        assert_eq!(FunctionKind::Round.apply(&[3.5]).unwrap(), 4.0);
        assert_eq!(FunctionKind::Round.apply(&[2.6]).unwrap(), 3.0);
    }

    #[test]
    fn test_sqrt_of_negative_is_nan() {
        assert!(FunctionKind::Sqrt.apply(&[-4.0]).unwrap().is_nan());
    }

    #[test]
    fn test_no_args_is_error() {
        assert_eq!(
            FunctionKind::Ceil.apply(&[]),
            Err(EvalError::MissingArguments("ceil".to_string()))
        );
    }
}
