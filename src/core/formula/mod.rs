//! Formula expression engine
//!
//! Balance formulas are single numeric expressions such as
//! `VIT * 12 + Level * 5` or `Max(1, 5 - SkillRank * 0.5)`:
//! numbers, variables, `+ - * / ^`, parentheses and the built-ins
//! `floor ceil round abs sqrt min max pow`.
//!
//! Everything here is stateless; each call stands alone and is safe to run
//! concurrently.
//!
//! ```
//! use statforge::core::formula::{evaluate, validate};
//! use std::collections::HashMap;
//!
//! let result = validate("STR * 2 + Level", ["STR"], None);
//! assert!(result.is_valid());
//!
//! let vars = HashMap::from([("STR".to_string(), 10.0), ("Level".to_string(), 3.0)]);
//! assert_eq!(evaluate("STR * 2 + Level", &vars).unwrap(), 23.0);
//! ```

pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod scanner;
pub mod tokenizer;
pub mod validator;

pub use evaluator::{evaluate, EvalError};
pub use functions::FunctionKind;
pub use scanner::{extract_variables, scan_identifiers};
pub use validator::{
    validate, FormulaIssue, ParenImbalance, ValidationResult, RESERVED_KEYWORDS,
};
