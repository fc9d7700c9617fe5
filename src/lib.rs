//! Statforge - formula engine and progression-rules checker for RPG data
//!
//! This library evaluates and validates the balance formulas designers write
//! for stats, skills and XP curves, and checks whole rules files.
//!
//! # Features
//!
//! - Arithmetic formulas with variables and built-in functions
//!   (`floor`, `ceil`, `round`, `abs`, `sqrt`, `min`, `max`, `pow`)
//! - Static validation with sample evaluation
//! - Linear, exponential and custom-formula XP curves
//! - Stat dependency graph with cycle detection
//! - YAML and JSON rules files
//!
//! # Example
//!
//! ```no_run
//! use statforge::parser::parse_model;
//! use statforge::core::validate_model;
//! use std::path::Path;
//!
//! let model = parse_model(Path::new("rules.yaml"))?;
//! let report = validate_model(&model);
//!
//! for error in report.errors() {
//!     println!("{error}");
//! }
//! # Ok::<(), statforge::error::StatforgeError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use crate::core::formula::{evaluate, validate, EvalError, ValidationResult};
pub use error::{StatforgeError, StatforgeResult};
pub use types::{ProgressionModel, SkillDefinition, StatDefinition, XpCurveDefinition};
