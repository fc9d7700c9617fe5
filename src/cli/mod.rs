//! CLI command handlers

pub mod commands;

pub use commands::{
    audit, check, curve, eval, functions, parse_binding, validate_files, watch, CurveOptions,
};
