use clap::{Parser, Subcommand};
use statforge::cli;
use statforge::core::xp_curve::DEFAULT_PREVIEW_LEVELS;
use statforge::types::XpCurveKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statforge")]
#[command(about = "Validate and evaluate RPG balance formulas.")]
#[command(long_about = "Statforge - balance formulas for RPG progression data

Checks the formulas designers write for derived stats, skills and XP
curves: unknown variables, unbalanced parentheses, operator typos and
sample values at a preview level.

COMMANDS:
  check      - Validate a single formula
  eval       - Evaluate a formula with variable bindings
  functions  - List built-in functions
  validate   - Validate every formula in rules files
  curve      - Print an XP curve table
  audit      - Show a stat's references and dependents
  watch      - Re-validate a rules file on change

EXAMPLES:
  statforge check \"VIT * 12 + Level * 5\" -k VIT
  statforge eval \"Max(1, 5 - SkillRank * 0.5)\" -s SkillRank=3
  statforge curve --kind linear --base-xp 100 --multiplier 50
  statforge validate rules.yaml

Set RUST_LOG=debug for diagnostic logging on stderr.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a single formula
    Check {
        /// Formula text
        formula: String,

        /// Known variable names (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        known: Vec<String>,

        /// Sample value for a variable; evaluates the formula when given
        #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = cli::parse_binding)]
        set: Vec<(String, f64)>,
    },

    /// Evaluate a formula
    Eval {
        /// Formula text
        formula: String,

        /// Value for a variable
        #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = cli::parse_binding)]
        set: Vec<(String, f64)>,
    },

    /// List built-in functions
    Functions,

    #[command(long_about = "Validate every formula in one or more rules files.

Rules files are YAML (.yaml, .yml) or JSON (.json) with 'stats', 'skills'
and 'xp_curve' sections. Derived stat, skill and custom XP formulas are
checked and sampled at the preview level (rules file 'preview_level',
overridden by --level or STATFORGE_PREVIEW_LEVEL).

BATCH VALIDATION:
  statforge validate warrior.yaml mage.yaml
  Validates every file, reporting all errors.")]
    /// Validate formulas in rules files
    Validate {
        /// Rules file(s) to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Level used for sample values
        #[arg(short, long, env = "STATFORGE_PREVIEW_LEVEL")]
        level: Option<u32>,
    },

    /// Print an XP curve table
    Curve {
        /// Rules file to take the curve from (defaults otherwise)
        file: Option<PathBuf>,

        /// Curve kind: linear, exponential or custom
        #[arg(long)]
        kind: Option<XpCurveKind>,

        /// XP for level 1
        #[arg(long)]
        base_xp: Option<f64>,

        /// Linear step per level
        #[arg(long)]
        multiplier: Option<f64>,

        /// Exponential growth factor
        #[arg(long)]
        exp_base: Option<f64>,

        /// Custom formula over Level and BaseXP
        #[arg(long)]
        formula: Option<String>,

        /// Number of levels to show
        #[arg(short, long, default_value_t = DEFAULT_PREVIEW_LEVELS)]
        max_level: u32,
    },

    /// Show references, dependents and resolution order for a stat
    Audit {
        /// Rules file
        file: PathBuf,

        /// Stat name
        stat: String,

        /// Level used for sample values
        #[arg(short, long, env = "STATFORGE_PREVIEW_LEVEL")]
        level: Option<u32>,
    },

    /// Re-validate a rules file whenever it changes
    Watch {
        /// Rules file to watch
        file: PathBuf,

        /// Level used for sample values
        #[arg(short, long, env = "STATFORGE_PREVIEW_LEVEL")]
        level: Option<u32>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            formula,
            known,
            set,
        } => cli::check(formula, known, set)?,

        Commands::Eval { formula, set } => cli::eval(formula, set)?,

        Commands::Functions => cli::functions()?,

        Commands::Validate { files, level } => cli::validate_files(files, level)?,

        Commands::Curve {
            file,
            kind,
            base_xp,
            multiplier,
            exp_base,
            formula,
            max_level,
        } => cli::curve(
            file,
            cli::CurveOptions {
                kind,
                base_xp,
                multiplier,
                exp_base,
                formula,
            },
            max_level,
        )?,

        Commands::Audit { file, stat, level } => cli::audit(file, stat, level)?,

        Commands::Watch {
            file,
            level,
            verbose,
        } => cli::watch(file, level, verbose)?,
    }

    Ok(())
}
