use crate::core::dependencies::{base_stat_preview, StatDependencyGraph};
use crate::core::formula::{evaluate, extract_variables, validate, FunctionKind, ValidationResult};
use crate::core::report::{validate_model, ModelReport};
use crate::core::stats::{find_dependent_stats, preview_values, validate_stat_formula};
use crate::core::xp_curve::{generate_previews, validate_curve};
use crate::error::{StatforgeError, StatforgeResult};
use crate::parser;
use crate::types::{LevelUpRules, ProgressionModel, XpCurveDefinition, XpCurveKind};
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::info;

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let rounded = (n * 1e6).round() / 1e6;
    let text = format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string();
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

/// Parse a `NAME=VALUE` binding from the command line
pub fn parse_binding(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{s}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((name.to_string(), value))
}

fn print_result(result: &ValidationResult) {
    match (result.is_valid(), result.error_message()) {
        (true, _) => match result.sample_result() {
            Some(sample) => println!(
                "   {} Valid (sample: {})",
                "✅".green(),
                format_number(sample).bold().green()
            ),
            None => println!("   {} Valid", "✅".green()),
        },
        (false, Some(message)) => println!("   {} {}", "❌".red(), message.red()),
        (false, None) => println!("   {} Invalid", "❌".red()),
    }
}

/// Execute the check command
pub fn check(
    formula: String,
    known: Vec<String>,
    bindings: Vec<(String, f64)>,
) -> StatforgeResult<()> {
    println!("{}", "🔍 Statforge - Formula Check".bold().green());
    println!("   Formula: {}\n", formula.bright_yellow());

    let names: Vec<&str> = known
        .iter()
        .map(String::as_str)
        .chain(bindings.iter().map(|(name, _)| name.as_str()))
        .collect();

    let test_values: HashMap<String, f64> = bindings.iter().cloned().collect();
    let test_values = (!test_values.is_empty()).then_some(test_values);

    let variables = extract_variables(&formula);
    if !variables.is_empty() {
        println!("   Variables: {}", variables.join(", ").cyan());
    }

    let result = validate(&formula, names, test_values.as_ref());
    print_result(&result);

    match result.error_message() {
        Some(message) => Err(StatforgeError::Validation(message.to_string())),
        None => Ok(()),
    }
}

/// Execute the eval command
pub fn eval(formula: String, bindings: Vec<(String, f64)>) -> StatforgeResult<()> {
    let variables: HashMap<String, f64> = bindings.into_iter().collect();
    info!(%formula, bindings = variables.len(), "evaluating formula");

    let value = evaluate(&formula, &variables)?;
    println!("{}", format_number(value));
    Ok(())
}

/// Execute the functions command
pub fn functions() -> StatforgeResult<()> {
    println!("{}", "📚 Statforge - Built-in Functions".bold().green());
    println!();
    for function in FunctionKind::ALL {
        let arity = match function.arity() {
            1 => "(x)",
            _ => "(a, b)",
        };
        println!("   {}{}", function.name().bright_blue().bold(), arity);
    }
    println!();
    println!(
        "   Names are case-insensitive. Reserved variables: {}",
        "Level, BaseValue".cyan()
    );
    Ok(())
}

fn with_preview_level(mut model: ProgressionModel, level: Option<u32>) -> ProgressionModel {
    if let Some(level) = level {
        model.preview_level = level;
    }
    model
}

/// Execute the validate command on one or more rules files
pub fn validate_files(files: Vec<PathBuf>, preview_level: Option<u32>) -> StatforgeResult<()> {
    let mut failed = Vec::new();

    for file in &files {
        if let Err(e) = validate_single_file(file, preview_level) {
            failed.push(format!("{}: {}", file.display(), e));
        }
        println!();
    }

    if failed.is_empty() {
        if files.len() > 1 {
            println!(
                "{}",
                format!("✅ All {} files are valid!", files.len())
                    .bold()
                    .green()
            );
        }
        Ok(())
    } else {
        Err(StatforgeError::Validation(format!(
            "{} of {} files failed validation:\n{}",
            failed.len(),
            files.len(),
            failed.join("\n")
        )))
    }
}

fn validate_single_file(file: &Path, preview_level: Option<u32>) -> StatforgeResult<()> {
    println!("{}", "✅ Validating rules".bold().green());
    println!("   File: {}\n", file.display());

    let model = with_preview_level(parser::parse_model(file)?, preview_level);
    info!(file = %file.display(), level = model.preview_level, "validating rules file");

    if model.stats.is_empty() && model.skills.is_empty() {
        println!("{}", "⚠️  No stats or skills found in rules file".yellow());
    } else {
        println!(
            "   Found {} stats, {} skills (preview level {})",
            model.stats.len(),
            model.skills.len(),
            model.preview_level
        );
    }
    print_level_up(&model.level_up);

    let report = validate_model(&model);
    print_report(&report);

    let errors = report.errors();
    if errors.is_empty() {
        println!("\n{}", "✅ All formulas are valid!".bold().green());
        Ok(())
    } else {
        println!(
            "\n{}",
            format!("❌ Found {} formula errors!", errors.len())
                .bold()
                .red()
        );
        for error in &errors {
            println!("   {}", error.red());
        }
        Err(StatforgeError::Validation(format!(
            "{} formula errors",
            errors.len()
        )))
    }
}

fn print_level_up(rules: &LevelUpRules) {
    println!(
        "   Level up: {} stat points, {} skill points",
        rules.stat_points_per_level, rules.skill_points_per_level
    );
    if !rules.bonus_rule_description.is_empty() {
        println!("   Bonus: {}", rules.bonus_rule_description);
    }
}

fn print_report(report: &ModelReport) {
    if !report.stats.is_empty() {
        println!("\n{}", "📊 Stats:".bold().cyan());
        for stat in &report.stats {
            println!(
                "   {} = {}",
                stat.stat.bright_blue().bold(),
                stat.formula.bright_yellow()
            );
            print_result(&stat.result);
        }
    }

    if !report.skills.is_empty() {
        println!("\n{}", "✨ Skills:".bold().cyan());
        for skill in &report.skills {
            println!("   {}", skill.skill.bright_blue().bold());
            for (kind, result) in &skill.results {
                if result.is_valid() && result.sample_result().is_none() {
                    continue;
                }
                print!("   {:>15}:", kind.to_string());
                print_result(result);
            }
        }
    }

    if let Some(order) = &report.resolution_order {
        println!("\n{}", "🔗 Resolution order:".bold().cyan());
        println!("   {}", order.join(" → "));
    }
}

/// XP curve overrides from the command line
#[derive(Debug, Default, Clone)]
pub struct CurveOptions {
    pub kind: Option<XpCurveKind>,
    pub base_xp: Option<f64>,
    pub multiplier: Option<f64>,
    pub exp_base: Option<f64>,
    pub formula: Option<String>,
}

impl CurveOptions {
    fn apply(self, mut curve: XpCurveDefinition) -> XpCurveDefinition {
        if let Some(kind) = self.kind {
            curve.kind = kind;
        }
        if let Some(base_xp) = self.base_xp {
            curve.base_xp = base_xp;
        }
        if let Some(multiplier) = self.multiplier {
            curve.linear_multiplier = multiplier;
        }
        if let Some(exp_base) = self.exp_base {
            curve.exponential_base = exp_base;
        }
        if let Some(formula) = self.formula {
            // a formula without an explicit kind means a custom curve
            if self.kind.is_none() {
                curve.kind = XpCurveKind::CustomFormula;
            }
            curve.formula = formula;
        }
        curve
    }
}

/// Execute the curve command
pub fn curve(file: Option<PathBuf>, options: CurveOptions, max_level: u32) -> StatforgeResult<()> {
    let (base, preview_level) = match &file {
        Some(path) => {
            let model = parser::parse_model(path)?;
            (model.xp_curve, model.preview_level)
        }
        None => (XpCurveDefinition::default(), ProgressionModel::default().preview_level),
    };
    let curve = options.apply(base);

    println!("{}", "📈 Statforge - XP Curve".bold().green());
    if let Some(path) = &file {
        println!("   File: {}", path.display());
    }
    match curve.kind {
        XpCurveKind::Linear => println!(
            "   Linear: {} + (Level - 1) * {}",
            format_number(curve.base_xp),
            format_number(curve.linear_multiplier)
        ),
        XpCurveKind::Exponential => println!(
            "   Exponential: {} * {}^(Level - 1)",
            format_number(curve.base_xp),
            format_number(curve.exponential_base)
        ),
        XpCurveKind::CustomFormula => {
            println!("   Formula: {}", curve.formula.bright_yellow());
            let result = validate_curve(&curve, preview_level);
            if let Some(message) = result.error_message() {
                println!(
                    "   {} {} (falling back to Level * 100)",
                    "⚠️".yellow(),
                    message.yellow()
                );
            }
        }
    }
    println!();

    println!(
        "   {:>5}  {:>14}  {:>16}",
        "Level".bold(),
        "XP Required".bold(),
        "Total XP".bold()
    );
    println!("   {}", "─".repeat(39));
    for row in generate_previews(&curve, max_level) {
        println!(
            "   {:>5}  {:>14}  {:>16}",
            row.level, row.xp_required, row.total_xp
        );
    }
    Ok(())
}

/// Execute the audit command for one stat
pub fn audit(file: PathBuf, stat_name: String, preview_level: Option<u32>) -> StatforgeResult<()> {
    println!("{}", "🔍 Statforge - Stat Audit".bold().green());
    println!("   File: {}", file.display());
    println!("   Stat: {}\n", stat_name.bright_blue().bold());

    let model = with_preview_level(parser::parse_model(&file)?, preview_level);
    let stat = model
        .stat(&stat_name)
        .ok_or_else(|| StatforgeError::Validation(format!("Stat '{}' not found", stat_name)))?;

    println!("{}", "📋 Stat Information:".bold().cyan());
    if !stat.description.is_empty() {
        println!("   Description: {}", stat.description);
    }
    match stat.formula_text() {
        Some(formula) => {
            println!("   Type: {}", "derived".cyan());
            println!("   Formula: {}", formula.bright_yellow());
            let result = validate_stat_formula(stat, &model.stats, model.preview_level);
            print!("   At level {}:", model.preview_level);
            print_result(&result);
        }
        None => {
            println!("   Type: {}", "base".cyan());
            println!(
                "   At level {}: {}",
                model.preview_level,
                format_number(base_stat_preview(stat, model.preview_level))
                    .bold()
                    .green()
            );
        }
    }
    println!();

    let graph = StatDependencyGraph::build(&model.stats);
    let values = preview_values(&model.stats, model.preview_level);
    let describe = |name: &String| match values.get(name) {
        Some(v) => format!("{} ({})", name.bright_blue(), format_number(*v)),
        None => name.bright_blue().to_string(),
    };

    println!("{}", "🌳 References:".bold().cyan());
    let references = graph.dependencies_of(&stat.name);
    if references.is_empty() {
        println!("   No stat references");
    } else {
        for name in &references {
            println!("   └─ {}", describe(name));
        }
    }
    println!();

    println!("{}", "⬆️  Used by:".bold().cyan());
    let direct = find_dependent_stats(stat, &model.stats);
    let all = graph.dependents_of(&stat.name);
    if all.is_empty() {
        println!("   No dependent stats");
    } else {
        for name in &all {
            let marker = if direct.iter().any(|d| &d.name == name) {
                "direct"
            } else {
                "indirect"
            };
            println!("   └─ {} [{}]", describe(name), marker.dimmed());
        }
    }
    println!();

    println!("{}", "🧮 Resolution order:".bold().cyan());
    match graph.resolution_order() {
        Ok(order) => println!("   {}", order.join(" → ")),
        Err(e) => println!("   {} {}", "❌".red(), e),
    }

    println!();
    println!("{}", "✅ Audit complete".bold().green());
    Ok(())
}

/// Execute the watch command: re-validate a rules file on every change
pub fn watch(file: PathBuf, preview_level: Option<u32>, verbose: bool) -> StatforgeResult<()> {
    println!("{}", "👁️  Statforge - Watch Mode".bold().green());
    println!("   Watching: {}", file.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !file.exists() {
        return Err(StatforgeError::Validation(format!(
            "File not found: {}",
            file.display()
        )));
    }

    let canonical_path = file.canonicalize()?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| StatforgeError::Validation("Cannot determine parent directory".to_string()))?;

    let (tx, rx) = channel();

    // debounce so an editor save produces a single run
    let mut debouncer = new_debouncer(Duration::from_millis(200), tx)
        .map_err(|e| StatforgeError::Validation(format!("Failed to create file watcher: {}", e)))?;

    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| StatforgeError::Validation(format!("Failed to watch directory: {}", e)))?;

    if verbose {
        println!(
            "   {} {}",
            "Watching directory:".cyan(),
            parent_dir.display()
        );
    }

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(&file, preview_level, verbose);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && is_same_file(&event.path, &canonical_path)
                });

                if relevant {
                    if verbose {
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    println!("\n{}", "🔄 Change detected".cyan());
                    info!(file = %file.display(), "rules file changed");
                    run_watch_action(&file, preview_level, verbose);
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

fn is_same_file(event_path: &Path, watched: &Path) -> bool {
    if let Ok(canonical) = event_path.canonicalize() {
        return canonical == watched;
    }
    // deleted or renamed files cannot be canonicalized
    event_path.file_name().is_some() && event_path.file_name() == watched.file_name()
}

fn run_watch_action(file: &Path, preview_level: Option<u32>, verbose: bool) {
    match validate_internal(file, preview_level, verbose) {
        Ok(()) => println!("{}", "✅ Validation passed".bold().green()),
        Err(e) => println!("{} {}", "❌ Validation failed:".bold().red(), e),
    }
}

/// Validation without the per-formula listing, for watch mode
fn validate_internal(file: &Path, preview_level: Option<u32>, verbose: bool) -> StatforgeResult<()> {
    let model = with_preview_level(parser::parse_model(file)?, preview_level);

    if verbose {
        println!(
            "   Found {} stats, {} skills",
            model.stats.len(),
            model.skills.len()
        );
    }

    let errors = validate_model(&model).errors();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(StatforgeError::Validation(format!(
            "{} formula errors:\n  {}",
            errors.len(),
            errors.join("\n  ")
        )))
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
