//! Main CLI application for the model counting front-end

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sharp_count::{
    analysis::variable_distribution,
    config::{CliOverrides, OutputFormat, Settings},
    formula::{parse_dimacs, write_dimacs, AssumptionSet},
    solver::{simplify, ModelCounter, SharpSatBackend, Simplified},
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "sharp_count")]
#[command(about = "CNF model counting via an external #SAT solver")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count the models of a CNF formula
    #[command(allow_negative_numbers = true)]
    Count {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// DIMACS formula file (overrides config)
        #[arg(short, long)]
        formula: Option<PathBuf>,

        /// Assumption literal, e.g. 3 or -5 (repeatable)
        #[arg(short, long)]
        assume: Vec<i32>,

        /// Timeout in seconds (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Counting executable (overrides config)
        #[arg(short, long)]
        solver: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Decide satisfiability of a CNF formula
    #[command(allow_negative_numbers = true)]
    Sat {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// DIMACS formula file (overrides config)
        #[arg(short, long)]
        formula: Option<PathBuf>,

        /// Assumption literal, e.g. 3 or -5 (repeatable)
        #[arg(short, long)]
        assume: Vec<i32>,

        /// Timeout in seconds (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Counting executable (overrides config)
        #[arg(short, long)]
        solver: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Reduce a CNF formula by unit propagation and print the result
    #[command(allow_negative_numbers = true)]
    Simplify {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// DIMACS formula file (overrides config)
        #[arg(short, long)]
        formula: Option<PathBuf>,

        /// Assumption literal, e.g. 3 or -5 (repeatable)
        #[arg(short, long)]
        assume: Vec<i32>,
    },

    /// Compute the share of models in which each variable is true
    Distribution {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// DIMACS formula file (overrides config)
        #[arg(short, long)]
        formula: Option<PathBuf>,

        /// Timeout in seconds, per counting call (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Counting executable (overrides config)
        #[arg(short, long)]
        solver: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Create example configuration and input files
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Count {
            config,
            formula,
            assume,
            timeout,
            solver,
            json,
            verbose,
        } => count_command(config, formula, assume, timeout, solver, json, verbose),
        Commands::Sat {
            config,
            formula,
            assume,
            timeout,
            solver,
            json,
        } => sat_command(config, formula, assume, timeout, solver, json),
        Commands::Simplify {
            config,
            formula,
            assume,
        } => simplify_command(config, formula, assume),
        Commands::Distribution {
            config,
            formula,
            timeout,
            solver,
            json,
        } => distribution_command(config, formula, timeout, solver, json),
        Commands::Setup { directory, force } => setup_command(directory, force),
    }
}

/// Load settings, falling back to defaults when no config file exists
fn load_settings(config_path: &PathBuf) -> Result<Settings> {
    if config_path.exists() {
        Settings::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))
    } else {
        log::info!(
            "Config file {} not found, using defaults",
            config_path.display()
        );
        Ok(Settings::default())
    }
}

fn resolve_settings(
    config_path: PathBuf,
    formula: Option<PathBuf>,
    timeout: Option<u64>,
    solver: Option<PathBuf>,
    json: bool,
) -> Result<Settings> {
    let mut settings = load_settings(&config_path)?;
    settings.merge_with_cli(&CliOverrides {
        formula_file: formula,
        timeout_seconds: timeout,
        executable: solver,
        format: json.then_some(OutputFormat::Json),
    });
    settings.validate().context("Configuration validation failed")?;
    Ok(settings)
}

fn apply_assumptions(
    counter: &mut ModelCounter<SharpSatBackend>,
    literals: &[i32],
) -> Result<()> {
    for &literal in literals {
        if literal == 0 {
            anyhow::bail!("0 is not a valid assumption literal");
        }
        counter.assume(literal.unsigned_abs(), literal > 0)?;
    }
    Ok(())
}

fn count_command(
    config_path: PathBuf,
    formula: Option<PathBuf>,
    assume: Vec<i32>,
    timeout: Option<u64>,
    solver: Option<PathBuf>,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let settings = resolve_settings(config_path, formula, timeout, solver, json)?;
    let mut counter = sharp_count::counter_from_settings(&settings)?;
    apply_assumptions(&mut counter, &assume)?;

    if verbose {
        println!(
            "Formula: {} variables, {} clauses, {} assumption(s)",
            counter.cnf().variable_count(),
            counter.cnf().clause_count(),
            counter.assumptions().len()
        );
    }

    let start_time = Instant::now();
    let count = counter.count(Duration::from_secs(settings.solver.timeout_seconds));
    let elapsed = start_time.elapsed();

    match settings.output.format {
        OutputFormat::Text => {
            println!("Model count: {}", count);
            if verbose {
                println!("Counted in {:.3}s", elapsed.as_secs_f64());
            }
        }
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "models": count.models().map(|models| models.to_string()),
                "verdict": count.verdict().to_string(),
                "seconds": elapsed.as_secs_f64(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}

fn sat_command(
    config_path: PathBuf,
    formula: Option<PathBuf>,
    assume: Vec<i32>,
    timeout: Option<u64>,
    solver: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let settings = resolve_settings(config_path, formula, timeout, solver, json)?;
    let mut counter = sharp_count::counter_from_settings(&settings)?;
    apply_assumptions(&mut counter, &assume)?;

    let verdict = counter.is_satisfiable(Duration::from_secs(settings.solver.timeout_seconds));

    match settings.output.format {
        OutputFormat::Text => println!("{}", verdict),
        OutputFormat::Json => {
            let payload = serde_json::json!({ "verdict": verdict.to_string() });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}

fn simplify_command(
    config_path: PathBuf,
    formula: Option<PathBuf>,
    assume: Vec<i32>,
) -> Result<()> {
    let settings = resolve_settings(config_path, formula, None, None, false)?;
    let formula_file = &settings.input.formula_file;
    let content = std::fs::read_to_string(formula_file)
        .with_context(|| format!("Failed to read formula file: {}", formula_file.display()))?;
    let cnf = parse_dimacs(&content)
        .with_context(|| format!("Failed to parse formula file: {}", formula_file.display()))?;

    let mut assumptions = AssumptionSet::new();
    for &literal in &assume {
        if literal == 0 {
            anyhow::bail!("0 is not a valid assumption literal");
        }
        assumptions.set(literal.unsigned_abs(), literal > 0);
    }

    match simplify(&cnf, &assumptions)? {
        Simplified::Contradiction => println!("c unsatisfiable by unit propagation"),
        Simplified::Empty { free_variables } => {
            println!("c all clauses satisfied, {} free variable(s)", free_variables);
            println!("p cnf {} 0", free_variables);
        }
        Simplified::Reduced(reduced) => {
            let stdout = std::io::stdout();
            write_dimacs(&reduced, stdout.lock()).context("Failed to write reduced formula")?;
        }
    }

    Ok(())
}

fn distribution_command(
    config_path: PathBuf,
    formula: Option<PathBuf>,
    timeout: Option<u64>,
    solver: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let settings = resolve_settings(config_path, formula, timeout, solver, json)?;
    let formula_file = &settings.input.formula_file;
    let content = std::fs::read_to_string(formula_file)
        .with_context(|| format!("Failed to read formula file: {}", formula_file.display()))?;
    let cnf = parse_dimacs(&content)
        .with_context(|| format!("Failed to parse formula file: {}", formula_file.display()))?;

    let backend = SharpSatBackend::new(&settings.solver.executable);
    let distribution = variable_distribution(
        &cnf,
        &backend,
        Duration::from_secs(settings.solver.timeout_seconds),
    )
    .context("Failed to compute variable distribution")?;

    match settings.output.format {
        OutputFormat::Text => print!("{}", distribution),
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = distribution
                .ratios
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "variable": entry.variable,
                        "name": entry.name,
                        "positive": entry.positive.to_string(),
                        "ratio": entry.ratio,
                    })
                })
                .collect();
            let payload = serde_json::json!({
                "models": distribution.total.to_string(),
                "variables": entries,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    let config_dir = directory.join("config");
    let input_dir = directory.join("input");

    for dir in [&config_dir, &input_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        let mut default_settings = Settings::default();
        default_settings.input.formula_file = input_dir.join("example.dimacs");
        default_settings
            .to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    let example_path = input_dir.join("example.dimacs");
    if !example_path.exists() || force {
        std::fs::write(&example_path, EXAMPLE_FORMULA)
            .with_context(|| format!("Failed to write {}", example_path.display()))?;
        println!("Created: {}", example_path.display());
    } else {
        println!("Skipped: {} (already exists)", example_path.display());
    }

    println!("\nNext steps:");
    println!("1. Edit {}", config_path.display());
    println!("2. Run: cargo run -- count --config {}", config_path.display());

    Ok(())
}

/// `(a→b ∨ c) → ((a↔b) ∧ c)` over a, b, c — it has exactly 3 models
const EXAMPLE_FORMULA: &str = "\
c example: (a -> b or c) -> ((a <-> b) and c)
p cnf 3 5
1 2 3 0
1 -2 3 0
1 -2 -3 0
-1 2 -3 0
-1 -2 3 0
";

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "sharp_count",
            "count",
            "--formula",
            "test.dimacs",
            "--assume",
            "3",
            "--assume",
            "-5",
            "--timeout",
            "10",
        ]);

        assert!(cli.is_ok());
    }

    #[test]
    fn test_setup_command() {
        let temp_dir = tempdir().unwrap();
        let result = setup_command(temp_dir.path().to_path_buf(), false);

        assert!(result.is_ok());
        assert!(temp_dir.path().join("config/default.yaml").exists());
        assert!(temp_dir.path().join("input/example.dimacs").exists());
    }

    #[test]
    fn test_setup_skips_existing_files() {
        let temp_dir = tempdir().unwrap();
        setup_command(temp_dir.path().to_path_buf(), false).unwrap();
        let first = std::fs::read_to_string(temp_dir.path().join("config/default.yaml")).unwrap();

        setup_command(temp_dir.path().to_path_buf(), false).unwrap();
        let second = std::fs::read_to_string(temp_dir.path().join("config/default.yaml")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_example_formula_parses() {
        let cnf = parse_dimacs(EXAMPLE_FORMULA).unwrap();
        assert_eq!(cnf.variable_count(), 3);
        assert_eq!(cnf.clause_count(), 5);
    }

    #[test]
    fn test_zero_assumption_literal_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let formula_path = temp_dir.path().join("f.dimacs");
        std::fs::write(&formula_path, "p cnf 1 1\n1 0\n").unwrap();

        let mut settings = Settings::default();
        settings.input.formula_file = formula_path;
        let mut counter = sharp_count::counter_from_settings(&settings).unwrap();

        assert!(apply_assumptions(&mut counter, &[0]).is_err());
        assert!(apply_assumptions(&mut counter, &[1]).is_ok());
    }
}
