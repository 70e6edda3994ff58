//! CNF model counting via an external #SAT executable
//!
//! This library answers two questions about a propositional formula in
//! conjunctive normal form: how many satisfying assignments it has, and
//! whether it has at least one — optionally under a set of assumptions
//! applied for a single call. Formulas are reduced by unit propagation
//! first; whatever survives is handed to a sharpSAT-compatible executable
//! through the DIMACS exchange format.

pub mod analysis;
pub mod config;
pub mod formula;
pub mod solver;

pub use config::Settings;
pub use formula::{AssumptionSet, Clause, Cnf, VariableMap};
pub use solver::{ModelCount, ModelCounter, Satisfiability, SharpSatBackend};

use anyhow::{Context, Result};
use std::time::Duration;

/// Count the models of the formula configured in `settings`
pub fn count_models(settings: &Settings) -> Result<ModelCount> {
    let counter = counter_from_settings(settings)?;
    Ok(counter.count(Duration::from_secs(settings.solver.timeout_seconds)))
}

/// Build a counter for the formula and executable configured in `settings`
pub fn counter_from_settings(settings: &Settings) -> Result<ModelCounter<SharpSatBackend>> {
    let formula_file = &settings.input.formula_file;
    let content = std::fs::read_to_string(formula_file)
        .with_context(|| format!("Failed to read formula file: {}", formula_file.display()))?;
    let cnf = formula::parse_dimacs(&content)
        .with_context(|| format!("Failed to parse formula file: {}", formula_file.display()))?;
    let backend = SharpSatBackend::new(&settings.solver.executable);
    Ok(ModelCounter::with_backend(cnf, backend))
}
