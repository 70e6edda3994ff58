//! Per-variable model distribution

use crate::formula::Cnf;
use crate::solver::{CountBackend, ModelCount, ModelCounter};
use anyhow::{Context, Result};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rayon::prelude::*;
use std::fmt;
use std::time::Duration;

/// For each variable, the share of models in which it is assigned true
///
/// Each probe is an independent counting call with its own assumption set,
/// temporary file, and child process, so probes run in parallel.
#[derive(Debug, Clone)]
pub struct VariableDistribution {
    pub total: BigUint,
    pub ratios: Vec<VariableRatio>,
}

#[derive(Debug, Clone)]
pub struct VariableRatio {
    pub variable: u32,
    pub name: String,
    /// Models in which the variable is true
    pub positive: BigUint,
    /// `positive / total`
    pub ratio: f64,
}

/// Compute the true-ratio of every variable of `cnf`
///
/// Fails if the total count or any per-variable count comes back invalid;
/// a distribution with holes is worse than none.
pub fn variable_distribution<B>(
    cnf: &Cnf,
    backend: &B,
    timeout: Duration,
) -> Result<VariableDistribution>
where
    B: CountBackend + Sync,
{
    let total = match ModelCounter::with_backend(cnf.clone(), backend).count(timeout) {
        ModelCount::Models(total) => total,
        ModelCount::Invalid => anyhow::bail!("Total model count is unavailable"),
    };
    if total == BigUint::from(0u32) {
        anyhow::bail!("Formula has no models, distribution is undefined");
    }

    let ratios = (1..=cnf.variable_count() as u32)
        .into_par_iter()
        .map(|variable| {
            let mut counter = ModelCounter::with_backend(cnf.clone(), backend);
            counter.assume(variable, true)?;
            let positive = match counter.count(timeout) {
                ModelCount::Models(positive) => positive,
                ModelCount::Invalid => anyhow::bail!(
                    "Count under assumption {}=true is unavailable",
                    variable
                ),
            };
            let name = cnf
                .variables()
                .name_of(variable)
                .with_context(|| format!("Variable {} has no name", variable))?
                .to_string();
            Ok(VariableRatio {
                variable,
                name,
                ratio: ratio(&positive, &total),
                positive,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(VariableDistribution { total, ratios })
}

/// `positive / total` at fixed precision, avoiding float overflow on huge counts
fn ratio(positive: &BigUint, total: &BigUint) -> f64 {
    const SCALE: u64 = 1_000_000_000;
    let scaled = positive * SCALE / total;
    scaled.to_u64().map_or(1.0, |s| s as f64 / SCALE as f64)
}

impl fmt::Display for VariableDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variable Distribution ({} models):", self.total)?;
        for entry in &self.ratios {
            writeln!(
                f,
                "  {}: {} ({:.1}%)",
                entry.name,
                entry.positive,
                entry.ratio * 100.0
            )?;
        }
        Ok(())
    }
}
