//! Model counting orchestration

use super::backend::{CountBackend, SharpSatBackend};
use super::simplify::{simplify, Simplified};
use crate::formula::{AssumptionSet, Cnf};
use anyhow::Result;
use log::{debug, warn};
use num_bigint::BigUint;
use std::fmt;
use std::time::Duration;

/// Result of a counting call
///
/// `Invalid` stands for timeout, process failure, or unreadable output. It is
/// a separate variant rather than a magic number so it can never be mistaken
/// for a count of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCount {
    /// Exact number of satisfying assignments
    Models(BigUint),
    /// The count could not be determined
    Invalid,
}

impl ModelCount {
    /// The count, unless the call failed
    pub fn models(&self) -> Option<&BigUint> {
        match self {
            ModelCount::Models(count) => Some(count),
            ModelCount::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ModelCount::Invalid)
    }

    /// Derive the ternary satisfiability verdict from this count
    pub fn verdict(&self) -> Satisfiability {
        match self {
            ModelCount::Invalid => Satisfiability::Unknown,
            ModelCount::Models(count) if *count == BigUint::from(0u32) => {
                Satisfiability::Unsatisfiable
            }
            ModelCount::Models(_) => Satisfiability::Satisfiable,
        }
    }
}

impl fmt::Display for ModelCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelCount::Models(count) => write!(f, "{}", count),
            ModelCount::Invalid => write!(f, "unknown"),
        }
    }
}

/// Ternary satisfiability verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satisfiability {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

impl fmt::Display for Satisfiability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Satisfiability::Satisfiable => write!(f, "satisfiable"),
            Satisfiability::Unsatisfiable => write!(f, "unsatisfiable"),
            Satisfiability::Unknown => write!(f, "unknown"),
        }
    }
}

/// Counts the models of a CNF, delegating the hard cases to a backend
///
/// Each call runs unit propagation under the current assumptions first.
/// Formulas decided by propagation alone never reach the backend: a
/// contradiction is exactly zero models, a clause-free remainder over `k`
/// free variables is exactly `2^k`.
pub struct ModelCounter<B = SharpSatBackend> {
    cnf: Cnf,
    assumptions: AssumptionSet,
    backend: B,
}

impl ModelCounter<SharpSatBackend> {
    /// Create a counter using the default sharpSAT executable
    pub fn new(cnf: Cnf) -> Self {
        Self::with_backend(cnf, SharpSatBackend::default())
    }
}

impl<B: CountBackend> ModelCounter<B> {
    /// Create a counter with an explicit backend
    pub fn with_backend(cnf: Cnf, backend: B) -> Self {
        Self {
            cnf,
            assumptions: AssumptionSet::new(),
            backend,
        }
    }

    /// The formula under analysis
    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// The current assumption set
    pub fn assumptions(&self) -> &AssumptionSet {
        &self.assumptions
    }

    /// Mutable access for bulk assumption updates between calls
    pub fn assumptions_mut(&mut self) -> &mut AssumptionSet {
        &mut self.assumptions
    }

    /// Force a variable to a value for subsequent calls
    pub fn assume(&mut self, variable: u32, value: bool) -> Result<()> {
        if !self.cnf.variables().contains_index(variable) {
            anyhow::bail!(
                "Cannot assume variable {} (map has {} variables)",
                variable,
                self.cnf.variable_count()
            );
        }
        self.assumptions.set(variable, value);
        Ok(())
    }

    /// Count the models of the formula under the current assumptions
    ///
    /// Never fails: any error on the way collapses to [`ModelCount::Invalid`]
    /// with the cause logged.
    pub fn count(&self, timeout: Duration) -> ModelCount {
        let simplified = match simplify(&self.cnf, &self.assumptions) {
            Ok(simplified) => simplified,
            Err(error) => {
                warn!("Simplification failed: {:#}", error);
                return ModelCount::Invalid;
            }
        };
        match simplified {
            Simplified::Contradiction => {
                debug!("Contradiction found by unit propagation");
                ModelCount::Models(BigUint::from(0u32))
            }
            Simplified::Empty { free_variables } => {
                debug!(
                    "All clauses satisfied, {} free variables remain",
                    free_variables
                );
                ModelCount::Models(BigUint::from(1u32) << free_variables)
            }
            Simplified::Reduced(reduced) => match self.backend.count(&reduced, timeout) {
                Ok(models) => ModelCount::Models(models),
                Err(error) => {
                    warn!("External counter failed: {}", error);
                    ModelCount::Invalid
                }
            },
        }
    }

    /// Decide satisfiability under the current assumptions
    pub fn is_satisfiable(&self, timeout: Duration) -> Satisfiability {
        self.count(timeout).verdict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::VariableMap;
    use crate::solver::testing::{CountingStub, Enumeration};
    use std::sync::Arc;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn cnf(variables: usize, clauses: Vec<Vec<i32>>) -> Cnf {
        Cnf::with_clauses(Arc::new(VariableMap::anonymous(variables)), clauses).unwrap()
    }

    fn models(count: u32) -> ModelCount {
        ModelCount::Models(BigUint::from(count))
    }

    #[test]
    fn test_clause_free_formula_counts_two_to_the_k() {
        let stub = CountingStub::returning(7);
        let counter = ModelCounter::with_backend(cnf(3, vec![]), &stub);

        assert_eq!(counter.count(TIMEOUT), models(8));
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_empty_formula_without_variables_has_one_model() {
        let stub = CountingStub::returning(7);
        let counter = ModelCounter::with_backend(cnf(0, vec![]), &stub);

        assert_eq!(counter.count(TIMEOUT), models(1));
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_conflicting_units_count_zero_without_backend() {
        let stub = CountingStub::returning(7);
        let counter = ModelCounter::with_backend(cnf(2, vec![vec![1], vec![-1], vec![2]]), &stub);

        assert_eq!(counter.count(TIMEOUT), models(0));
        assert_eq!(stub.calls(), 0);
        assert_eq!(
            counter.is_satisfiable(TIMEOUT),
            Satisfiability::Unsatisfiable
        );
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_assumption_contradiction_counts_zero_without_backend() {
        let stub = CountingStub::returning(7);
        let mut counter = ModelCounter::with_backend(cnf(2, vec![vec![1], vec![2]]), &stub);
        counter.assume(1, false).unwrap();

        assert_eq!(counter.count(TIMEOUT), models(0));
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_reduced_formula_reaches_backend_once() {
        let stub = CountingStub::returning(5);
        let counter = ModelCounter::with_backend(cnf(2, vec![vec![1, 2], vec![-1, -2]]), &stub);

        assert_eq!(counter.count(TIMEOUT), models(5));
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn test_backend_failure_is_invalid_not_zero() {
        let stub = CountingStub::failing();
        let counter = ModelCounter::with_backend(cnf(2, vec![vec![1, 2], vec![-1, -2]]), &stub);

        let count = counter.count(TIMEOUT);
        assert!(count.is_invalid());
        assert_eq!(count.verdict(), Satisfiability::Unknown);
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn test_assume_rejects_unknown_variable() {
        let stub = CountingStub::returning(1);
        let mut counter = ModelCounter::with_backend(cnf(2, vec![vec![1, 2]]), &stub);
        assert!(counter.assume(3, true).is_err());
        assert!(counter.assume(2, true).is_ok());
    }

    #[test]
    fn test_verdict_mapping() {
        assert_eq!(models(0).verdict(), Satisfiability::Unsatisfiable);
        assert_eq!(models(1).verdict(), Satisfiability::Satisfiable);
        assert_eq!(models(960).verdict(), Satisfiability::Satisfiable);
        assert_eq!(ModelCount::Invalid.verdict(), Satisfiability::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(models(42).to_string(), "42");
        assert_eq!(ModelCount::Invalid.to_string(), "unknown");
        assert_eq!(Satisfiability::Unknown.to_string(), "unknown");
    }

    /// `(a→b ∨ c) → ((a↔b) ∧ c)` in CNF, over a=1, b=2, c=3
    fn implication_formula() -> Cnf {
        cnf(
            3,
            vec![
                vec![1, 2, 3],
                vec![1, -2, 3],
                vec![1, -2, -3],
                vec![-1, 2, -3],
                vec![-1, -2, 3],
            ],
        )
    }

    #[test]
    fn test_implication_formula_has_three_models() {
        let counter = ModelCounter::with_backend(implication_formula(), Enumeration);
        assert_eq!(counter.count(TIMEOUT), models(3));
        assert_eq!(
            counter.is_satisfiable(TIMEOUT),
            Satisfiability::Satisfiable
        );
    }

    /// A small feature model: mandatory root, an or-group of four features,
    /// six independent optional features. 15 * 2^6 = 960 configurations.
    fn feature_model() -> Cnf {
        let variables = Arc::new(
            VariableMap::from_names([
                "root", "a1", "a2", "a3", "a4", "o1", "o2", "o3", "o4", "o5", "o6",
            ])
            .unwrap(),
        );
        let mut clauses: Vec<Vec<i32>> = vec![vec![1], vec![-1, 2, 3, 4, 5]];
        for child in 2..=11 {
            clauses.push(vec![-child, 1]);
        }
        Cnf::with_clauses(variables, clauses).unwrap()
    }

    #[test]
    fn test_feature_model_has_960_configurations() {
        let counter = ModelCounter::with_backend(feature_model(), Enumeration);
        assert_eq!(counter.count(TIMEOUT), models(960));
    }

    #[test]
    fn test_unit_clause_does_not_change_the_count() {
        // counting with the forced literal via propagation must agree with
        // exhaustive enumeration of the unsimplified formula
        let mut with_unit = cnf(4, vec![vec![-1, 2, 3], vec![2, 3, 4], vec![-2, 4]]);
        with_unit
            .add_clause(crate::formula::Clause::unit(1))
            .unwrap();

        let direct = Enumeration
            .count(&with_unit, TIMEOUT)
            .unwrap();
        let counter = ModelCounter::with_backend(with_unit.clone(), Enumeration);
        assert_eq!(counter.count(TIMEOUT), ModelCount::Models(direct));
    }

    #[test]
    fn test_assumptions_match_unit_clauses() {
        let base = cnf(4, vec![vec![-1, 2, 3], vec![2, 3, 4], vec![-2, 4]]);

        let mut assumed = ModelCounter::with_backend(base.clone(), Enumeration);
        assumed.assume(1, true).unwrap();
        assumed.assume(4, false).unwrap();

        let mut with_units = base;
        with_units
            .add_clause(crate::formula::Clause::unit(1))
            .unwrap();
        with_units
            .add_clause(crate::formula::Clause::unit(-4))
            .unwrap();
        let unit_counter = ModelCounter::with_backend(with_units, Enumeration);

        assert_eq!(assumed.count(TIMEOUT), unit_counter.count(TIMEOUT));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreachable_budget_yields_unknown_not_unsatisfiable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slow.sh");
        std::fs::write(&path, "#!/bin/sh\nsleep 30\necho 1\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        // not decidable by propagation, so the (slow) executable is reached
        let counter = ModelCounter::with_backend(
            cnf(2, vec![vec![1, 2], vec![-1, -2]]),
            SharpSatBackend::new(path),
        );
        let count = counter.count(Duration::from_millis(200));
        assert!(count.is_invalid());
        assert_eq!(count.verdict(), Satisfiability::Unknown);
    }

    #[test]
    fn test_assumptions_are_reusable_between_calls() {
        let mut counter = ModelCounter::with_backend(cnf(2, vec![vec![1, 2]]), Enumeration);

        assert_eq!(counter.count(TIMEOUT), models(3));
        counter.assume(1, false).unwrap();
        assert_eq!(counter.count(TIMEOUT), models(1));
        counter.assumptions_mut().unset_all();
        assert_eq!(counter.count(TIMEOUT), models(3));
    }
}
