//! Clause and CNF representation

use super::VariableMap;
use anyhow::Result;
use itertools::Itertools;
use std::sync::Arc;

/// A literal is a non-zero signed integer: the magnitude is a variable index,
/// the sign is the polarity.
pub type Literal = i32;

/// Variable index of a literal
pub fn variable_of(literal: Literal) -> u32 {
    literal.unsigned_abs()
}

/// Represents a CNF clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    /// Create a new clause from literals, dropping duplicates but keeping order
    pub fn new(literals: Vec<Literal>) -> Self {
        Self {
            literals: literals.into_iter().unique().collect(),
        }
    }

    /// Create a unit clause (single literal)
    pub fn unit(literal: Literal) -> Self {
        Self {
            literals: vec![literal],
        }
    }

    /// Create a binary clause (two literals)
    pub fn binary(lit1: Literal, lit2: Literal) -> Self {
        Self::new(vec![lit1, lit2])
    }

    /// The literals of this clause in insertion order
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Number of literals
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Check if clause is empty (unsatisfiable)
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Check if clause is unit
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    /// A clause containing a variable in both polarities is always satisfied
    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .any(|&literal| self.literals.contains(&-literal))
    }
}

/// A propositional formula in conjunctive normal form
///
/// Owns an ordered clause list and shares its [`VariableMap`] — the map
/// outlives any single CNF derived from it, so reduced views and the original
/// formula can coexist without copying names around.
#[derive(Debug, Clone, PartialEq)]
pub struct Cnf {
    variables: Arc<VariableMap>,
    clauses: Vec<Clause>,
}

impl Cnf {
    /// Create an empty CNF over the given variables
    pub fn new(variables: Arc<VariableMap>) -> Self {
        Self {
            variables,
            clauses: Vec::new(),
        }
    }

    /// Create a CNF from raw literal lists
    pub fn with_clauses<I>(variables: Arc<VariableMap>, clauses: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<Literal>>,
    {
        let mut cnf = Self::new(variables);
        for literals in clauses {
            cnf.add_clause(Clause::new(literals))?;
        }
        Ok(cnf)
    }

    /// Add a clause, validating its literals against the variable map
    ///
    /// Tautological clauses are always satisfied and are dropped on the spot.
    pub fn add_clause(&mut self, clause: Clause) -> Result<()> {
        if clause.is_empty() {
            anyhow::bail!("Cannot add empty clause (unsatisfiable)");
        }
        for &literal in clause.literals() {
            if literal == 0 {
                anyhow::bail!("Literal 0 is not allowed in a clause");
            }
            if !self.variables.contains_index(variable_of(literal)) {
                anyhow::bail!(
                    "Literal {} references unknown variable (map has {} variables)",
                    literal,
                    self.variables.variable_count()
                );
            }
        }
        if clause.is_tautology() {
            log::debug!("Dropping tautological clause {:?}", clause.literals());
            return Ok(());
        }
        self.clauses.push(clause);
        Ok(())
    }

    /// The clauses of this formula
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// The variable map this formula is expressed against
    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    /// A shared handle on the variable map
    pub fn shared_variables(&self) -> Arc<VariableMap> {
        Arc::clone(&self.variables)
    }

    /// Number of variables in the map (not just those referenced by clauses)
    pub fn variable_count(&self) -> usize {
        self.variables.variable_count()
    }

    /// Number of clauses
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Check whether the formula has no clauses
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}
