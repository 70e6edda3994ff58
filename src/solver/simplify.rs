//! Unit propagation over a CNF under assumptions

use crate::formula::{variable_of, AssumptionSet, Clause, Cnf};
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of unit propagation
#[derive(Debug, Clone, PartialEq)]
pub enum Simplified {
    /// The formula conjoined with the assumptions is unsatisfiable
    Contradiction,
    /// Every clause was satisfied; the remaining variables are unconstrained
    Empty { free_variables: usize },
    /// A smaller, equivalent CNF over a map with the forced variables removed
    Reduced(Cnf),
}

/// Reduce a CNF under a set of assumptions by unit propagation
///
/// Forced literals are seeded from the formula's unit clauses and from the
/// assumptions, then propagated to a fixpoint: clauses containing a forced
/// literal are dropped, literals whose negation is forced are removed, and
/// newly produced units cascade. Forced variables end up *fixed*, not free —
/// they are removed from the result's variable map, so the model count over
/// the reduced universe equals the count of the original formula restricted
/// to the forced literals.
pub fn simplify(cnf: &Cnf, assumptions: &AssumptionSet) -> Result<Simplified> {
    let total = cnf.variable_count();
    let mut forced: HashSet<i32> = HashSet::new();

    for clause in cnf.clauses() {
        if clause.is_unit() && conflicts(&mut forced, clause.literals()[0]) {
            return Ok(Simplified::Contradiction);
        }
    }
    for literal in assumptions.literals() {
        if !cnf.variables().contains_index(variable_of(literal)) {
            anyhow::bail!(
                "Assumption on unknown variable {} (map has {} variables)",
                variable_of(literal),
                total
            );
        }
        if conflicts(&mut forced, literal) {
            return Ok(Simplified::Contradiction);
        }
    }

    if forced.is_empty() {
        return Ok(if cnf.is_empty() {
            Simplified::Empty {
                free_variables: total,
            }
        } else {
            Simplified::Reduced(cnf.clone())
        });
    }

    let mut active: Vec<Clause> = cnf
        .clauses()
        .iter()
        .filter(|clause| !clause.is_unit())
        .cloned()
        .collect();

    // Propagate until a full pass adds no new forced literal. Units produced
    // mid-pass land in `forced` immediately, so each rescan sees them.
    let mut known = 0;
    while known != forced.len() {
        known = forced.len();
        let mut kept = Vec::with_capacity(active.len());
        'clauses: for clause in active.drain(..) {
            let mut dead = 0;
            for &literal in clause.literals() {
                if forced.contains(&literal) {
                    continue 'clauses;
                }
                if forced.contains(&-literal) {
                    dead += 1;
                }
            }
            if dead == 0 {
                kept.push(clause);
                continue;
            }
            let remaining: Vec<i32> = clause
                .literals()
                .iter()
                .copied()
                .filter(|literal| !forced.contains(&-literal))
                .collect();
            match remaining.len() {
                0 => return Ok(Simplified::Contradiction),
                1 => {
                    if conflicts(&mut forced, remaining[0]) {
                        return Ok(Simplified::Contradiction);
                    }
                }
                _ => kept.push(Clause::new(remaining)),
            }
        }
        active = kept;
    }

    if active.is_empty() {
        return Ok(Simplified::Empty {
            free_variables: total - forced.len(),
        });
    }

    let removed: HashSet<u32> = forced.iter().map(|&literal| variable_of(literal)).collect();
    let elimination = cnf.variables().eliminate(&removed);
    let mut translated = Vec::with_capacity(active.len());
    for clause in &active {
        let literals: Vec<i32> = clause
            .literals()
            .iter()
            .map(|&literal| {
                elimination.translate(literal).ok_or_else(|| {
                    anyhow::anyhow!("Surviving literal {} references a forced variable", literal)
                })
            })
            .collect::<Result<_>>()?;
        translated.push(Clause::new(literals));
    }
    let mut reduced = Cnf::new(Arc::new(elimination.into_variables()));
    for clause in translated {
        reduced.add_clause(clause)?;
    }
    Ok(Simplified::Reduced(reduced))
}

/// Insert a literal into the forced set; true on a unit conflict
fn conflicts(forced: &mut HashSet<i32>, literal: i32) -> bool {
    forced.insert(literal) && forced.contains(&-literal)
}
