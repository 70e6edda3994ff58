//! DIMACS CNF exchange format

use super::cnf::{Clause, Cnf};
use super::variables::VariableMap;
use anyhow::{Context, Result};
use itertools::Itertools;
use std::io::Write;
use std::sync::Arc;

/// Serialize a CNF to the DIMACS exchange format
///
/// Writes the problem line `p cnf <numVars> <numClauses>` followed by one
/// line per clause, literals whitespace-separated and `0`-terminated. The
/// declared variable count comes from the CNF's own variable map, so a
/// reduced formula announces its reduced universe.
pub fn write_dimacs<W: Write>(cnf: &Cnf, mut sink: W) -> std::io::Result<()> {
    writeln!(
        sink,
        "p cnf {} {}",
        cnf.variable_count(),
        cnf.clause_count()
    )?;
    for clause in cnf.clauses() {
        writeln!(sink, "{} 0", clause.literals().iter().join(" "))?;
    }
    Ok(())
}

/// Serialize a CNF to a DIMACS string
pub fn to_dimacs_string(cnf: &Cnf) -> String {
    let mut out = format!("p cnf {} {}\n", cnf.variable_count(), cnf.clause_count());
    for clause in cnf.clauses() {
        out.push_str(&clause.literals().iter().join(" "));
        out.push_str(" 0\n");
    }
    out
}

/// Parse a DIMACS CNF document
///
/// Comment lines (`c ...`) may precede the problem line; clauses may span
/// lines and several may share one. Variables get generated names `x1`..`xn`.
pub fn parse_dimacs(input: &str) -> Result<Cnf> {
    let mut lines = input.lines();

    let (variable_count, clause_count) = loop {
        let line = lines
            .next()
            .context("Missing problem line 'p cnf <vars> <clauses>'")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 4 || parts[0] != "p" || parts[1] != "cnf" {
            anyhow::bail!("Invalid problem line: '{}'", line);
        }
        let variables: usize = parts[2]
            .parse()
            .with_context(|| format!("Invalid variable count '{}'", parts[2]))?;
        let clauses: usize = parts[3]
            .parse()
            .with_context(|| format!("Invalid clause count '{}'", parts[3]))?;
        break (variables, clauses);
    };

    let variables = Arc::new(VariableMap::anonymous(variable_count));
    let mut cnf = Cnf::new(Arc::clone(&variables));
    let mut parsed_clauses = 0;
    let mut literals: Vec<i32> = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.starts_with('c') {
            continue;
        }
        for word in line.split_whitespace() {
            let literal: i32 = word
                .parse()
                .with_context(|| format!("Invalid literal '{}'", word))?;
            if literal == 0 {
                cnf.add_clause(Clause::new(std::mem::take(&mut literals)))?;
                parsed_clauses += 1;
            } else {
                literals.push(literal);
            }
        }
    }

    if !literals.is_empty() {
        anyhow::bail!("Unterminated clause at end of input: '{}'", literals.iter().join(" "));
    }
    if parsed_clauses != clause_count {
        anyhow::bail!(
            "Problem line declares {} clauses but input contains {}",
            clause_count,
            parsed_clauses
        );
    }

    Ok(cnf)
}
