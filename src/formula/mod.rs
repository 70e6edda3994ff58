//! CNF formula representation and the DIMACS exchange format

pub mod assumptions;
pub mod cnf;
pub mod dimacs;
pub mod variables;

pub use assumptions::AssumptionSet;
pub use cnf::{variable_of, Clause, Cnf, Literal};
pub use dimacs::{parse_dimacs, to_dimacs_string, write_dimacs};
pub use variables::{Elimination, VariableMap};
