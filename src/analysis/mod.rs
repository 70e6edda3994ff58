//! Analyses built on top of model counting

pub mod distribution;

pub use distribution::{variable_distribution, VariableDistribution, VariableRatio};
