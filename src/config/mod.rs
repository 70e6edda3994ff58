//! Configuration management

pub mod settings;

pub use settings::{CliOverrides, OutputFormat, Settings, SolverConfig};
