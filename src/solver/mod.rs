//! Unit propagation, external counter invocation, and orchestration

pub mod backend;
pub mod counter;
pub mod simplify;

pub use backend::{BackendError, CountBackend, SharpSatBackend};
pub use counter::{ModelCount, ModelCounter, Satisfiability};
pub use simplify::{simplify, Simplified};
