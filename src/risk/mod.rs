//! Risk scoring and recommendation rules.
//!
//! Both functions here are pure and total: no I/O, no clock, no randomness.
//! The orchestrator relies on that to recompute results locally when a
//! collaborator fails.

mod recommendations;
mod scoring;

pub use recommendations::recommend;
pub use scoring::{score, vulnerability_multiplier};
