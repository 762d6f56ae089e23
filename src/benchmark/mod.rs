//! Benchmark phase execution and statistics

pub mod runner;
pub mod stats;

pub use runner::Runner;
pub use stats::{PhaseResult, PhaseStats};
