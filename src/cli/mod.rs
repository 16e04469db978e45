//! Command line interface module
//!
//! Argument parsing and the runner that executes one synchronization pass.

pub mod args;
pub mod runner;

pub use args::Args;
pub use runner::Runner;
