//! CLI module for loopkit - a small host that runs counter loops.
//!
//! Provides subcommands to run a single loop with a chosen strategy and to
//! run one loop per strategy under a shared cancel group.

pub mod commands;

pub use commands::Cli;
