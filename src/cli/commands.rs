//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: drive a counter loop with one strategy
//! - group: run every strategy at once and cancel them together

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// loopkit - run a counter under a loop strategy
#[derive(Parser, Debug)]
#[command(name = "loopkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Iteration strategy selectable from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// No delay, cancellation polled each iteration
    Busy,
    /// Fixed delay, cancellation ends the delay
    Throttled,
    /// Fixed delay, cancellation re-armed and seen by the loop condition
    Reinterrupt,
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a counter loop until it terminates, fails, or is cancelled
    Run {
        /// Iteration strategy
        #[arg(short, long, value_enum, default_value_t = Strategy::Throttled)]
        strategy: Strategy,

        /// Stop after this many milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Stop once the counter reaches this value
        #[arg(short, long)]
        until: Option<u64>,

        /// Delay between iterations (throttled strategies)
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Cancel the loop after this many milliseconds
        #[arg(long)]
        cancel_after_ms: Option<u64>,

        /// Make the unit of work fail on this call
        #[arg(long)]
        fail_on: Option<u64>,

        /// Return the failure instead of containing it
        #[arg(long)]
        propagate: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one counter per strategy and cancel them all from a canceller loop
    Group {
        /// When the canceller fires, in milliseconds
        #[arg(short, long, default_value_t = 2500)]
        after_ms: u64,

        /// Delay between iterations for the throttled counters
        #[arg(short, long, default_value_t = 500)]
        interval_ms: u64,

        /// Busy counter stops on its own at this value
        #[arg(short = 'n', long, default_value_t = 10)]
        threshold: u64,
    },
}
