//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the billfold binary.

mod commands;
mod fetch;

pub use commands::{Cli, Commands};
pub use fetch::{FetchArgs, run_fetch};
