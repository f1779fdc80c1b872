//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Billfold - Stripe billing records folded into per-customer aggregates
#[derive(Parser, Debug)]
#[command(name = "billfold")]
#[command(about = "Fetch Stripe billing records and aggregate them per customer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file, replacing the default lookup
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one resource and print its aggregate as JSON
    Fetch {
        /// Resource name, e.g. Customer, Invoice, Subscription, PaymentIntent
        resource: String,

        /// Field paths to expand inline (repeatable)
        #[arg(long)]
        expand: Vec<String>,

        /// Page size for the list call (1-100)
        #[arg(long)]
        limit: Option<u32>,

        /// Connected account to act on behalf of
        #[arg(long)]
        account: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}
