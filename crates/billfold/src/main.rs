//! Billfold CLI binary.
//!
//! Fetches one page of a Stripe resource and prints the per-customer
//! aggregate as JSON.

use billfold::{
    BillfoldConfig, init_observability_with_config, shutdown_observability,
    with_bootstrap_logging,
};
use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, FetchArgs, run_fetch};

    // BILLFOLD__* overrides may live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let bootstrap_level = if cli.verbose { "debug" } else { "warn" };
    let config = with_bootstrap_logging(bootstrap_level, || match &cli.config {
        Some(path) => BillfoldConfig::from_file(path),
        None => BillfoldConfig::load(),
    })?;

    let mut observability = config.observability().clone();
    if cli.verbose {
        observability = observability.with_log_level("debug");
    }
    init_observability_with_config(&observability)?;

    match cli.command {
        Commands::Fetch {
            resource,
            expand,
            limit,
            account,
            pretty,
        } => {
            let args = FetchArgs {
                resource,
                expand,
                limit,
                account,
                pretty,
            };
            run_fetch(config, args).await?;
        }
    }

    shutdown_observability();
    Ok(())
}
