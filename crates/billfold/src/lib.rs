//! Billfold - Stripe billing records folded into per-customer aggregates
//!
//! Billfold lists one page of a Stripe resource under a retry policy and
//! merges the heterogeneous records it gets back (customers, invoices,
//! subscriptions, payment intents) into a single JSON-serializable view
//! keyed by customer.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use billfold::{BillfoldConfig, StripeFetchProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BillfoldConfig::load()?;
//!     let provider = StripeFetchProvider::new(config.event("Invoice"))?;
//!
//!     let aggregate = provider.fetch_and_process().await;
//!     println!("{}", aggregate.to_json()?);
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `otel` - Export tracing spans through OpenTelemetry (stdout exporter)
//!
//! # Architecture
//!
//! Billfold is organized as a workspace with focused crates:
//!
//! - `billfold_error` - Error types
//! - `billfold_core` - Core data types (parameters, records, aggregates)
//! - `billfold_interface` - `ResourceLister` trait definition
//! - `billfold_retry` - Retry policy with jittered exponential backoff
//! - `billfold_stripe` - Stripe client, resource registry and fetcher
//! - `billfold_aggregate` - Record aggregation
//!
//! This crate (`billfold`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod observability;
mod provider;

pub use billfold_aggregate::*;
pub use billfold_core::*;
pub use billfold_error::*;
pub use billfold_interface::*;
pub use billfold_retry::*;
pub use billfold_stripe::*;

pub use config::{BillfoldConfig, FetchEvent, FetcherConfig, PROVIDER_NAME};
pub use observability::{
    ObservabilityConfig, init_observability, init_observability_with_config,
    shutdown_observability, with_bootstrap_logging,
};
pub use provider::StripeFetchProvider;
