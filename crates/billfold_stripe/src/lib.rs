//! Stripe list client and resource fetcher.
//!
//! - [`StripeClient`] issues authenticated list calls over HTTPS and maps
//!   API failures to typed [`RemoteError`](billfold_error::RemoteError)s.
//! - [`ResourceRegistry`] maps each supported
//!   [`Resource`](billfold_core::Resource) to the lister that serves it.
//! - [`ResourceFetcher`] resolves a resource name, runs one list call under
//!   the retry policy and downgrades every failure to an empty result plus
//!   a diagnostic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod fetcher;
mod lister;
mod registry;

pub use client::{ClientConfig, DEFAULT_BASE_URL, RequestMetrics, StripeClient};
pub use fetcher::{FetchOutcome, FetchReport, ResourceFetcher};
pub use lister::StripeResource;
pub use registry::ResourceRegistry;
