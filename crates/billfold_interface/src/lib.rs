//! Trait definitions for the Billfold billing fetcher.
//!
//! This crate defines the capability the fetcher needs from a remote
//! billing client: listing one page of a single resource.

mod traits;

pub use traits::ResourceLister;
