//! Core data types for the Billfold billing fetcher.
//!
//! This crate provides the foundation data types shared by the remote
//! client, the retry layer and the aggregator: connection and request
//! parameters, the closed set of list resources, raw API records, and the
//! per-customer aggregate produced from them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod params;
mod record;
mod resource;

pub use aggregate::{AggregateResult, CustomerAggregate, Product};
pub use params::{
    ConnectionParams, ConnectionParamsBuilder, LogLevel, RequestParams, RequestParamsBuilder,
};
pub use record::{ListPage, RawRecord, RecordKind};
pub use resource::Resource;
