//! Error types for the Billfold billing fetcher.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use billfold_error::{BillfoldResult, ConfigError};
//!
//! fn load_key() -> BillfoldResult<String> {
//!     Err(ConfigError::new("api_key is required"))?
//! }
//!
//! assert!(load_key().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod fetch;
mod json;
mod remote;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{BillfoldError, BillfoldErrorKind, BillfoldResult};
pub use fetch::{FetchError, FetchErrorKind};
pub use json::JsonError;
pub use remote::{RemoteError, RemoteErrorKind, RemoteResult, RetryableError};
