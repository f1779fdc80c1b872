//! Retry policy for remote list calls.
//!
//! [`RetryPolicy`] wraps a single fallible async operation and re-invokes it
//! with randomized exponential backoff until it succeeds, fails with a
//! terminal error, or runs out of attempts. Terminal errors are those whose
//! [`RetryableError::is_retryable`](billfold_error::RetryableError) returns
//! false; they are handed back after one attempt. After the last attempt the
//! final error is returned as-is, never wrapped.
//!
//! ```rust,ignore
//! use billfold_retry::RetryPolicy;
//!
//! let page = RetryPolicy::default()
//!     .execute(|| lister.list(&params))
//!     .await?;
//! ```

mod config;
mod policy;

pub use config::RetryConfig;
pub use policy::{DEFAULT_MAX_ATTEMPTS, RetryPolicy, RetryPolicyBuilder};
