//! Folds raw billing records into a per-customer aggregate.
//!
//! Records are dispatched by their `object` discriminator to one of four
//! rules (account, invoice, subscription, payment), filtered by status and
//! merged into an [`AggregateResult`](billfold_core::AggregateResult).
//! Records of any other kind are skipped.
//!
//! ```
//! use billfold_aggregate::RecordAggregator;
//! use billfold_core::RawRecord;
//! use serde_json::json;
//!
//! let records = vec![RawRecord::try_from(json!({
//!     "object": "subscription",
//!     "id": "sub_1",
//!     "customer": "cus_1",
//!     "status": "active"
//! }))
//! .unwrap()];
//!
//! let result = RecordAggregator::new().aggregate(&records);
//! assert_eq!(result.get("cus_1").unwrap().subscriptions()["sub_1"], "active");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregator;
mod lines;

pub use aggregator::{RecordAggregator, Skip};
pub use lines::parse_invoice_lines;
