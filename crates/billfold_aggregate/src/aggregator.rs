//! Type-dispatching record aggregation.

use crate::parse_invoice_lines;
use billfold_core::{AggregateResult, RawRecord, RecordKind};
use tracing::{debug, instrument, trace, warn};

/// Why a record contributed nothing to the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Skip {
    /// The record has no `object` discriminator.
    #[display("record has no object discriminator")]
    MissingObject,
    /// The discriminator matches none of the aggregated kinds.
    #[display("unrecognized record kind '{}'", _0)]
    UnknownKind(String),
    /// The record's status does not pass its kind's filter.
    #[display("{} status {:?} filtered out", kind, status)]
    Status {
        /// Dispatched kind
        kind: RecordKind,
        /// Status carried by the record
        status: Option<String>,
    },
    /// A field the kind's rule needs is absent.
    #[display("{} record is missing '{}'", kind, field)]
    MissingField {
        /// Dispatched kind
        kind: RecordKind,
        /// Name of the absent field
        field: &'static str,
    },
}

/// Merges account records, invoices, subscriptions and payments into a
/// per-customer aggregate.
///
/// | Kind | Status filter | Contribution |
/// |---|---|---|
/// | customer | none | entry keyed by `email`, `id` set to the record id |
/// | invoice | `paid` | line items upserted into `products` |
/// | subscription | `active` | `{id: status}` upserted into `subscriptions` |
/// | payment_intent | `succeeded` | `{id: status}` upserted into `payments` |
///
/// Every contribution is a key-wise upsert, so repeated records for one
/// customer accumulate and an account record never discards collected
/// items.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAggregator;

impl RecordAggregator {
    /// Creates an aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Builds a fresh aggregate from `records`, in input order.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn aggregate(&self, records: &[RawRecord]) -> AggregateResult {
        let mut result = AggregateResult::default();
        self.aggregate_into(&mut result, records);
        result
    }

    /// Merges `records` into an existing aggregate.
    pub fn aggregate_into(&self, result: &mut AggregateResult, records: &[RawRecord]) {
        let mut applied = 0usize;
        for record in records {
            match self.apply(result, record) {
                Ok(_) => applied += 1,
                Err(
                    skip @ (Skip::MissingObject
                    | Skip::MissingField { .. }
                    | Skip::Status { status: None, .. }),
                ) => {
                    warn!(id = ?record.id(), reason = %skip, "Skipping malformed record");
                }
                Err(skip) => {
                    trace!(id = ?record.id(), reason = %skip, "Skipping record");
                }
            }
        }
        debug!(
            applied,
            skipped = records.len() - applied,
            customers = result.len(),
            "Aggregated records"
        );
    }

    /// Applies one record, returning the kind it was dispatched to.
    ///
    /// # Errors
    ///
    /// Returns the reason when the record contributes nothing; `result` is
    /// left untouched in that case.
    pub fn apply(&self, result: &mut AggregateResult, record: &RawRecord) -> Result<RecordKind, Skip> {
        let object = record.object().ok_or(Skip::MissingObject)?;
        let kind =
            RecordKind::classify(object).ok_or_else(|| Skip::UnknownKind(object.to_string()))?;

        if !kind.accepts_status(record.status()) {
            return Err(Skip::Status {
                kind,
                status: record.status().map(str::to_string),
            });
        }

        let missing = |field: &'static str| Skip::MissingField { kind, field };
        match kind {
            RecordKind::Customer => {
                let email = record.email().ok_or_else(|| missing("email"))?;
                let id = record.id().ok_or_else(|| missing("id"))?;
                result.entry(email).set_id(id);
            }
            RecordKind::Invoice => {
                let customer = record.customer().ok_or_else(|| missing("customer"))?;
                let products = parse_invoice_lines(record);
                result.entry(customer).merge_products(products);
            }
            RecordKind::Subscription => {
                let (customer, id, status) = item_fields(record).map_err(missing)?;
                result.entry(customer).upsert_subscription(id, status);
            }
            RecordKind::PaymentIntent => {
                let (customer, id, status) = item_fields(record).map_err(missing)?;
                result.entry(customer).upsert_payment(id, status);
            }
        }
        Ok(kind)
    }
}

/// `customer`, `id` and `status` of a record, or the first one absent.
fn item_fields(record: &RawRecord) -> Result<(&str, &str, &str), &'static str> {
    Ok((
        record.customer().ok_or("customer")?,
        record.id().ok_or("id")?,
        record.status().ok_or("status")?,
    ))
}
