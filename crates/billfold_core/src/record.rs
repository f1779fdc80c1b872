//! Raw API records and list pages.

use billfold_error::JsonError;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One loosely-typed item returned by a list call.
///
/// Records are JSON objects carrying at least an `object` discriminator and
/// an `id`. Most kinds also reference a `customer` and carry a `status`.
///
/// # Examples
///
/// ```
/// use billfold_core::RawRecord;
/// use serde_json::json;
///
/// let record = RawRecord::try_from(json!({
///     "object": "subscription",
///     "id": "sub_1",
///     "customer": "cus_1",
///     "status": "active"
/// }))
/// .unwrap();
///
/// assert_eq!(record.object(), Some("subscription"));
/// assert_eq!(record.customer(), Some("cus_1"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wraps a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A field that holds a string; `None` when absent, null or not a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Kind discriminator.
    pub fn object(&self) -> Option<&str> {
        self.str_field("object")
    }

    /// Record identifier.
    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    /// Lifecycle status.
    pub fn status(&self) -> Option<&str> {
        self.str_field("status")
    }

    /// Contact address of an account record.
    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    /// Owning customer id.
    ///
    /// Accepts both the plain id and an expanded customer object.
    pub fn customer(&self) -> Option<&str> {
        match self.0.get("customer")? {
            Value::String(id) => Some(id),
            Value::Object(expanded) => expanded.get("id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// The underlying JSON object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for RawRecord {
    type Error = JsonError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(JsonError::new(format!(
                "expected a JSON object for a record, got {}",
                other
            ))),
        }
    }
}

/// The decoded body of one list call.
///
/// # Examples
///
/// ```
/// use billfold_core::ListPage;
///
/// let page: ListPage = serde_json::from_str(
///     r#"{"object": "list", "url": "/v1/customers", "has_more": true, "data": [{"id": "cus_1"}]}"#,
/// )
/// .unwrap();
///
/// assert_eq!(page.data().len(), 1);
/// assert!(*page.has_more());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters)]
pub struct ListPage {
    /// Records on this page.
    #[serde(default)]
    data: Vec<RawRecord>,

    /// Whether the server holds records beyond this page.
    #[serde(default)]
    has_more: bool,

    /// Collection URL echoed by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl ListPage {
    /// Creates a page from records.
    pub fn new(data: Vec<RawRecord>, has_more: bool) -> Self {
        Self {
            data,
            has_more,
            url: None,
        }
    }

    /// Takes the records, dropping the page metadata.
    pub fn into_data(self) -> Vec<RawRecord> {
        self.data
    }
}

/// Record kinds the aggregator folds into customer entries.
///
/// Variants are declared in dispatch priority order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    /// Account record; keys the customer by contact address.
    Customer,
    /// Invoice; contributes purchased products.
    Invoice,
    /// Subscription; contributes active subscriptions.
    Subscription,
    /// Payment intent; contributes successful payments.
    PaymentIntent,
}

impl RecordKind {
    /// Substring that identifies this kind in an `object` discriminator.
    pub fn needle(self) -> &'static str {
        match self {
            RecordKind::Customer => "customer",
            RecordKind::Invoice => "invoice",
            RecordKind::Subscription => "subscription",
            RecordKind::PaymentIntent => "payment_intent",
        }
    }

    /// Status a record of this kind must carry to contribute, if any.
    pub fn required_status(self) -> Option<&'static str> {
        match self {
            RecordKind::Customer => None,
            RecordKind::Invoice => Some("paid"),
            RecordKind::Subscription => Some("active"),
            RecordKind::PaymentIntent => Some("succeeded"),
        }
    }

    /// Whether `status` passes this kind's filter.
    ///
    /// Comparison is an exact, ASCII case-insensitive match, so `"unpaid"`
    /// does not pass the invoice filter.
    pub fn accepts_status(self, status: Option<&str>) -> bool {
        match self.required_status() {
            None => true,
            Some(required) => status.is_some_and(|s| s.trim().eq_ignore_ascii_case(required)),
        }
    }

    /// Dispatches a discriminator to the first kind whose needle it contains.
    ///
    /// # Examples
    ///
    /// ```
    /// use billfold_core::RecordKind;
    ///
    /// assert_eq!(RecordKind::classify("Invoice"), Some(RecordKind::Invoice));
    /// assert_eq!(RecordKind::classify("customer_invoice"), Some(RecordKind::Customer));
    /// assert_eq!(RecordKind::classify("charge.refund"), None);
    /// ```
    pub fn classify(object: &str) -> Option<Self> {
        use strum::IntoEnumIterator;

        let object = object.to_ascii_lowercase();
        Self::iter().find(|kind| object.contains(kind.needle()))
    }
}
