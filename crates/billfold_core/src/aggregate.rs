//! Per-customer aggregate types.

use billfold_error::JsonError;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A product purchased through a paid invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Product {
    /// Line type, e.g. `invoiceitem` or `subscription`.
    #[serde(rename = "type")]
    kind: String,
    /// Line amount in the smallest currency unit.
    amount: i64,
    /// Line description.
    description: Option<String>,
}

impl Product {
    /// Creates a product entry.
    pub fn new(kind: impl Into<String>, amount: i64, description: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            amount,
            description,
        }
    }
}

/// Everything known about one customer key.
///
/// Each sub-collection is a map from item id to its latest detail. Merging
/// is a key-wise upsert regardless of whether the customer entry already
/// existed, so repeated records accumulate instead of replacing each other.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Getters)]
pub struct CustomerAggregate {
    /// Customer id, set by account records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    /// Products from paid invoices, keyed by product id.
    #[serde(default)]
    products: BTreeMap<String, Product>,
    /// Active subscriptions, id to status.
    #[serde(default)]
    subscriptions: BTreeMap<String, String>,
    /// Successful payments, id to status.
    #[serde(default)]
    payments: BTreeMap<String, String>,
}

impl CustomerAggregate {
    /// Records the customer id, keeping any collected items.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Upserts products by product id.
    pub fn merge_products(&mut self, products: impl IntoIterator<Item = (String, Product)>) {
        self.products.extend(products);
    }

    /// Upserts one subscription status.
    pub fn upsert_subscription(&mut self, id: impl Into<String>, status: impl Into<String>) {
        self.subscriptions.insert(id.into(), status.into());
    }

    /// Upserts one payment status.
    pub fn upsert_payment(&mut self, id: impl Into<String>, status: impl Into<String>) {
        self.payments.insert(id.into(), status.into());
    }

    /// True when no record has contributed anything.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.products.is_empty()
            && self.subscriptions.is_empty()
            && self.payments.is_empty()
    }
}

/// Customer key to aggregate, produced fresh for every fetch cycle.
///
/// Serializes as a plain JSON object.
///
/// # Examples
///
/// ```
/// use billfold_core::AggregateResult;
///
/// let mut result = AggregateResult::default();
/// result.entry("cus_1").upsert_subscription("sub_1", "active");
/// result.entry("cus_1").upsert_subscription("sub_2", "active");
///
/// assert_eq!(result.len(), 1);
/// assert_eq!(result.get("cus_1").unwrap().subscriptions().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult(BTreeMap<String, CustomerAggregate>);

impl AggregateResult {
    /// The entry for `key`, created empty if absent.
    pub fn entry(&mut self, key: impl Into<String>) -> &mut CustomerAggregate {
        self.0.entry(key.into()).or_default()
    }

    /// Looks up a customer key.
    pub fn get(&self, key: &str) -> Option<&CustomerAggregate> {
        self.0.get(key)
    }

    /// Whether a customer key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of customer keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no record produced an entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CustomerAggregate)> {
        self.0.iter()
    }

    /// Converts to a JSON value for the policy store.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, JsonError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl IntoIterator for AggregateResult {
    type Item = (String, CustomerAggregate);
    type IntoIter = std::collections::btree_map::IntoIter<String, CustomerAggregate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_all_sub_collections() {
        let mut result = AggregateResult::default();
        result.entry("cus_1").merge_products([(
            "prod_1".to_string(),
            Product::new("invoiceitem", 500, Some("Widget".to_string())),
        )]);

        assert_eq!(
            result.to_json().unwrap(),
            json!({
                "cus_1": {
                    "products": {
                        "prod_1": {"type": "invoiceitem", "amount": 500, "description": "Widget"}
                    },
                    "subscriptions": {},
                    "payments": {}
                }
            })
        );
    }

    #[test]
    fn id_is_serialized_once_set() {
        let mut result = AggregateResult::default();
        result.entry("a@x.com").set_id("cus_1");
        let value = result.to_json().unwrap();
        assert_eq!(value["a@x.com"]["id"], json!("cus_1"));
    }

    #[test]
    fn upsert_keeps_latest_status() {
        let mut entry = CustomerAggregate::default();
        entry.upsert_payment("pi_1", "processing");
        entry.upsert_payment("pi_1", "succeeded");
        assert_eq!(entry.payments().len(), 1);
        assert_eq!(entry.payments()["pi_1"], "succeeded");
    }
}
