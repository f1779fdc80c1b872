//! The closed set of list resources the fetcher knows how to call.

use billfold_error::{FetchError, FetchErrorKind};

/// A billing API resource that supports a `list` call.
///
/// Names parse case-insensitively in either the SDK class form
/// (`"PaymentIntent"`) or the snake case form (`"payment_intent"`).
///
/// # Examples
///
/// ```
/// use billfold_core::Resource;
///
/// let resource = Resource::parse("Customer").unwrap();
/// assert_eq!(resource, Resource::Customer);
/// assert_eq!(resource.path(), "customers");
///
/// assert_eq!(Resource::parse("payment_intent").unwrap(), Resource::PaymentIntent);
/// assert!(Resource::parse("NotARealResource").is_err());
/// ```
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
    strum::EnumString,
    strum::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Resource {
    /// Customer accounts.
    #[strum(to_string = "Customer", serialize = "customers")]
    Customer,
    /// Invoices with their line items.
    #[strum(to_string = "Invoice", serialize = "invoices")]
    Invoice,
    /// Pending invoice items.
    #[strum(to_string = "InvoiceItem", serialize = "invoice_item", serialize = "invoiceitems")]
    InvoiceItem,
    /// Recurring subscriptions.
    #[strum(to_string = "Subscription", serialize = "subscriptions")]
    Subscription,
    /// Payment intents.
    #[strum(
        to_string = "PaymentIntent",
        serialize = "payment_intent",
        serialize = "payment_intents"
    )]
    PaymentIntent,
    /// Charges.
    #[strum(to_string = "Charge", serialize = "charges")]
    Charge,
    /// Refunds.
    #[strum(to_string = "Refund", serialize = "refunds")]
    Refund,
    /// Catalog products.
    #[strum(to_string = "Product", serialize = "products")]
    Product,
    /// Prices attached to products.
    #[strum(to_string = "Price", serialize = "prices")]
    Price,
    /// Legacy plans.
    #[strum(to_string = "Plan", serialize = "plans")]
    Plan,
}

impl Resource {
    /// Resolves a resource name.
    ///
    /// # Errors
    ///
    /// Returns `FetchErrorKind::UnknownResource` when the name matches no
    /// supported resource.
    pub fn parse(name: &str) -> Result<Self, FetchError> {
        name.trim()
            .parse()
            .map_err(|_| FetchError::new(FetchErrorKind::UnknownResource(name.to_string())))
    }

    /// REST collection path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Customer => "customers",
            Resource::Invoice => "invoices",
            Resource::InvoiceItem => "invoiceitems",
            Resource::Subscription => "subscriptions",
            Resource::PaymentIntent => "payment_intents",
            Resource::Charge => "charges",
            Resource::Refund => "refunds",
            Resource::Product => "products",
            Resource::Price => "prices",
            Resource::Plan => "plans",
        }
    }
}
