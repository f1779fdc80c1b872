//! Tests for the fetch-process cycle.

use async_trait::async_trait;
use billfold::{
    BillfoldErrorKind, ConnectionParams, FetchEvent, FetchOutcome, FetcherConfig, ListPage,
    RawRecord, RemoteError, RemoteErrorKind, RemoteResult, RequestParams, Resource,
    ResourceLister, ResourceRegistry, RetryConfig, StripeFetchProvider,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Lister serving canned records and remembering the last request.
struct CannedLister {
    resource: Resource,
    result: Result<Vec<RawRecord>, RemoteErrorKind>,
    calls: AtomicUsize,
    last_params: Mutex<Option<RequestParams>>,
}

impl CannedLister {
    fn ok(resource: Resource, records: Vec<RawRecord>) -> Arc<Self> {
        Arc::new(Self {
            resource,
            result: Ok(records),
            calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
        })
    }

    fn failing(resource: Resource, kind: RemoteErrorKind) -> Arc<Self> {
        Arc::new(Self {
            resource,
            result: Err(kind),
            calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceLister for CannedLister {
    async fn list(&self, params: &RequestParams) -> RemoteResult<ListPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = Some(params.clone());
        match &self.result {
            Ok(records) => Ok(ListPage::new(records.clone(), false)),
            Err(kind) => Err(RemoteError::new(kind.clone())),
        }
    }

    fn resource(&self) -> Resource {
        self.resource
    }
}

fn record(value: serde_json::Value) -> RawRecord {
    RawRecord::try_from(value).unwrap()
}

fn fetcher_config() -> FetcherConfig {
    let params = ConnectionParams::builder()
        .api_key("sk_test_123")
        .build()
        .unwrap();
    FetcherConfig::new(params).with_retry(RetryConfig {
        max_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 1,
    })
}

#[test]
fn test_event_without_config_is_fatal() {
    let err = StripeFetchProvider::new(FetchEvent::new("Invoice")).unwrap_err();
    assert!(matches!(err.kind(), BillfoldErrorKind::Config(_)));
}

#[test]
fn test_blank_api_key_is_fatal() {
    let params = ConnectionParams::builder().api_key(" ").build().unwrap();
    let event = FetchEvent::new("Invoice").with_config(FetcherConfig::new(params));

    let err = StripeFetchProvider::new(event).unwrap_err();
    assert!(matches!(err.kind(), BillfoldErrorKind::Config(_)));
}

#[test]
fn test_new_defaults_request_params() {
    let event = FetchEvent::new("Invoice").with_config(fetcher_config());
    let provider = StripeFetchProvider::new(event).unwrap();

    assert_eq!(provider.resource(), "Invoice");
    assert_eq!(provider.request_params(), &RequestParams::default());
}

#[tokio::test]
async fn test_fetch_and_process_end_to_end() {
    let lister = CannedLister::ok(
        Resource::Invoice,
        vec![
            record(json!({"object": "customer", "email": "a@x.com", "id": "cus_1"})),
            record(json!({
                "object": "invoice",
                "customer": "cus_1",
                "status": "paid",
                "lines": {"data": [{
                    "price": {"product": "prod_1"},
                    "type": "invoiceitem",
                    "amount": 500,
                    "description": "Widget"
                }]}
            })),
            record(json!({"object": "subscription", "customer": "cus_1", "id": "sub_1", "status": "active"})),
            record(json!({"object": "charge.refund", "id": "re_1"})),
        ],
    );
    let registry = ResourceRegistry::new().with(lister.clone());
    let request = RequestParams::default().with_limit(10);
    let config = fetcher_config().with_request_params(request.clone());

    let provider = StripeFetchProvider::with_registry("Invoice", &config, registry).unwrap();
    let aggregate = provider.fetch_and_process().await;

    assert_eq!(lister.calls(), 1);
    assert_eq!(lister.last_params.lock().unwrap().as_ref(), Some(&request));
    assert_eq!(
        aggregate.to_json().unwrap()["cus_1"],
        json!({
            "products": {"prod_1": {"type": "invoiceitem", "amount": 500, "description": "Widget"}},
            "subscriptions": {"sub_1": "active"},
            "payments": {}
        })
    );
    assert_eq!(aggregate.get("a@x.com").unwrap().id().as_deref(), Some("cus_1"));
    assert_eq!(aggregate.len(), 2);
}

#[tokio::test]
async fn test_unknown_resource_yields_empty_aggregate() {
    let lister = CannedLister::ok(Resource::Invoice, vec![]);
    let registry = ResourceRegistry::new().with(lister.clone());

    let provider =
        StripeFetchProvider::with_registry("NotARealResource", &fetcher_config(), registry)
            .unwrap();

    assert!(provider.fetch_and_process().await.is_empty());
    assert_eq!(lister.calls(), 0);
}

#[tokio::test]
async fn test_authentication_failure_yields_empty_aggregate() {
    let lister = CannedLister::failing(
        Resource::Customer,
        RemoteErrorKind::Authentication("Invalid API Key provided".to_string()),
    );
    let registry = ResourceRegistry::new().with(lister.clone());
    let provider =
        StripeFetchProvider::with_registry("Customer", &fetcher_config(), registry).unwrap();

    let report = provider.fetch_report().await;
    assert!(matches!(report.outcome(), FetchOutcome::AuthenticationFailed(_)));
    assert!(provider.fetch_and_process().await.is_empty());
    assert_eq!(lister.calls(), 2);
}

#[tokio::test]
async fn test_rate_limit_uses_configured_attempts() {
    let lister = CannedLister::failing(
        Resource::Subscription,
        RemoteErrorKind::RateLimited("Too many requests".to_string()),
    );
    let registry = ResourceRegistry::new().with(lister.clone());
    let provider =
        StripeFetchProvider::with_registry("subscriptions", &fetcher_config(), registry).unwrap();

    assert!(provider.fetch().await.is_empty());
    assert_eq!(lister.calls(), 3);
}

#[test]
fn test_process_is_fresh_per_call() {
    let registry = ResourceRegistry::new();
    let provider =
        StripeFetchProvider::with_registry("Invoice", &fetcher_config(), registry).unwrap();
    let records = vec![record(
        json!({"object": "payment_intent", "customer": "cus_1", "id": "pi_1", "status": "succeeded"}),
    )];

    let first = provider.process(&records);
    let second = provider.process(&records);
    assert_eq!(first, second);
    assert_eq!(first.get("cus_1").unwrap().payments().len(), 1);
}
