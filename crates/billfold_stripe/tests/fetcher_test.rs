//! Tests for the fetcher's error downgrade and diagnostics.

use async_trait::async_trait;
use billfold_core::{ListPage, RawRecord, RequestParams, Resource};
use billfold_error::{RemoteError, RemoteErrorKind, RemoteResult};
use billfold_interface::ResourceLister;
use billfold_retry::RetryPolicy;
use billfold_stripe::{FetchOutcome, ResourceFetcher, ResourceRegistry};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone)]
enum Behavior {
    Page(ListPage),
    Fail(RemoteErrorKind),
    Stall(Duration),
}

struct MockLister {
    resource: Resource,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl MockLister {
    fn new(resource: Resource, behavior: Behavior) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let lister = Arc::new(Self {
            resource,
            behavior,
            calls: calls.clone(),
        });
        (lister, calls)
    }
}

#[async_trait]
impl ResourceLister for MockLister {
    async fn list(&self, _params: &RequestParams) -> RemoteResult<ListPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Page(page) => Ok(page.clone()),
            Behavior::Fail(kind) => Err(RemoteError::new(kind.clone())),
            Behavior::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(ListPage::default())
            }
        }
    }

    fn resource(&self) -> Resource {
        self.resource
    }
}

fn fast_policy(max_attempts: usize) -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(max_attempts)
        .initial_backoff(Duration::from_millis(1))
        .max_backoff(Duration::from_millis(1))
        .build()
}

fn fetcher_with(lister: Arc<MockLister>) -> ResourceFetcher {
    ResourceFetcher::new(ResourceRegistry::new().with(lister)).with_policy(fast_policy(10))
}

fn invoice(id: &str) -> RawRecord {
    RawRecord::try_from(json!({
        "object": "invoice",
        "id": id,
        "customer": "cus_1",
        "status": "paid"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_unknown_resource_yields_empty() {
    let (lister, calls) = MockLister::new(
        Resource::Invoice,
        Behavior::Page(ListPage::new(vec![invoice("in_1")], false)),
    );
    let fetcher = fetcher_with(lister);

    let records = fetcher
        .fetch("NotARealResource", &RequestParams::default())
        .await;
    assert!(records.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let report = fetcher
        .fetch_report("NotARealResource", &RequestParams::default())
        .await;
    assert!(matches!(
        report.outcome(),
        FetchOutcome::UnknownResource(name) if name == "NotARealResource"
    ));
}

#[tokio::test]
async fn test_unregistered_resource_yields_empty() {
    let (lister, _calls) = MockLister::new(Resource::Invoice, Behavior::Page(ListPage::default()));
    let fetcher = fetcher_with(lister);

    let report = fetcher
        .fetch_report("Subscription", &RequestParams::default())
        .await;
    assert!(report.records().is_empty());
    assert!(matches!(report.outcome(), FetchOutcome::UnknownResource(_)));
}

#[tokio::test]
async fn test_authentication_failure_is_not_retried() {
    let (lister, calls) = MockLister::new(
        Resource::Customer,
        Behavior::Fail(RemoteErrorKind::Authentication(
            "Invalid API Key provided".to_string(),
        )),
    );
    let fetcher = fetcher_with(lister);

    let report = fetcher
        .fetch_report("Customer", &RequestParams::default())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(report.records().is_empty());
    assert!(matches!(
        report.outcome(),
        FetchOutcome::AuthenticationFailed(_)
    ));
}

#[tokio::test]
async fn test_connection_failure_exhausts_retries() {
    let (lister, calls) = MockLister::new(
        Resource::Customer,
        Behavior::Fail(RemoteErrorKind::Connection("connection refused".to_string())),
    );
    let fetcher = fetcher_with(lister);

    let records = fetcher.fetch("Customer", &RequestParams::default()).await;
    assert!(records.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_connection_failure_is_reported() {
    let (lister, _calls) = MockLister::new(
        Resource::Customer,
        Behavior::Fail(RemoteErrorKind::Connection("connection refused".to_string())),
    );
    let fetcher = ResourceFetcher::new(ResourceRegistry::new().with(lister))
        .with_policy(fast_policy(2));

    let report = fetcher
        .fetch_report("Customer", &RequestParams::default())
        .await;
    assert!(matches!(report.outcome(), FetchOutcome::ConnectionFailed(_)));
}

#[tokio::test]
async fn test_server_error_downgraded_after_retries() {
    let (lister, calls) = MockLister::new(
        Resource::Charge,
        Behavior::Fail(RemoteErrorKind::Api {
            status_code: 503,
            message: "Service unavailable".to_string(),
        }),
    );
    let fetcher = ResourceFetcher::new(ResourceRegistry::new().with(lister))
        .with_policy(fast_policy(3));

    let report = fetcher
        .fetch_report("charges", &RequestParams::default())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(report.records().is_empty());
    match report.outcome() {
        FetchOutcome::Failed(e) => {
            assert!(matches!(e.kind, RemoteErrorKind::Api { status_code: 503, .. }))
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_decode_failure_is_terminal() {
    let (lister, calls) = MockLister::new(
        Resource::Refund,
        Behavior::Fail(RemoteErrorKind::Decode("expected value".to_string())),
    );
    let fetcher = fetcher_with(lister);

    let report = fetcher
        .fetch_report("Refund", &RequestParams::default())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(report.outcome(), FetchOutcome::Failed(_)));
}

#[tokio::test]
async fn test_success_returns_first_page() {
    let page = ListPage::new(vec![invoice("in_1"), invoice("in_2")], true);
    let (lister, calls) = MockLister::new(Resource::Invoice, Behavior::Page(page));
    let fetcher = fetcher_with(lister);

    let report = fetcher
        .fetch_report("invoice", &RequestParams::default())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(report.outcome().is_complete());
    assert!(matches!(
        report.outcome(),
        FetchOutcome::Complete { has_more: true }
    ));

    let ids: Vec<_> = report
        .into_records()
        .iter()
        .filter_map(|r| r.id().map(str::to_string))
        .collect();
    assert_eq!(ids, vec!["in_1", "in_2"]);
}

#[tokio::test]
async fn test_empty_resource_is_complete() {
    let (lister, _calls) = MockLister::new(Resource::Plan, Behavior::Page(ListPage::default()));
    let fetcher = fetcher_with(lister);

    let report = fetcher.fetch_report("Plan", &RequestParams::default()).await;
    assert!(report.records().is_empty());
    assert!(report.outcome().is_complete());
}

#[tokio::test]
async fn test_deadline_bounds_the_fetch() {
    let (lister, calls) = MockLister::new(
        Resource::Customer,
        Behavior::Stall(Duration::from_secs(5)),
    );
    let fetcher = fetcher_with(lister).with_deadline(Duration::from_millis(10));

    let report = fetcher
        .fetch_report("Customer", &RequestParams::default())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(report.records().is_empty());
    assert!(matches!(
        report.outcome(),
        FetchOutcome::DeadlineExceeded(d) if *d == Duration::from_millis(10)
    ));
}
