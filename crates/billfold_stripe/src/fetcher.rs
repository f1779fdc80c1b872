//! Single-page fetch under the retry policy, with failures downgraded.

use crate::ResourceRegistry;
use billfold_core::{RawRecord, RequestParams};
use billfold_error::{RemoteError, RemoteErrorKind};
use billfold_retry::RetryPolicy;
use derive_getters::Getters;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// How a fetch ended.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The list call succeeded.
    Complete {
        /// The server holds records past the fetched page.
        has_more: bool,
    },
    /// The resource name resolved to no registered lister.
    UnknownResource(String),
    /// The API rejected the credentials.
    AuthenticationFailed(RemoteError),
    /// The API could not be reached within the retry budget.
    ConnectionFailed(RemoteError),
    /// The fetch did not finish before the deadline.
    DeadlineExceeded(Duration),
    /// Any other remote failure.
    Failed(RemoteError),
}

impl FetchOutcome {
    /// True for [`FetchOutcome::Complete`].
    pub fn is_complete(&self) -> bool {
        matches!(self, FetchOutcome::Complete { .. })
    }
}

/// Records from one fetch together with how the fetch ended.
///
/// An empty `records` with a failed outcome means the fetch failed; with
/// `Complete` it means the resource legitimately has no records.
#[derive(Debug, Clone, Getters)]
pub struct FetchReport {
    /// Records from the first page; empty on failure.
    records: Vec<RawRecord>,
    /// Diagnostic for the fetch.
    outcome: FetchOutcome,
}

impl FetchReport {
    fn failed(outcome: FetchOutcome) -> Self {
        Self {
            records: Vec::new(),
            outcome,
        }
    }

    /// Takes the records, dropping the diagnostic.
    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }
}

/// Issues one list call per fetch through a [`ResourceRegistry`].
///
/// No error crosses this boundary: unknown resources, rejected credentials,
/// unreachable hosts and anything else are logged and produce an empty
/// record list. Use [`fetch_report`](Self::fetch_report) to tell an empty
/// resource from a failed fetch.
///
/// # Example
///
/// ```rust,ignore
/// let fetcher = ResourceFetcher::new(ResourceRegistry::from_client(client));
/// let records = fetcher.fetch("Invoice", &RequestParams::default()).await;
/// ```
#[derive(Debug, Clone)]
pub struct ResourceFetcher {
    registry: ResourceRegistry,
    policy: RetryPolicy,
    deadline: Option<Duration>,
}

impl ResourceFetcher {
    /// Creates a fetcher with the default retry policy and no deadline.
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            registry,
            policy: RetryPolicy::default(),
            deadline: None,
        }
    }

    /// Replaces the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bounds each fetch, retries and backoff included.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The resource registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// The retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches the first page of `resource`, or nothing on failure.
    pub async fn fetch(&self, resource: &str, params: &RequestParams) -> Vec<RawRecord> {
        self.fetch_report(resource, params).await.into_records()
    }

    /// Fetches the first page of `resource` and reports how it went.
    #[instrument(skip(self, params), fields(resource = %resource))]
    pub async fn fetch_report(&self, resource: &str, params: &RequestParams) -> FetchReport {
        debug!("Fetching from Stripe resource");

        let lister = match self.registry.resolve(resource) {
            Ok(lister) => lister,
            Err(e) => {
                error!(error = %e, "Wrong Stripe resource, expected a name like 'Customer'");
                return FetchReport::failed(FetchOutcome::UnknownResource(resource.to_string()));
            }
        };

        let call = self.policy.execute(|| lister.list(params));
        let result = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, call).await {
                Ok(result) => result,
                Err(_) => {
                    error!(deadline_ms = deadline.as_millis() as u64, "Stripe fetch exceeded deadline");
                    return FetchReport::failed(FetchOutcome::DeadlineExceeded(deadline));
                }
            },
            None => call.await,
        };

        match result {
            Ok(page) => {
                let has_more = *page.has_more();
                if has_more {
                    debug!("More records available past the first page; not fetched");
                }
                let records = page.into_data();
                debug!(records = records.len(), "Fetched records");
                FetchReport {
                    records,
                    outcome: FetchOutcome::Complete { has_more },
                }
            }
            Err(e) => {
                let outcome = if matches!(e.kind, RemoteErrorKind::Authentication(_)) {
                    error!(error = %e, "Wrong Stripe api_key");
                    FetchOutcome::AuthenticationFailed(e)
                } else if matches!(e.kind, RemoteErrorKind::Connection(_)) {
                    error!(error = %e, "Stripe connection error");
                    FetchOutcome::ConnectionFailed(e)
                } else {
                    error!(error = %e, "Stripe fetch unhandled error");
                    FetchOutcome::Failed(e)
                };
                FetchReport::failed(outcome)
            }
        }
    }
}
