//! The Stripe fetch-process cycle.

use crate::{FetchEvent, FetcherConfig};
use billfold_aggregate::RecordAggregator;
use billfold_core::{AggregateResult, RawRecord, RequestParams};
use billfold_error::{BillfoldResult, ConfigError};
use billfold_stripe::{FetchReport, ResourceFetcher, ResourceRegistry, StripeClient};
use tracing::{debug, info, instrument};

/// Fetches one resource from Stripe and folds the records into a
/// per-customer aggregate.
///
/// Construction is the only fallible step: a missing or invalid
/// configuration is fatal. Once built, fetches never fail; failures are
/// logged and produce an empty aggregate.
///
/// # Example
///
/// ```rust,ignore
/// let config = BillfoldConfig::load()?;
/// let provider = StripeFetchProvider::new(config.event("Invoice"))?;
/// let aggregate = provider.fetch_and_process().await;
/// println!("{}", aggregate.to_json()?);
/// ```
#[derive(Debug, Clone)]
pub struct StripeFetchProvider {
    resource: String,
    request_params: RequestParams,
    fetcher: ResourceFetcher,
    aggregator: RecordAggregator,
}

impl StripeFetchProvider {
    /// Builds a provider backed by a new [`StripeClient`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the event carries no fetcher
    /// settings, the settings are invalid, or the client cannot be built.
    #[instrument(skip_all, fields(resource = %event.url()))]
    pub fn new(event: FetchEvent) -> BillfoldResult<Self> {
        let (resource, config) = event.into_parts();
        let config = config.ok_or_else(|| {
            ConfigError::new(format!("No fetcher configuration for resource '{}'", resource))
        })?;

        let client = StripeClient::new(config.connection_params())?.into_shared();
        Self::with_registry(resource, &config, ResourceRegistry::from_client(client))
    }

    /// Builds a provider over an existing registry.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid.
    pub fn with_registry(
        resource: impl Into<String>,
        config: &FetcherConfig,
        registry: ResourceRegistry,
    ) -> BillfoldResult<Self> {
        config.validate()?;

        let mut fetcher = ResourceFetcher::new(registry)
            .with_policy(config.retry().unwrap_or_default().policy());
        if let Some(deadline) = config.deadline() {
            fetcher = fetcher.with_deadline(deadline);
        }

        let resource = resource.into();
        debug!(
            resource = %resource,
            max_attempts = *fetcher.policy().max_attempts(),
            "Created Stripe fetch provider"
        );

        Ok(Self {
            resource,
            request_params: config.request_params().clone().unwrap_or_default(),
            fetcher,
            aggregator: RecordAggregator::new(),
        })
    }

    /// The resource this provider fetches.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The request parameters sent with every fetch.
    pub fn request_params(&self) -> &RequestParams {
        &self.request_params
    }

    /// Fetches the first page of the resource, or nothing on failure.
    pub async fn fetch(&self) -> Vec<RawRecord> {
        self.fetch_report().await.into_records()
    }

    /// Fetches the first page of the resource with its diagnostic.
    pub async fn fetch_report(&self) -> FetchReport {
        self.fetcher
            .fetch_report(&self.resource, &self.request_params)
            .await
    }

    /// Folds records into a fresh aggregate.
    pub fn process(&self, records: &[RawRecord]) -> AggregateResult {
        self.aggregator.aggregate(records)
    }

    /// Runs one fetch-process cycle.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn fetch_and_process(&self) -> AggregateResult {
        let records = self.fetch().await;
        let result = self.process(&records);
        info!(
            records = records.len(),
            customers = result.len(),
            "Completed fetch cycle"
        );
        result
    }
}
