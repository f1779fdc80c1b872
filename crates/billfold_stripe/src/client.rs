//! HTTP client for the Stripe list endpoints.

use billfold_core::{ConnectionParams, ListPage, LogLevel, RequestParams, Resource};
use billfold_error::{ConfigError, RemoteError, RemoteErrorKind, RemoteResult};
use billfold_retry::RetryPolicy;
use derive_getters::Getters;
use reqwest::{Client, Request};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{Level, debug, error, info, instrument};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.stripe.com/v1";

const TELEMETRY_HEADER: &str = "X-Stripe-Client-Telemetry";
const REQUEST_ID_HEADER: &str = "request-id";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(80);
const NETWORK_INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const NETWORK_MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Immutable client settings derived from [`ConnectionParams`].
#[derive(Clone, Getters)]
pub struct ClientConfig {
    /// Secret API key sent as a bearer token.
    api_key: String,
    /// API root; collection paths are appended to it.
    base_url: String,
    /// Retries applied to each request on transport failure.
    network_policy: RetryPolicy,
    /// Whether latency of the previous request is reported.
    telemetry: bool,
    /// Request logging verbosity.
    log_level: LogLevel,
}

impl ClientConfig {
    /// Validates connection parameters and derives the client settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or `max_attempts` is zero.
    pub fn from_params(params: &ConnectionParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            api_key: params.api_key().clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
            network_policy: RetryPolicy::builder()
                .max_attempts(params.effective_max_attempts() as usize)
                .initial_backoff(NETWORK_INITIAL_BACKOFF)
                .max_backoff(NETWORK_MAX_BACKOFF)
                .build(),
            telemetry: params.telemetry_enabled(),
            log_level: params.effective_log_level(),
        })
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("network_policy", &self.network_policy)
            .field("telemetry", &self.telemetry)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Latency of a completed request, reported on the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RequestMetrics {
    /// Server-assigned request id.
    request_id: String,
    /// Wall-clock duration of the request.
    request_duration_ms: u64,
}

impl RequestMetrics {
    /// Creates a metrics record.
    pub fn new(request_id: impl Into<String>, request_duration_ms: u64) -> Self {
        Self {
            request_id: request_id.into(),
            request_duration_ms,
        }
    }

    fn header_value(&self) -> String {
        serde_json::json!({ "last_request_metrics": self }).to_string()
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Stripe API client.
///
/// Each client owns its configuration; two clients with different keys can
/// run side by side in one process.
///
/// # Example
///
/// ```rust,ignore
/// let params = ConnectionParams::builder().api_key("sk_test_123").build()?;
/// let client = StripeClient::new(&params)?;
/// let page = client.list(Resource::Invoice, &RequestParams::default()).await?;
/// ```
#[derive(Debug)]
pub struct StripeClient {
    http: Client,
    config: ClientConfig,
    last_request: Mutex<Option<RequestMetrics>>,
}

impl StripeClient {
    /// Creates a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection parameters are invalid or the
    /// HTTP client cannot be initialized.
    #[instrument(skip_all)]
    pub fn new(params: &ConnectionParams) -> Result<Self, ConfigError> {
        let config = ClientConfig::from_params(params)?;
        let http = Client::builder()
            .user_agent(concat!("billfold/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            max_attempts = *config.network_policy.max_attempts(),
            telemetry = config.telemetry,
            log_level = %config.log_level,
            "Creating new Stripe client"
        );

        Ok(Self {
            http,
            config,
            last_request: Mutex::new(None),
        })
    }

    /// Points the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Wraps the client for sharing between resource listers.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The client settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds the HTTP request for one list call.
    ///
    /// Pending telemetry is attached, and consumed, when enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or headers are malformed.
    pub fn build_list_request(
        &self,
        resource: Resource,
        params: &RequestParams,
    ) -> RemoteResult<Request> {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            resource.path()
        );

        let mut builder = self
            .http
            .get(url)
            .bearer_auth(&self.config.api_key)
            .query(&params.query_pairs());

        if let Some(account) = params.account() {
            builder = builder.header("Stripe-Account", account.as_str());
        }
        if let Some(version) = params.api_version() {
            builder = builder.header("Stripe-Version", version.as_str());
        }
        if self.config.telemetry {
            if let Some(metrics) = self.take_metrics() {
                builder = builder.header(TELEMETRY_HEADER, metrics.header_value());
            }
        }

        builder
            .build()
            .map_err(|e| RemoteError::new(RemoteErrorKind::Request(e.to_string())))
    }

    /// Lists the first page of a resource.
    ///
    /// Transport failures are retried up to the configured `max_attempts`
    /// before the error is returned. Every other failure, rate limits and
    /// server errors included, is returned after one request.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] classified by HTTP status, transport failure
    /// or decode failure.
    #[instrument(skip(self, params), fields(resource = %resource))]
    pub async fn list(&self, resource: Resource, params: &RequestParams) -> RemoteResult<ListPage> {
        self.config
            .network_policy
            .execute_when(
                || self.send_list(resource, params),
                |e: &RemoteError| matches!(e.kind, RemoteErrorKind::Connection(_)),
            )
            .await
    }

    async fn send_list(&self, resource: Resource, params: &RequestParams) -> RemoteResult<ListPage> {
        let request = self.build_list_request(resource, params)?;
        if self.logs(Level::INFO) {
            info!(method = "GET", url = %request.url(), "Sending list request");
        }

        let started = Instant::now();
        let response = self.http.execute(request).await.map_err(|e| {
            if self.logs(Level::ERROR) {
                error!(error = ?e, "Failed to send request to Stripe API");
            }
            RemoteError::new(RemoteErrorKind::Connection(e.to_string()))
        })?;
        let elapsed = started.elapsed();

        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if self.config.telemetry {
            if let Some(request_id) = &request_id {
                self.record_metrics(RequestMetrics::new(
                    request_id.clone(),
                    elapsed.as_millis() as u64,
                ));
            }
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
            if self.logs(Level::ERROR) {
                error!(status = %status, request_id = ?request_id, message = %message, "Stripe API returned error");
            }
            return Err(RemoteError::new(RemoteErrorKind::from_status(
                status.as_u16(),
                message,
            )));
        }

        let page: ListPage = response.json().await.map_err(|e| {
            if self.logs(Level::ERROR) {
                error!(error = ?e, "Failed to parse Stripe list response");
            }
            RemoteError::new(RemoteErrorKind::Decode(e.to_string()))
        })?;

        if self.logs(Level::DEBUG) {
            debug!(
                records = page.data().len(),
                has_more = *page.has_more(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Received list page"
            );
        }
        Ok(page)
    }

    fn logs(&self, level: Level) -> bool {
        level <= self.config.log_level.level_filter()
    }

    fn record_metrics(&self, metrics: RequestMetrics) {
        if let Ok(mut slot) = self.last_request.lock() {
            *slot = Some(metrics);
        }
    }

    fn take_metrics(&self) -> Option<RequestMetrics> {
        self.last_request.lock().ok()?.take()
    }
}

/// Extracts `error.message` from an API error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()?
        .error
        .message
        .filter(|message| !message.is_empty())
}
