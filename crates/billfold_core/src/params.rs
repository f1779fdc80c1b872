//! Connection and request parameters for a fetch session.

use billfold_error::{BuilderError, ConfigError};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Client-side network attempts per request when none are configured.
const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Largest page size the list endpoints accept.
const MAX_PAGE_LIMIT: u32 = 100;

/// Log verbosity for the remote client.
///
/// Accepts the level names used by the billing SDK configuration
/// (`critical`, `error`, `warning`, `info`, `debug`, `notset`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    /// Only unrecoverable failures.
    Critical,
    /// Failed requests.
    Error,
    /// Retries and degraded responses.
    Warning,
    /// One line per request.
    #[default]
    Info,
    /// Request and response details.
    Debug,
    /// Client request logging disabled.
    #[serde(rename = "notset")]
    #[strum(serialize = "notset")]
    NotSet,
}

impl LogLevel {
    /// The `tracing` filter equivalent of this level.
    ///
    /// # Examples
    ///
    /// ```
    /// use billfold_core::LogLevel;
    /// use tracing::level_filters::LevelFilter;
    ///
    /// assert_eq!(LogLevel::Warning.level_filter(), LevelFilter::WARN);
    /// assert_eq!(LogLevel::NotSet.level_filter(), LevelFilter::OFF);
    /// ```
    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Critical | LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::NotSet => LevelFilter::OFF,
        }
    }
}

/// Credentials and client behaviour for one fetch session.
///
/// Built once from configuration and handed to the remote client, which
/// keeps its own immutable copy. Nothing is stored in process-wide state.
///
/// # Examples
///
/// ```
/// use billfold_core::{ConnectionParams, LogLevel};
///
/// let params = ConnectionParams::builder()
///     .api_key("sk_test_123")
///     .max_attempts(3u32)
///     .log_level(LogLevel::Debug)
///     .build()
///     .unwrap();
///
/// assert!(params.validate().is_ok());
/// assert_eq!(params.effective_max_attempts(), 3);
/// assert!(params.telemetry_enabled());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(build_fn(error = "BuilderError"))]
pub struct ConnectionParams {
    /// Secret API key.
    #[builder(setter(into))]
    api_key: String,

    /// Network attempts the client makes per request.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    max_attempts: Option<u32>,

    /// Network retries after the first attempt, as the billing SDK counts
    /// them. Ignored when `max_attempts` is set.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    max_network_retries: Option<u32>,

    /// Report request latency to the API on subsequent requests.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    enable_telemetry: Option<bool>,

    /// Client log verbosity.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    log_level: Option<LogLevel>,
}

impl ConnectionParams {
    /// Creates a new connection params builder.
    pub fn builder() -> ConnectionParamsBuilder {
        ConnectionParamsBuilder::default()
    }

    /// Checks the parameters before a session starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is blank or `max_attempts` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::new("connection_params.api_key is required"));
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::new(
                "connection_params.max_attempts must be at least 1",
            ));
        }
        Ok(())
    }

    /// Network attempts per request.
    ///
    /// `max_attempts` wins; otherwise `max_network_retries` plus the first
    /// attempt; otherwise 2.
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts
            .or_else(|| self.max_network_retries.map(|retries| retries.saturating_add(1)))
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }

    /// Whether latency telemetry is sent, defaulting to true.
    pub fn telemetry_enabled(&self) -> bool {
        self.enable_telemetry.unwrap_or(true)
    }

    /// Client log level, defaulting to `info`.
    pub fn effective_log_level(&self) -> LogLevel {
        self.log_level.unwrap_or_default()
    }
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("api_key", &"<redacted>")
            .field("max_attempts", &self.max_attempts)
            .field("max_network_retries", &self.max_network_retries)
            .field("enable_telemetry", &self.enable_telemetry)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Per-call request parameters.
///
/// An absent parameter set behaves like `RequestParams::default()`.
///
/// # Examples
///
/// ```
/// use billfold_core::RequestParams;
///
/// let params = RequestParams::builder()
///     .account("acct_1")
///     .expand(vec!["data.customer".to_string()])
///     .build()
///     .unwrap();
///
/// assert_eq!(params.account().as_deref(), Some("acct_1"));
/// assert!(params.api_version().is_none());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Getters,
    derive_builder::Builder,
)]
#[builder(default, build_fn(error = "BuilderError"))]
pub struct RequestParams {
    /// Connected account the request acts on behalf of.
    #[builder(setter(into, strip_option))]
    #[serde(default, alias = "stripe_account", skip_serializing_if = "Option::is_none")]
    account: Option<String>,

    /// Pinned API version.
    #[builder(setter(into, strip_option))]
    #[serde(default, alias = "stripe_version", skip_serializing_if = "Option::is_none")]
    api_version: Option<String>,

    /// Field paths to expand inline.
    #[builder(setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expand: Option<Vec<String>>,

    /// Page size for the single list call.
    #[builder(setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

impl RequestParams {
    /// Creates a new request params builder.
    pub fn builder() -> RequestParamsBuilder {
        RequestParamsBuilder::default()
    }

    /// Checks the page size against the API bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if `limit` is outside `1..=100`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.limit {
            Some(limit) if limit == 0 || limit > MAX_PAGE_LIMIT => Err(ConfigError::new(format!(
                "request_params.limit must be in 1..={}, got {}",
                MAX_PAGE_LIMIT, limit
            ))),
            _ => Ok(()),
        }
    }

    /// Scopes the request to a connected account.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Overrides the page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adds field paths to expand.
    pub fn with_expand(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        self.expand.get_or_insert_with(Vec::new).extend(fields);
        self
    }

    /// Query pairs for the list call, in a stable order.
    ///
    /// Expansions are sent as repeated `expand[]` pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        for field in self.expand.iter().flatten() {
            pairs.push(("expand[]".to_string(), field.clone()));
        }
        pairs
    }
}
