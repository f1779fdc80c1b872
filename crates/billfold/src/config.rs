//! Fetcher configuration and its loading.
//!
//! Configuration merges, lowest precedence first:
//! - Bundled defaults (include_str! from billfold.toml)
//! - `~/.config/billfold/billfold.toml`
//! - `./billfold.toml`
//! - `BILLFOLD__*` environment variables, `__` separating nested keys
//!   (e.g. `BILLFOLD__FETCHER__CONNECTION_PARAMS__API_KEY`)

use crate::ObservabilityConfig;
use billfold_core::{ConnectionParams, RequestParams};
use billfold_error::{BillfoldError, BillfoldResult, ConfigError};
use billfold_retry::RetryConfig;
use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Name the fetcher configuration must carry.
pub const PROVIDER_NAME: &str = "StripeFetchProvider";

fn default_provider_name() -> String {
    PROVIDER_NAME.to_string()
}

/// Settings for one Stripe fetch provider.
///
/// ```toml
/// [fetcher]
/// fetcher = "StripeFetchProvider"
///
/// [fetcher.connection_params]
/// api_key = "sk_test_..."
/// max_network_retries = 2
/// log_level = "info"
///
/// [fetcher.request_params]
/// stripe_account = "acct_..."
/// expand = ["data.customer"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct FetcherConfig {
    /// Provider name; only `StripeFetchProvider` is accepted.
    #[serde(default = "default_provider_name")]
    fetcher: String,

    /// Credentials and client behaviour.
    connection_params: ConnectionParams,

    /// Per-call parameters; defaults when absent.
    #[serde(default)]
    request_params: Option<RequestParams>,

    /// Retry settings; the top-level `[retry]` table applies when absent.
    #[serde(default)]
    retry: Option<RetryConfig>,

    /// Overall bound on one fetch, retries included.
    #[serde(default)]
    deadline_ms: Option<u64>,
}

impl FetcherConfig {
    /// Creates a configuration with default request and retry settings.
    pub fn new(connection_params: ConnectionParams) -> Self {
        Self {
            fetcher: default_provider_name(),
            connection_params,
            request_params: None,
            retry: None,
            deadline_ms: None,
        }
    }

    /// Sets the request parameters.
    pub fn with_request_params(mut self, params: RequestParams) -> Self {
        self.request_params = Some(params);
        self
    }

    /// Sets the retry settings.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sets the overall fetch deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = Some(u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Overall fetch deadline, if configured.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider name is not `StripeFetchProvider` or
    /// any parameter set is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetcher != PROVIDER_NAME {
            return Err(ConfigError::new(format!(
                "Unsupported fetcher '{}', expected '{}'",
                self.fetcher, PROVIDER_NAME
            )));
        }
        self.connection_params.validate()?;
        if let Some(params) = &self.request_params {
            params.validate()?;
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        if self.deadline_ms == Some(0) {
            return Err(ConfigError::new("fetcher.deadline_ms must be positive"));
        }
        Ok(())
    }
}

/// A request to fetch and aggregate one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct FetchEvent {
    /// Resource name, e.g. `Invoice`.
    url: String,
    /// Fetcher settings; a provider cannot be built without them.
    #[serde(default)]
    config: Option<FetcherConfig>,
}

impl FetchEvent {
    /// Creates an event for `resource` with no configuration attached.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            url: resource.into(),
            config: None,
        }
    }

    /// Attaches fetcher settings.
    pub fn with_config(mut self, config: FetcherConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Splits the event into its resource name and settings.
    pub fn into_parts(self) -> (String, Option<FetcherConfig>) {
        (self.url, self.config)
    }
}

/// Complete Billfold configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct BillfoldConfig {
    /// Stripe fetcher settings, usually supplied per environment.
    #[serde(default)]
    fetcher: Option<FetcherConfig>,

    /// Retry settings for fetchers that carry none.
    #[serde(default)]
    retry: RetryConfig,

    /// Logging and tracing.
    #[serde(default)]
    observability: ObservabilityConfig,
}

impl BillfoldConfig {
    /// Load configuration from a specific file, without defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not match the
    /// configuration schema.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> BillfoldResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                BillfoldError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                BillfoldError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence merging.
    ///
    /// # Errors
    ///
    /// Returns an error if a present source is unreadable or the merged
    /// result does not match the configuration schema.
    #[instrument]
    pub fn load() -> BillfoldResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../billfold.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/billfold/billfold.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("billfold").required(false))
            .add_source(
                Environment::with_prefix("BILLFOLD")
                    .separator("__")
                    .try_parsing(true),
            );

        builder
            .build()
            .map_err(|e| {
                BillfoldError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                BillfoldError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Builds the fetch event for `resource`, filling in the top-level retry
    /// settings when the fetcher carries none.
    pub fn event(&self, resource: impl Into<String>) -> FetchEvent {
        let config = self.fetcher.clone().map(|mut fetcher| {
            fetcher.retry.get_or_insert(self.retry);
            fetcher
        });
        FetchEvent {
            url: resource.into(),
            config,
        }
    }

    /// Replaces the fetcher settings.
    pub fn with_fetcher(mut self, fetcher: FetcherConfig) -> Self {
        self.fetcher = Some(fetcher);
        self
    }
}
