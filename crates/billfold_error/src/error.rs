//! Top-level error wrapper types.

use crate::{BuilderError, ConfigError, FetchError, JsonError, RemoteError};

/// Every error a Billfold crate can surface.
///
/// # Examples
///
/// ```
/// use billfold_error::{BillfoldError, ConfigError};
///
/// let err: BillfoldError = ConfigError::new("api_key is required").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum BillfoldErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Remote API error
    #[from(RemoteError)]
    Remote(RemoteError),
    /// Resource resolution error
    #[from(FetchError)]
    Fetch(FetchError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// Billfold error with kind discrimination.
///
/// # Examples
///
/// ```
/// use billfold_error::{BillfoldErrorKind, BillfoldResult, ConfigError};
///
/// fn might_fail() -> BillfoldResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert!(matches!(err.kind(), BillfoldErrorKind::Config(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Billfold Error: {}", _0)]
pub struct BillfoldError(Box<BillfoldErrorKind>);

impl BillfoldError {
    /// Create a new error from a kind.
    pub fn new(kind: BillfoldErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BillfoldErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to BillfoldErrorKind
impl<T> From<T> for BillfoldError
where
    T: Into<BillfoldErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Billfold operations.
pub type BillfoldResult<T> = std::result::Result<T, BillfoldError>;
