//! Remote billing API error types and retry classification.

/// Remote API error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RemoteErrorKind {
    /// The API rejected the credentials (HTTP 401).
    #[display("Authentication failed: {}", _0)]
    Authentication(String),
    /// The credentials lack access to the resource (HTTP 403).
    #[display("Permission denied: {}", _0)]
    Permission(String),
    /// The request was malformed or referenced something missing (other 4xx).
    #[display("Invalid request (HTTP {}): {}", status_code, message)]
    InvalidRequest {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Too many requests (HTTP 429).
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
    /// The API failed on its side (5xx).
    #[display("API error (HTTP {}): {}", status_code, message)]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// The request could not be built.
    #[display("Failed to build request: {}", _0)]
    Request(String),
    /// The request never produced a response.
    #[display("Connection failed: {}", _0)]
    Connection(String),
    /// The response body could not be decoded.
    #[display("Failed to decode response: {}", _0)]
    Decode(String),
}

impl RemoteErrorKind {
    /// Check if this error type should be retried.
    ///
    /// Rejections by the API itself (bad credentials, bad requests,
    /// undecodable bodies) are terminal. Transport failures, throttling and
    /// server-side failures are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteErrorKind::Connection(_) => true,
            RemoteErrorKind::RateLimited(_) => true,
            RemoteErrorKind::Api { .. } => true,
            RemoteErrorKind::Authentication(_)
            | RemoteErrorKind::Permission(_)
            | RemoteErrorKind::InvalidRequest { .. }
            | RemoteErrorKind::Request(_)
            | RemoteErrorKind::Decode(_) => false,
        }
    }

    /// Classify an unsuccessful HTTP status code.
    ///
    /// # Examples
    ///
    /// ```
    /// use billfold_error::RemoteErrorKind;
    ///
    /// let kind = RemoteErrorKind::from_status(401, "Invalid API Key provided");
    /// assert!(matches!(kind, RemoteErrorKind::Authentication(_)));
    /// assert!(!kind.is_retryable());
    /// ```
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 => RemoteErrorKind::Authentication(message),
            403 => RemoteErrorKind::Permission(message),
            429 => RemoteErrorKind::RateLimited(message),
            500..=599 => RemoteErrorKind::Api {
                status_code,
                message,
            },
            _ => RemoteErrorKind::InvalidRequest {
                status_code,
                message,
            },
        }
    }
}

/// Remote API error with source location tracking.
///
/// # Examples
///
/// ```
/// use billfold_error::{RemoteError, RemoteErrorKind};
///
/// let err = RemoteError::new(RemoteErrorKind::Connection("connection refused".into()));
/// assert!(format!("{}", err).contains("connection refused"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Remote Error: {} at line {} in {}", kind, line, file)]
pub struct RemoteError {
    /// The kind of error that occurred
    pub kind: RemoteErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RemoteError {
    /// Create a new RemoteError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RemoteErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RemoteErrorKind {
        &self.kind
    }
}

/// Result type for remote API calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use billfold_error::{RemoteError, RemoteErrorKind, RetryableError};
///
/// let err = RemoteError::new(RemoteErrorKind::Api {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
/// assert!(err.is_retryable());
///
/// let err = RemoteError::new(RemoteErrorKind::Authentication("bad key".into()));
/// assert!(!err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Errors returning false belong to the terminal family: the retry
    /// policy hands them back after a single attempt.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for RemoteError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
