//! Resource resolution errors.

/// Fetch-stage error conditions that are not remote failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum FetchErrorKind {
    /// The resource name does not map to a supported list resource.
    #[display("Unknown resource '{}'", _0)]
    UnknownResource(String),
    /// The resource is known but no lister is registered for it.
    #[display("No lister registered for resource '{}'", _0)]
    Unregistered(String),
}

/// Fetch error with location tracking.
///
/// # Examples
///
/// ```
/// use billfold_error::{FetchError, FetchErrorKind};
///
/// let err = FetchError::new(FetchErrorKind::UnknownResource("Widget".into()));
/// assert!(format!("{}", err).contains("Widget"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Fetch Error: {} at line {} in {}", kind, line, file)]
pub struct FetchError {
    /// The kind of error that occurred
    pub kind: FetchErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FetchError {
    /// Create a new FetchError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FetchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
