//! Remote capability traits.

use async_trait::async_trait;
use billfold_core::{ListPage, RequestParams, Resource};
use billfold_error::RemoteResult;

/// A remote resource that can list its records.
///
/// One implementation exists per supported [`Resource`]; the fetcher
/// resolves a resource name to its lister through an explicit registry.
/// Implementations raise typed [`RemoteError`](billfold_error::RemoteError)s.
/// They may retry transport failures on their own but must hand every other
/// error back after one request; the caller owns the retry policy.
#[async_trait]
pub trait ResourceLister: Send + Sync {
    /// Lists the first page of records.
    async fn list(&self, params: &RequestParams) -> RemoteResult<ListPage>;

    /// The resource this lister serves.
    fn resource(&self) -> Resource;
}
