//! Adapter from the client to the per-resource capability.

use crate::StripeClient;
use async_trait::async_trait;
use billfold_core::{ListPage, RequestParams, Resource};
use billfold_error::RemoteResult;
use billfold_interface::ResourceLister;
use std::sync::Arc;

/// One list resource served by a shared [`StripeClient`].
#[derive(Debug, Clone)]
pub struct StripeResource {
    client: Arc<StripeClient>,
    resource: Resource,
}

impl StripeResource {
    /// Binds a resource to a client.
    pub fn new(client: Arc<StripeClient>, resource: Resource) -> Self {
        Self { client, resource }
    }
}

#[async_trait]
impl ResourceLister for StripeResource {
    async fn list(&self, params: &RequestParams) -> RemoteResult<ListPage> {
        self.client.list(self.resource, params).await
    }

    fn resource(&self) -> Resource {
        self.resource
    }
}
