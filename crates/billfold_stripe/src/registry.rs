//! Resource name to lister mapping.

use crate::{StripeClient, StripeResource};
use billfold_core::Resource;
use billfold_error::{FetchError, FetchErrorKind};
use billfold_interface::ResourceLister;
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::debug;

/// Explicit map from each supported resource to the lister serving it.
///
/// Populated once at startup; lookups by name go through
/// [`Resource::parse`], so unknown names surface as a typed error instead of
/// a failed attribute lookup.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    listers: BTreeMap<Resource, Arc<dyn ResourceLister>>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every supported resource against one client.
    pub fn from_client(client: Arc<StripeClient>) -> Self {
        let mut registry = Self::new();
        for resource in Resource::iter() {
            registry.register(Arc::new(StripeResource::new(client.clone(), resource)));
        }
        debug!(resources = registry.len(), "Registered Stripe resources");
        registry
    }

    /// Adds a lister under the resource it reports, returning any lister it
    /// replaces.
    pub fn register(&mut self, lister: Arc<dyn ResourceLister>) -> Option<Arc<dyn ResourceLister>> {
        self.listers.insert(lister.resource(), lister)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, lister: Arc<dyn ResourceLister>) -> Self {
        self.register(lister);
        self
    }

    /// The lister for a resource.
    pub fn get(&self, resource: Resource) -> Option<&Arc<dyn ResourceLister>> {
        self.listers.get(&resource)
    }

    /// Resolves a resource name to its lister.
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` when the name is not a supported resource
    /// and `Unregistered` when it is supported but has no lister.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ResourceLister>, FetchError> {
        let resource = Resource::parse(name)?;
        self.listers
            .get(&resource)
            .cloned()
            .ok_or_else(|| FetchError::new(FetchErrorKind::Unregistered(resource.to_string())))
    }

    /// Registered resources in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.listers.keys().copied()
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.listers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listers.is_empty()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.listers.keys().collect::<Vec<_>>())
            .finish()
    }
}
