//! Instance enumeration

use std::sync::Arc;

use teardown_core::{ObjectRef, TypeDescriptor};

use crate::error::Result;
use crate::store::ObjectStore;

/// Lists the identities of the instances of a type
#[derive(Clone)]
pub struct ResourceLister {
    store: Arc<dyn ObjectStore>,
}

impl ResourceLister {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Every instance of `desc` in `namespace`, or cluster-wide when empty.
    ///
    /// An unversioned descriptor is listed at `v1`.
    pub async fn list(&self, desc: &TypeDescriptor, namespace: &str) -> Result<Vec<ObjectRef>> {
        let desc = desc.with_default_version();
        self.store.list(&desc, namespace).await.map_err(|e| {
            e.with_context(format!(
                "failed to list resources of kind {} in namespace {}",
                desc.kind, namespace
            ))
        })
    }
}
