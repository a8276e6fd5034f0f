//! Object store access for cleanup operations
//!
//! Every executor reads and mutates the cluster through [`ObjectStore`]:
//! - **Kube** (default): Dynamic API calls against the live cluster
//! - **Mock**: In-memory objects for tests, with call counters and failure injection
//!
//! Nothing is cached between calls; every get and list re-reads the backing store.

mod cluster;
mod mock;

pub use cluster::KubeStore;
pub(crate) use cluster::with_deadline;
pub use mock::{MockObjectStore, OperationCounts, StoreOperation};

use async_trait::async_trait;
use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use teardown_core::{ObjectRef, TypeDescriptor};

use crate::error::Result;

/// Backing object store for cleanup operations
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one instance. A missing instance is [`CleanupError::NotFound`](crate::CleanupError::NotFound).
    async fn get(&self, desc: &TypeDescriptor, namespace: &str, name: &str) -> Result<DynamicObject>;

    /// List the identities of every instance, in `namespace` or cluster-wide when empty
    async fn list(&self, desc: &TypeDescriptor, namespace: &str) -> Result<Vec<ObjectRef>>;

    /// Replace an instance with the given object
    async fn update(&self, desc: &TypeDescriptor, object: &DynamicObject) -> Result<()>;

    /// Delete an instance
    async fn delete(&self, desc: &TypeDescriptor, target: &ObjectRef) -> Result<()>;
}

/// Convert a descriptor to the kube GVK, defaulting the version
pub fn gvk_of(desc: &TypeDescriptor) -> GroupVersionKind {
    let desc = desc.with_default_version();
    GroupVersionKind::gvk(&desc.group, &desc.version, &desc.kind)
}

/// Identity of a fetched object
pub fn object_ref(object: &DynamicObject) -> ObjectRef {
    ObjectRef::new(
        object.metadata.namespace.clone().unwrap_or_default(),
        object.metadata.name.clone().unwrap_or_default(),
    )
}
