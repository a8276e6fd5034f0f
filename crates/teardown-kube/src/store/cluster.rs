//! Live cluster object store
//!
//! Resolves each type against the API server on every call (no discovery cache)
//! and works on `DynamicObject`s, so any served type can be targeted.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use kube::Client;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, PostParams};
use kube::discovery::{self, Scope};
use teardown_core::{ObjectRef, TypeDescriptor};
use tracing::debug;

use super::{ObjectStore, gvk_of};
use crate::error::{CleanupError, Result};

/// Object store backed by the Kubernetes API
pub struct KubeStore {
    client: Client,
    request_timeout: Option<Duration>,
}

impl KubeStore {
    /// Create a store using the default kubeconfig / in-cluster config
    pub async fn new() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::with_client(client))
    }

    /// Create with an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            request_timeout: None,
        }
    }

    /// Bound every API call; an expired call fails with [`CleanupError::Timeout`]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    async fn call<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = kube::Result<T>> + Send,
    {
        with_deadline(self.request_timeout, what, fut).await
    }

    /// Build a dynamic API for the type.
    ///
    /// Cluster-scoped types ignore the namespace. For namespaced types an
    /// empty namespace means every namespace when listing, and the client's
    /// default namespace otherwise.
    async fn api(&self, desc: &TypeDescriptor, namespace: &str, listing: bool) -> Result<Api<DynamicObject>> {
        let gvk = gvk_of(desc);
        let (resource, caps) = self
            .call("discovery", discovery::pinned_kind(&self.client, &gvk))
            .await
            .map_err(|e| e.with_context(format!("failed to discover {}", desc)))?;

        let api = match (caps.scope, namespace.is_empty()) {
            (Scope::Cluster, _) => Api::all_with(self.client.clone(), &resource),
            (Scope::Namespaced, false) => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            (Scope::Namespaced, true) if listing => Api::all_with(self.client.clone(), &resource),
            (Scope::Namespaced, true) => {
                Api::default_namespaced_with(self.client.clone(), &resource)
            }
        };
        Ok(api)
    }
}

/// Run a kube call under an optional deadline
pub(crate) async fn with_deadline<T, F>(timeout: Option<Duration>, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = kube::Result<T>>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(CleanupError::from),
            Err(_) => Err(CleanupError::Timeout(format!("{:?} ({})", limit, what))),
        },
        None => fut.await.map_err(CleanupError::from),
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get(&self, desc: &TypeDescriptor, namespace: &str, name: &str) -> Result<DynamicObject> {
        let api = self.api(desc, namespace, false).await?;
        match self.call("get", api.get(name)).await {
            Err(e) if e.is_not_found() => Err(CleanupError::NotFound {
                kind: desc.kind.clone(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            other => other,
        }
    }

    async fn list(&self, desc: &TypeDescriptor, namespace: &str) -> Result<Vec<ObjectRef>> {
        let api = self.api(desc, namespace, true).await?;
        let list = self
            .call("list", api.list_metadata(&ListParams::default()))
            .await?;

        debug!(kind = %desc.kind, namespace, count = list.items.len(), "Listed resources");
        Ok(list
            .items
            .into_iter()
            .map(|item| {
                ObjectRef::new(
                    item.metadata.namespace.unwrap_or_default(),
                    item.metadata.name.unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn update(&self, desc: &TypeDescriptor, object: &DynamicObject) -> Result<()> {
        let namespace = object.metadata.namespace.clone().unwrap_or_default();
        let name = object.metadata.name.clone().ok_or_else(|| {
            CleanupError::Store(format!("cannot update unnamed {}", desc.kind))
        })?;

        let api = self.api(desc, &namespace, false).await?;
        self.call("update", api.replace(&name, &PostParams::default(), object))
            .await?;
        Ok(())
    }

    async fn delete(&self, desc: &TypeDescriptor, target: &ObjectRef) -> Result<()> {
        let api = self.api(desc, &target.namespace, false).await?;
        self.call("delete", api.delete(&target.name, &DeleteParams::default()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_expiry_is_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, kube::Error>(())
        };

        let result = with_deadline(Some(Duration::from_millis(10)), "list", slow).await;
        assert!(matches!(result, Err(CleanupError::Timeout(ref msg)) if msg.contains("list")));
    }

    #[tokio::test]
    async fn test_no_deadline_passes_through() {
        let fast = async { Ok::<_, kube::Error>(7) };
        assert_eq!(with_deadline(None, "get", fast).await.unwrap(), 7);
    }
}
