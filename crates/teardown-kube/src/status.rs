//! Condition reporting
//!
//! Conditions are merged by type into the request status and persisted
//! through a [`RequestStore`]. A failed write is returned to the caller.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde_json::json;
use teardown_core::{Condition, Conditions};
use tracing::debug;

use crate::crd::{CleanupRequest, CleanupRequestStatus};
use crate::error::{CleanupError, Result};
use crate::store::with_deadline;

/// Reads cleanup requests and persists their status
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Fetch a request. A missing request is [`CleanupError::NotFound`].
    async fn get_request(&self, namespace: &str, name: &str) -> Result<CleanupRequest>;

    /// Persist the status of a request
    async fn update_status(&self, request: &CleanupRequest) -> Result<()>;
}

/// Merges conditions into a request and persists them
#[derive(Clone)]
pub struct ConditionReporter {
    store: Arc<dyn RequestStore>,
}

impl ConditionReporter {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }

    /// Set a condition on the request, replacing any of the same type, and persist
    pub async fn report(&self, request: &mut CleanupRequest, condition: Condition) -> Result<()> {
        let generation = request.metadata.generation;
        debug!(
            request = %request.name_any(),
            condition = %condition.type_,
            reason = %condition.reason,
            "Setting condition"
        );

        let status = request.status.get_or_insert_with(CleanupRequestStatus::default);
        status
            .conditions
            .set(condition.with_observed_generation(generation));
        self.store.update_status(request).await
    }
}

/// Request store backed by the Kubernetes API
pub struct KubeRequestStore {
    client: Client,
    request_timeout: Option<Duration>,
}

impl KubeRequestStore {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl RequestStore for KubeRequestStore {
    async fn get_request(&self, namespace: &str, name: &str) -> Result<CleanupRequest> {
        let api: Api<CleanupRequest> = Api::namespaced(self.client.clone(), namespace);
        match with_deadline(self.request_timeout, "get request", api.get(name)).await {
            Err(e) if e.is_not_found() => Err(CleanupError::NotFound {
                kind: "CleanupRequest".to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            other => other,
        }
    }

    async fn update_status(&self, request: &CleanupRequest) -> Result<()> {
        let namespace = request.namespace().unwrap_or_default();
        let api: Api<CleanupRequest> = Api::namespaced(self.client.clone(), &namespace);
        let patch = json!({ "status": request.status });

        with_deadline(
            self.request_timeout,
            "update status",
            api.patch_status(&request.name_any(), &PatchParams::default(), &Patch::Merge(&patch)),
        )
        .await?;
        Ok(())
    }
}

/// In-memory request store for testing
#[derive(Clone, Default)]
pub struct MockRequestStore {
    requests: Arc<RwLock<BTreeMap<(String, String), CleanupRequest>>>,
    status_writes: Arc<RwLock<Vec<Conditions>>>,
    fail_status_writes: Arc<RwLock<bool>>,
}

impl MockRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a request; it must carry a name and namespace
    pub fn insert(&self, request: CleanupRequest) {
        let key = (request.namespace().unwrap_or_default(), request.name_any());
        self.requests.write().unwrap().insert(key, request);
    }

    /// Current stored copy of a request
    pub fn request(&self, namespace: &str, name: &str) -> Option<CleanupRequest> {
        self.requests
            .read()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Conditions persisted by each status write, in order
    pub fn status_writes(&self) -> Vec<Conditions> {
        self.status_writes.read().unwrap().clone()
    }

    /// Make every status write fail
    pub fn fail_status_writes(&self, fail: bool) {
        *self.fail_status_writes.write().unwrap() = fail;
    }
}

#[async_trait]
impl RequestStore for MockRequestStore {
    async fn get_request(&self, namespace: &str, name: &str) -> Result<CleanupRequest> {
        self.request(namespace, name)
            .ok_or_else(|| CleanupError::NotFound {
                kind: "CleanupRequest".to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn update_status(&self, request: &CleanupRequest) -> Result<()> {
        if *self.fail_status_writes.read().unwrap() {
            return Err(CleanupError::Store("status write rejected".to_string()));
        }

        let key = (request.namespace().unwrap_or_default(), request.name_any());
        let mut requests = self.requests.write().unwrap();
        let stored = requests.get_mut(&key).ok_or_else(|| CleanupError::NotFound {
            kind: "CleanupRequest".to_string(),
            namespace: key.0.clone(),
            name: key.1.clone(),
        })?;
        stored.status = request.status.clone();

        self.status_writes.write().unwrap().push(request.conditions());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::RequestSpec;
    use teardown_core::{CONDITION_COMPLETE, REASON_COMPLETED_SUCCESSFULLY, REASON_NO_RESOURCES};

    fn request() -> CleanupRequest {
        let mut request = CleanupRequest::new("cleanup", RequestSpec::default());
        request.metadata.namespace = Some("ops".to_string());
        request.metadata.generation = Some(4);
        request
    }

    #[tokio::test]
    async fn test_report_merges_by_type() {
        let store = MockRequestStore::new();
        store.insert(request());
        let reporter = ConditionReporter::new(Arc::new(store.clone()));
        let mut req = store.get_request("ops", "cleanup").await.unwrap();

        reporter
            .report(&mut req, Condition::truthy(CONDITION_COMPLETE, REASON_NO_RESOURCES, "first"))
            .await
            .unwrap();
        reporter
            .report(
                &mut req,
                Condition::truthy(CONDITION_COMPLETE, REASON_COMPLETED_SUCCESSFULLY, "second"),
            )
            .await
            .unwrap();

        let stored = store.request("ops", "cleanup").unwrap().conditions();
        assert_eq!(stored.len(), 1);
        let complete = stored.get(CONDITION_COMPLETE).unwrap();
        assert_eq!(complete.reason, REASON_COMPLETED_SUCCESSFULLY);
        assert_eq!(complete.message, "second");
        assert_eq!(complete.observed_generation, Some(4));
        assert_eq!(store.status_writes().len(), 2);
    }

    #[tokio::test]
    async fn test_report_failure_is_returned() {
        let store = MockRequestStore::new();
        store.insert(request());
        store.fail_status_writes(true);
        let reporter = ConditionReporter::new(Arc::new(store.clone()));
        let mut req = request();

        let result = reporter
            .report(&mut req, Condition::truthy(CONDITION_COMPLETE, REASON_NO_RESOURCES, "x"))
            .await;
        assert!(matches!(result, Err(CleanupError::Store(_))));
        assert!(store.request("ops", "cleanup").unwrap().status.is_none());
    }

    #[tokio::test]
    async fn test_missing_request_is_not_found() {
        let store = MockRequestStore::new();
        let err = store.get_request("ops", "gone").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
