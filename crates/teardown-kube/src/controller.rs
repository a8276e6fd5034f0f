//! Cleanup request reconciliation
//!
//! Each pass moves a request through these conditions:
//! - no conditions yet: `Initialized/Reconciling`, then the request is read again
//! - no items: `Complete/NoResources`
//! - every item succeeded: `Complete/CompletedSuccessfully`
//! - any item failed: `Complete/CompletedWithErrors`, and the pass fails so
//!   the controller requeues it
//!
//! Retry timing belongs to the controller's error policy, never to the pass.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use teardown_core::{
    CONDITION_COMPLETE, CONDITION_INITIALIZED, Condition, REASON_COMPLETED_SUCCESSFULLY,
    REASON_COMPLETED_WITH_ERRORS, REASON_NO_RESOURCES, REASON_RECONCILING,
};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::catalog::DiscoveryCatalog;
use crate::crd::CleanupRequest;
use crate::error::CleanupError;
use crate::orchestrator::Orchestrator;
use crate::resolver::TypeResolver;
use crate::status::{ConditionReporter, KubeRequestStore, RequestStore};
use crate::store::KubeStore;

pub const MESSAGE_STARTED: &str = "Reconciliation started";
pub const MESSAGE_NO_RESOURCES: &str = "No resources specified for processing";

/// Errors that fail a reconciliation pass
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to fetch cleanup request: {0}")]
    Fetch(#[source] CleanupError),

    #[error("failed to update cleanup request status: {0}")]
    Status(#[source] CleanupError),

    #[error("cleanup finished with errors ({count} resources processed): {source}")]
    Cleanup {
        count: usize,
        #[source]
        source: CleanupError,
    },
}

/// What a successful pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReport {
    /// The request no longer exists
    Gone,
    /// The request lists no items
    NoResources,
    /// Every item succeeded
    Completed { count: usize },
}

/// Controller settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Watch one namespace instead of the whole cluster
    pub namespace: Option<String>,
    /// Delay before a failed pass is retried
    pub error_requeue: Duration,
    /// Deadline of every API call made during a pass
    pub request_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            error_requeue: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Runs one pass over a stored cleanup request
#[derive(Clone)]
pub struct Reconciler {
    requests: Arc<dyn RequestStore>,
    reporter: ConditionReporter,
    orchestrator: Orchestrator,
}

impl Reconciler {
    pub fn new(requests: Arc<dyn RequestStore>, orchestrator: Orchestrator) -> Self {
        Self {
            reporter: ConditionReporter::new(requests.clone()),
            requests,
            orchestrator,
        }
    }

    #[instrument(skip(self))]
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<PassReport, ReconcileError> {
        info!("Reconciling cleanup request");

        let Some(mut request) = self.fetch(namespace, name).await? else {
            return Ok(PassReport::Gone);
        };

        if request.conditions().is_empty() {
            self.set(
                &mut request,
                Condition::truthy(CONDITION_INITIALIZED, REASON_RECONCILING, MESSAGE_STARTED),
            )
            .await?;
            info!("Initialized status conditions");

            request = match self.fetch(namespace, name).await? {
                Some(request) => request,
                None => return Ok(PassReport::Gone),
            };
        }

        if request.spec.resources.is_empty() {
            info!("No resources specified, skipping cleanup");
            self.set(
                &mut request,
                Condition::truthy(CONDITION_COMPLETE, REASON_NO_RESOURCES, MESSAGE_NO_RESOURCES),
            )
            .await?;
            return Ok(PassReport::NoResources);
        }

        let result = self
            .orchestrator
            .process(request.spec.dry_run, &request.spec.resources)
            .await;
        let (count, failure) = result.into_parts();

        if let Some(failure) = failure {
            let errors = match &failure {
                CleanupError::Aggregate(agg) => agg.len(),
                _ => 1,
            };
            error!(error = %failure, count, "Errors occurred during cleanup");
            self.set(
                &mut request,
                Condition::truthy(
                    CONDITION_COMPLETE,
                    REASON_COMPLETED_WITH_ERRORS,
                    format!("Errors occurred during cleanup: {} errors", errors),
                ),
            )
            .await?;
            return Err(ReconcileError::Cleanup {
                count,
                source: failure,
            });
        }

        self.set(
            &mut request,
            Condition::truthy(
                CONDITION_COMPLETE,
                REASON_COMPLETED_SUCCESSFULLY,
                format!("Cleaned up {} resources", count),
            ),
        )
        .await?;

        info!(count, "Reconciliation complete");
        Ok(PassReport::Completed { count })
    }

    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<CleanupRequest>, ReconcileError> {
        match self.requests.get_request(namespace, name).await {
            Ok(request) => Ok(Some(request)),
            Err(e) if e.is_not_found() => {
                warn!("Cleanup request not found, skipping");
                Ok(None)
            }
            Err(e) => Err(ReconcileError::Fetch(e)),
        }
    }

    async fn set(&self, request: &mut CleanupRequest, condition: Condition) -> Result<(), ReconcileError> {
        self.reporter
            .report(request, condition)
            .await
            .map_err(ReconcileError::Status)
    }
}

struct Context {
    reconciler: Reconciler,
    error_requeue: Duration,
}

async fn reconcile(request: Arc<CleanupRequest>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let namespace = request.namespace().unwrap_or_default();
    ctx.reconciler
        .reconcile(&namespace, &request.name_any())
        .await?;
    Ok(Action::await_change())
}

fn error_policy(request: Arc<CleanupRequest>, error: &ReconcileError, ctx: Arc<Context>) -> Action {
    warn!(
        request = %request.name_any(),
        error = %error,
        requeue_secs = ctx.error_requeue.as_secs(),
        "Reconcile failed, requeueing"
    );
    Action::requeue(ctx.error_requeue)
}

/// Watch cleanup requests and reconcile them until shutdown
pub async fn run_controller(client: Client, config: ControllerConfig) {
    let api: Api<CleanupRequest> = match &config.namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };

    let store = Arc::new(KubeStore::with_client(client.clone()).with_request_timeout(config.request_timeout));
    let discovery = Arc::new(DiscoveryCatalog::new(client.clone()).with_request_timeout(config.request_timeout));
    let resolver = TypeResolver::static_first(discovery);
    let requests = Arc::new(KubeRequestStore::new(client).with_request_timeout(config.request_timeout));

    let ctx = Arc::new(Context {
        reconciler: Reconciler::new(requests, Orchestrator::with_resolver(store, resolver)),
        error_requeue: config.error_requeue,
    });

    info!(
        namespace = config.namespace.as_deref().unwrap_or("*"),
        "Starting cleanup request controller"
    );

    Controller::new(api, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((object, action)) => info!(request = %object.name, ?action, "Reconciled"),
                Err(e) => warn!(error = %e, "Reconcile error"),
            }
        })
        .await;

    info!("Controller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::crd::RequestSpec;
    use crate::status::MockRequestStore;
    use crate::store::MockObjectStore;
    use teardown_core::{CleanupAction, CleanupItem, CleanupRequestSpec};

    fn request(items: Vec<CleanupItem>) -> CleanupRequest {
        let mut request = CleanupRequest::new(
            "cleanup",
            RequestSpec::from(CleanupRequestSpec {
                dry_run: false,
                resources: items,
            }),
        );
        request.metadata.namespace = Some("ops".to_string());
        request
    }

    fn reconciler(requests: &MockRequestStore, objects: &MockObjectStore) -> Reconciler {
        Reconciler::new(
            Arc::new(requests.clone()),
            Orchestrator::new(Arc::new(objects.clone()), Arc::new(StaticCatalog::builtin())),
        )
    }

    #[tokio::test]
    async fn test_first_pass_initializes_then_completes() {
        let requests = MockRequestStore::new();
        requests.insert(request(vec![]));
        let objects = MockObjectStore::new();

        let report = reconciler(&requests, &objects)
            .reconcile("ops", "cleanup")
            .await
            .unwrap();
        assert_eq!(report, PassReport::NoResources);

        let writes = requests.status_writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[0].is_reason(CONDITION_INITIALIZED, REASON_RECONCILING));
        assert!(writes[1].is_reason(CONDITION_COMPLETE, REASON_NO_RESOURCES));

        let stored = requests.request("ops", "cleanup").unwrap().conditions();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.get(CONDITION_COMPLETE).unwrap().message, MESSAGE_NO_RESOURCES);
    }

    #[tokio::test]
    async fn test_second_pass_replaces_complete() {
        let requests = MockRequestStore::new();
        requests.insert(request(vec![]));
        let objects = MockObjectStore::new().with_workload("Deployment", "apps", "web", 2);
        let reconciler = reconciler(&requests, &objects);

        reconciler.reconcile("ops", "cleanup").await.unwrap();

        let mut updated = requests.request("ops", "cleanup").unwrap();
        updated.spec.resources = vec![
            CleanupItem::new("Deployment", CleanupAction::ScaleToZero)
                .in_namespace("apps")
                .named("web"),
        ];
        requests.insert(updated);

        let report = reconciler.reconcile("ops", "cleanup").await.unwrap();
        assert_eq!(report, PassReport::Completed { count: 1 });

        let stored = requests.request("ops", "cleanup").unwrap().conditions();
        assert_eq!(stored.len(), 2);
        let complete = stored.get(CONDITION_COMPLETE).unwrap();
        assert_eq!(complete.reason, REASON_COMPLETED_SUCCESSFULLY);
        assert_eq!(complete.message, "Cleaned up 1 resources");
        // Already initialized, so only the Complete write happened
        assert_eq!(requests.status_writes().len(), 3);
    }

    #[tokio::test]
    async fn test_errors_are_recorded_then_returned() {
        let requests = MockRequestStore::new();
        requests.insert(request(vec![
            CleanupItem::new("Deployment", CleanupAction::Unknown),
            CleanupItem::new("Deployment", CleanupAction::Delete)
                .in_namespace("apps")
                .named("gone"),
        ]));
        let objects = MockObjectStore::new();

        let err = reconciler(&requests, &objects)
            .reconcile("ops", "cleanup")
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Cleanup { count: 0, .. }));

        let stored = requests.request("ops", "cleanup").unwrap().conditions();
        let complete = stored.get(CONDITION_COMPLETE).unwrap();
        assert_eq!(complete.reason, REASON_COMPLETED_WITH_ERRORS);
        assert_eq!(complete.message, "Errors occurred during cleanup: 2 errors");
    }

    #[tokio::test]
    async fn test_status_failure_is_fatal() {
        let requests = MockRequestStore::new();
        requests.insert(request(vec![
            CleanupItem::new("Deployment", CleanupAction::Delete).in_namespace("apps"),
        ]));
        requests.fail_status_writes(true);
        let objects = MockObjectStore::new().with_workload("Deployment", "apps", "web", 1);

        let err = reconciler(&requests, &objects)
            .reconcile("ops", "cleanup")
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Status(_)));
        // The pass stopped before touching any item
        assert_eq!(objects.object_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_request_is_skipped() {
        let requests = MockRequestStore::new();
        let objects = MockObjectStore::new();

        let report = reconciler(&requests, &objects)
            .reconcile("ops", "gone")
            .await
            .unwrap();
        assert_eq!(report, PassReport::Gone);
        assert!(requests.status_writes().is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert!(config.namespace.is_none());
        assert_eq!(config.error_requeue, Duration::from_secs(30));
    }
}
