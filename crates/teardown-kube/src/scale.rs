//! Scale executor

use std::sync::Arc;

use kube::api::DynamicObject;
use serde_json::{Value, json};
use teardown_core::{CleanupItem, TypeDescriptor};
use tracing::info;

use crate::error::{AggregateError, CleanupError, Result};
use crate::lister::ResourceLister;
use crate::outcome::Outcome;
use crate::store::ObjectStore;

/// Kinds carrying a replica count
pub const SCALABLE_KINDS: &[&str] = &["Deployment", "StatefulSet"];

/// Whether the executor can scale instances of this kind
pub fn is_scalable(kind: &str) -> bool {
    SCALABLE_KINDS.contains(&kind)
}

/// Sets `spec.replicas` on replica-set-like workloads
#[derive(Clone)]
pub struct ScaleExecutor {
    store: Arc<dyn ObjectStore>,
    lister: ResourceLister,
}

impl ScaleExecutor {
    pub fn new(store: Arc<dyn ObjectStore>, lister: ResourceLister) -> Self {
        Self { store, lister }
    }

    /// Scale one instance. An empty name targets nothing.
    pub async fn scale_named(
        &self,
        dry_run: bool,
        desc: &TypeDescriptor,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Outcome {
        if let Some(e) = unsupported_kind(&desc.kind) {
            return Outcome::failed(e);
        }
        if name.is_empty() {
            info!("No name specified for scaling, skipping");
            return Outcome::ok(0);
        }

        let desc = desc.with_default_version();
        let mut object = match self.store.get(&desc, namespace, name).await {
            Ok(object) => object,
            Err(e) => return Outcome::failed(e.with_context(format!("failed to get {}/{}", namespace, name))),
        };

        if dry_run {
            info!(kind = %desc.kind, namespace, name, replicas, "Dry run mode, skipping scaling");
            return Outcome::ok(1);
        }

        info!(kind = %desc.kind, namespace, name, replicas, "Scaling workload");
        let result = match set_replicas(&mut object, replicas) {
            Ok(()) => self.store.update(&desc, &object).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                info!(kind = %desc.kind, namespace, name, replicas, "Scaled workload");
                Outcome::ok(1)
            }
            Err(e) => Outcome::failed(e.with_context(format!("failed to scale {}/{}", namespace, name))),
        }
    }

    /// Scale what an item targets; only scalable kinds are accepted.
    ///
    /// Without a name every instance in the item's namespace is scaled,
    /// continuing past per-instance failures.
    pub async fn scale_item(&self, dry_run: bool, desc: &TypeDescriptor, item: &CleanupItem, replicas: i32) -> Outcome {
        if let Some(e) = unsupported_kind(&desc.kind) {
            return Outcome::failed(e);
        }

        if !item.name.is_empty() {
            return self
                .scale_named(dry_run, desc, &item.namespace, &item.name, replicas)
                .await
                .context(|| format!("failed to scale {}/{}", item.namespace, item.name));
        }

        let targets = match self.lister.list(desc, &item.namespace).await {
            Ok(targets) => targets,
            Err(e) => return Outcome::failed(e),
        };

        if targets.is_empty() {
            info!(kind = %desc.kind, namespace = %item.namespace, "No resources found to scale");
            return Outcome::ok(0);
        }

        let mut count = 0;
        let mut errors = AggregateError::new();
        for target in &targets {
            let outcome = self
                .scale_named(dry_run, desc, &target.namespace, &target.name, replicas)
                .await;
            count += outcome.count;
            if let Some(e) = outcome.error {
                errors.push(e.with_context(format!("failed to scale {}", target)));
            }
        }

        Outcome::partial(count, errors)
    }
}

fn unsupported_kind(kind: &str) -> Option<CleanupError> {
    (!is_scalable(kind)).then(|| CleanupError::UnsupportedAction {
        message: format!("scaling is not supported for kind {}", kind),
    })
}

fn set_replicas(object: &mut DynamicObject, replicas: i32) -> Result<()> {
    let body = object
        .data
        .as_object_mut()
        .ok_or_else(|| CleanupError::Serialization("object body is not a map".to_string()))?;
    let spec = body.entry("spec").or_insert_with(|| json!({}));
    match spec {
        Value::Object(spec) => {
            spec.insert("replicas".to_string(), json!(replicas));
            Ok(())
        }
        _ => Err(CleanupError::Serialization("spec is not a map".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockObjectStore, StoreOperation};
    use teardown_core::CleanupAction;

    fn executor(store: &MockObjectStore) -> ScaleExecutor {
        let store: Arc<dyn ObjectStore> = Arc::new(store.clone());
        ScaleExecutor::new(store.clone(), ResourceLister::new(store))
    }

    fn deployment() -> TypeDescriptor {
        TypeDescriptor::new("apps", "v1", "Deployment")
    }

    fn statefulset() -> TypeDescriptor {
        TypeDescriptor::new("apps", "v1", "StatefulSet")
    }

    #[tokio::test]
    async fn test_scale_named_to_zero() {
        let store = MockObjectStore::new().with_workload("Deployment", "ns", "d", 3);
        let exec = executor(&store);

        let outcome = exec.scale_named(false, &deployment(), "ns", "d", 0).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.count, 1);
        assert_eq!(store.replicas(&deployment(), "ns", "d"), Some(0));
    }

    #[tokio::test]
    async fn test_scale_named_dry_run_fetches_but_keeps_replicas() {
        let store = MockObjectStore::new().with_workload("StatefulSet", "ns", "db", 2);
        let exec = executor(&store);

        let outcome = exec.scale_named(true, &statefulset(), "ns", "db", 0).await;
        assert_eq!(outcome.count, 1);
        assert_eq!(store.replicas(&statefulset(), "ns", "db"), Some(2));

        let counts = store.operation_counts();
        assert_eq!(counts.gets, 1);
        assert_eq!(counts.mutations(), 0);
    }

    #[tokio::test]
    async fn test_scale_named_empty_name_is_noop() {
        let store = MockObjectStore::new();
        let exec = executor(&store);

        let outcome = exec.scale_named(false, &deployment(), "ns", "", 0).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.count, 0);
        assert_eq!(store.operation_counts().gets, 0);
    }

    #[tokio::test]
    async fn test_scale_named_absent_is_error() {
        let store = MockObjectStore::new();
        let exec = executor(&store);

        let outcome = exec.scale_named(false, &deployment(), "ns", "d", 0).await;
        assert_eq!(outcome.count, 0);
        assert!(outcome.error.unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_unsupported_kind_rejected_before_lookup() {
        let store = MockObjectStore::new();
        let exec = executor(&store);

        let item = CleanupItem::new("Service", CleanupAction::ScaleToZero)
            .in_namespace("ns")
            .named("svc");
        let outcome = exec
            .scale_item(false, &TypeDescriptor::new("", "v1", "Service"), &item, 0)
            .await;

        let err = outcome.error.unwrap();
        assert!(err.is_unsupported_action());
        assert_eq!(err.to_string(), "scaling is not supported for kind Service");
        assert_eq!(store.operation_counts(), Default::default());
    }

    #[tokio::test]
    async fn test_scale_named_rejects_unscalable_kind() {
        let service = TypeDescriptor::new("", "v1", "Service");
        let store = MockObjectStore::new().with_object(&service, "ns", "svc", json!({ "spec": {} }));
        let exec = executor(&store);

        let outcome = exec.scale_named(false, &service, "ns", "svc", 0).await;
        assert_eq!(outcome.count, 0);
        assert!(outcome.error.unwrap().is_unsupported_action());
        assert_eq!(store.operation_counts(), Default::default());
        assert_eq!(store.replicas(&service, "ns", "svc"), None);
    }

    #[tokio::test]
    async fn test_scale_item_bulk_continues_past_failures() {
        let store = MockObjectStore::new()
            .with_workload("Deployment", "ns", "a", 2)
            .with_workload("Deployment", "ns", "b", 2)
            .with_workload("Deployment", "ns", "c", 2);
        store.fail(StoreOperation::Update, Some("b"));
        let exec = executor(&store);

        let item = CleanupItem::new("Deployment", CleanupAction::ScaleToZero).in_namespace("ns");
        let outcome = exec.scale_item(false, &deployment(), &item, 0).await;

        assert_eq!(outcome.count, 2);
        let err = outcome.error.unwrap();
        assert!(err.to_string().starts_with("failed to scale ns/b: failed to scale ns/b:"));
        assert_eq!(store.replicas(&deployment(), "ns", "a"), Some(0));
        assert_eq!(store.replicas(&deployment(), "ns", "b"), Some(2));
        assert_eq!(store.replicas(&deployment(), "ns", "c"), Some(0));
    }

    #[tokio::test]
    async fn test_scale_item_bulk_empty_is_success() {
        let store = MockObjectStore::new();
        let exec = executor(&store);

        let item = CleanupItem::new("StatefulSet", CleanupAction::ScaleToZero).in_namespace("ns");
        let outcome = exec.scale_item(false, &statefulset(), &item, 0).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.count, 0);
    }

    #[tokio::test]
    async fn test_scale_item_dry_run_counts_match() {
        let seeded = || {
            MockObjectStore::new()
                .with_workload("Deployment", "ns", "a", 1)
                .with_workload("Deployment", "ns", "b", 1)
        };
        let item = CleanupItem::new("Deployment", CleanupAction::ScaleToZero).in_namespace("ns");

        let dry = seeded();
        let dry_count = executor(&dry).scale_item(true, &deployment(), &item, 0).await.count;
        let live = seeded();
        let live_count = executor(&live).scale_item(false, &deployment(), &item, 0).await.count;

        assert_eq!(dry_count, 2);
        assert_eq!(dry_count, live_count);
        assert_eq!(dry.operation_counts().mutations(), 0);
    }

    #[test]
    fn test_set_replicas_creates_spec() {
        let resource = kube::api::ApiResource::from_gvk(&crate::store::gvk_of(&deployment()));
        let mut object = DynamicObject::new("d", &resource).data(json!({}));

        set_replicas(&mut object, 0).unwrap();
        assert_eq!(object.data["spec"]["replicas"], json!(0));
    }
}
