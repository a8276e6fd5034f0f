//! Mock object store for testing
//!
//! This store keeps objects in memory, useful for unit tests
//! without requiring a Kubernetes cluster.

use async_trait::async_trait;
use kube::api::{ApiResource, DynamicObject};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use teardown_core::{ObjectRef, TypeDescriptor};

use super::{ObjectStore, gvk_of, object_ref};
use crate::error::{CleanupError, Result};

/// (group, kind, namespace, name). Versions are not part of the key so a
/// type can be addressed with or without its version.
type ObjectKey = (String, String, String, String);

fn key(desc: &TypeDescriptor, namespace: &str, name: &str) -> ObjectKey {
    (
        desc.group.clone(),
        desc.kind.clone(),
        namespace.to_string(),
        name.to_string(),
    )
}

/// Store operations, for counters and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Get,
    List,
    Update,
    Delete,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl OperationCounts {
    /// Number of calls that would have mutated the cluster
    pub fn mutations(&self) -> usize {
        self.updates + self.deletes
    }
}

#[derive(Debug, Clone)]
struct Failure {
    operation: StoreOperation,
    kind: Option<String>,
    name: Option<String>,
    timeout: bool,
}

/// In-memory object store for testing
#[derive(Clone, Default)]
pub struct MockObjectStore {
    objects: Arc<RwLock<BTreeMap<ObjectKey, DynamicObject>>>,
    operations: Arc<RwLock<OperationCounts>>,
    failures: Arc<RwLock<Vec<Failure>>>,
    listed: Arc<RwLock<Vec<TypeDescriptor>>>,
}

impl MockObjectStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object with the given body (`spec`, `status`, ...)
    pub fn insert(&self, desc: &TypeDescriptor, namespace: &str, name: &str, body: serde_json::Value) {
        let resource = ApiResource::from_gvk(&gvk_of(desc));
        let mut object = DynamicObject::new(name, &resource).data(body);
        if !namespace.is_empty() {
            object = object.within(namespace);
        }
        self.objects
            .write()
            .unwrap()
            .insert(key(desc, namespace, name), object);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_object(self, desc: &TypeDescriptor, namespace: &str, name: &str, body: serde_json::Value) -> Self {
        self.insert(desc, namespace, name, body);
        self
    }

    /// Builder for an `apps/v1` workload with a replica count
    pub fn with_workload(self, kind: &str, namespace: &str, name: &str, replicas: i64) -> Self {
        let desc = TypeDescriptor::new("apps", "v1", kind);
        self.with_object(&desc, namespace, name, json!({ "spec": { "replicas": replicas } }))
    }

    /// Make matching calls fail with a store error
    pub fn fail(&self, operation: StoreOperation, name: Option<&str>) {
        self.failures.write().unwrap().push(Failure {
            operation,
            kind: None,
            name: name.map(str::to_string),
            timeout: false,
        });
    }

    /// Make matching calls for a kind fail with a store error
    pub fn fail_kind(&self, operation: StoreOperation, kind: &str) {
        self.failures.write().unwrap().push(Failure {
            operation,
            kind: Some(kind.to_string()),
            name: None,
            timeout: false,
        });
    }

    /// Make matching calls run past their deadline
    pub fn time_out(&self, operation: StoreOperation, name: Option<&str>) {
        self.failures.write().unwrap().push(Failure {
            operation,
            kind: None,
            name: name.map(str::to_string),
            timeout: true,
        });
    }

    fn check_failure(&self, operation: StoreOperation, kind: &str, name: Option<&str>) -> Result<()> {
        let failures = self.failures.read().unwrap();
        let hit = failures.iter().find(|f| {
            f.operation == operation
                && f.kind.as_deref().map(|k| k == kind).unwrap_or(true)
                && f.name.as_deref().map(|n| Some(n) == name).unwrap_or(true)
        });
        match hit {
            Some(f) if f.timeout => Err(CleanupError::Timeout(format!(
                "injected deadline ({:?} {} {})",
                operation,
                kind,
                name.unwrap_or("*")
            ))),
            Some(_) => Err(CleanupError::Store(format!(
                "injected {:?} failure for {} {}",
                operation,
                kind,
                name.unwrap_or("*")
            ))),
            None => Ok(()),
        }
    }

    fn count(&self, operation: StoreOperation) {
        let mut ops = self.operations.write().unwrap();
        match operation {
            StoreOperation::Get => ops.gets += 1,
            StoreOperation::List => ops.lists += 1,
            StoreOperation::Update => ops.updates += 1,
            StoreOperation::Delete => ops.deletes += 1,
        }
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        *self.operations.write().unwrap() = OperationCounts::default();
    }

    /// Types passed to `list`, in call order
    pub fn listed_types(&self) -> Vec<TypeDescriptor> {
        self.listed.read().unwrap().clone()
    }

    /// Check whether an object exists
    pub fn contains(&self, desc: &TypeDescriptor, namespace: &str, name: &str) -> bool {
        self.objects
            .read()
            .unwrap()
            .contains_key(&key(desc, namespace, name))
    }

    /// Read `spec.replicas` of an object
    pub fn replicas(&self, desc: &TypeDescriptor, namespace: &str, name: &str) -> Option<i64> {
        self.objects
            .read()
            .unwrap()
            .get(&key(desc, namespace, name))
            .and_then(|o| o.data.pointer("/spec/replicas"))
            .and_then(|r| r.as_i64())
    }

    /// Count stored objects
    pub fn object_count(&self) -> usize {
        self.objects.read().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn get(&self, desc: &TypeDescriptor, namespace: &str, name: &str) -> Result<DynamicObject> {
        self.count(StoreOperation::Get);
        self.check_failure(StoreOperation::Get, &desc.kind, Some(name))?;

        self.objects
            .read()
            .unwrap()
            .get(&key(desc, namespace, name))
            .cloned()
            .ok_or_else(|| CleanupError::NotFound {
                kind: desc.kind.clone(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn list(&self, desc: &TypeDescriptor, namespace: &str) -> Result<Vec<ObjectRef>> {
        self.count(StoreOperation::List);
        self.listed.write().unwrap().push(desc.clone());
        self.check_failure(StoreOperation::List, &desc.kind, None)?;

        let objects = self.objects.read().unwrap();
        Ok(objects
            .keys()
            .filter(|(group, kind, ns, _)| {
                *group == desc.group
                    && *kind == desc.kind
                    && (namespace.is_empty() || ns == namespace)
            })
            .map(|(_, _, ns, name)| ObjectRef::new(ns.clone(), name.clone()))
            .collect())
    }

    async fn update(&self, desc: &TypeDescriptor, object: &DynamicObject) -> Result<()> {
        self.count(StoreOperation::Update);
        let target = object_ref(object);
        self.check_failure(StoreOperation::Update, &desc.kind, Some(&target.name))?;

        let mut objects = self.objects.write().unwrap();
        let slot = objects
            .get_mut(&key(desc, &target.namespace, &target.name))
            .ok_or_else(|| CleanupError::NotFound {
                kind: desc.kind.clone(),
                namespace: target.namespace.clone(),
                name: target.name.clone(),
            })?;
        *slot = object.clone();
        Ok(())
    }

    async fn delete(&self, desc: &TypeDescriptor, target: &ObjectRef) -> Result<()> {
        self.count(StoreOperation::Delete);
        self.check_failure(StoreOperation::Delete, &desc.kind, Some(&target.name))?;

        self.objects
            .write()
            .unwrap()
            .remove(&key(desc, &target.namespace, &target.name))
            .map(|_| ())
            .ok_or_else(|| CleanupError::NotFound {
                kind: desc.kind.clone(),
                namespace: target.namespace.clone(),
                name: target.name.clone(),
            })
    }
}
