//! Delete executor
//!
//! Deletes a single named instance, every instance of a type, or every
//! instance of each extension type in a category.
//!
//! A named target that does not exist is a failure, while a bulk delete that
//! matches nothing succeeds with a count of zero.

use std::sync::Arc;

use teardown_core::{CleanupItem, ObjectRef, TypeDescriptor};
use tracing::info;

use crate::error::{AggregateError, CleanupError};
use crate::lister::ResourceLister;
use crate::outcome::Outcome;
use crate::resolver::TypeResolver;
use crate::store::ObjectStore;

/// Removes instances from the object store
#[derive(Clone)]
pub struct DeleteExecutor {
    store: Arc<dyn ObjectStore>,
    lister: ResourceLister,
    resolver: TypeResolver,
}

impl DeleteExecutor {
    pub fn new(store: Arc<dyn ObjectStore>, lister: ResourceLister, resolver: TypeResolver) -> Self {
        Self {
            store,
            lister,
            resolver,
        }
    }

    /// Delete one instance, fetching it first
    pub async fn delete_named(&self, dry_run: bool, desc: &TypeDescriptor, namespace: &str, name: &str) -> Outcome {
        let desc = desc.with_default_version();
        let object = match self.store.get(&desc, namespace, name).await {
            Ok(object) => object,
            Err(e) => return Outcome::failed(e.with_context(format!("failed to get {}/{}", namespace, name))),
        };
        let target = crate::store::object_ref(&object);

        if dry_run {
            info!(kind = %desc.kind, namespace, name, "Dry run mode, skipping deletion");
            info!(kind = %desc.kind, namespace = %target.namespace, name = %target.name, "Would delete item");
            return Outcome::ok(1);
        }

        info!(kind = %desc.kind, namespace = %target.namespace, name = %target.name, "Deleting item");
        match self.store.delete(&desc, &target).await {
            Ok(()) => Outcome::ok(1),
            Err(e) => Outcome::failed(e.with_context(format!("failed to delete {}", target))),
        }
    }

    /// Delete every instance of a type, continuing past per-instance failures
    pub async fn delete_many(&self, dry_run: bool, desc: &TypeDescriptor, namespace: &str) -> Outcome {
        let desc = desc.with_default_version();
        let targets = match self.lister.list(&desc, namespace).await {
            Ok(targets) => targets,
            Err(e) => return Outcome::failed(e),
        };

        if targets.is_empty() {
            info!(kind = %desc.kind, namespace, "No resources found to delete");
            return Outcome::ok(0);
        }

        if dry_run {
            info!(kind = %desc.kind, namespace, count = targets.len(), "Dry run mode, skipping deletion");
            for target in &targets {
                info!(kind = %desc.kind, namespace = %target.namespace, name = %target.name, "Would delete item");
            }
            return Outcome::ok(targets.len());
        }

        let mut count = 0;
        let mut errors = AggregateError::new();
        for target in &targets {
            info!(kind = %desc.kind, namespace = %target.namespace, name = %target.name, "Deleting item");
            match self.store.delete(&desc, target).await {
                Ok(()) => count += 1,
                Err(e) => errors.push(e.with_context(format!("failed to delete {}", target))),
            }
        }

        Outcome::partial(count, errors)
    }

    /// Delete what an item targets.
    ///
    /// An extension type definition item with a category deletes every
    /// instance of each type in that category, not the definitions.
    pub async fn delete_item(&self, dry_run: bool, desc: &TypeDescriptor, item: &CleanupItem) -> Outcome {
        if desc.is_extension_type_definition() && !item.category.is_empty() {
            return self.delete_category(dry_run, item).await;
        }

        if item.name.is_empty() {
            return self
                .delete_many(dry_run, desc, &item.namespace)
                .await
                .context(|| cleanup_kind_context(&item.kind, &item.namespace));
        }

        self.delete_named(dry_run, desc, &item.namespace, &item.name)
            .await
            .context(|| format!("failed to cleanup named resource {}", ObjectRef::new(&item.namespace, &item.name)))
    }

    async fn delete_category(&self, dry_run: bool, item: &CleanupItem) -> Outcome {
        let types = match self.resolver.resolve_category(&item.category).await {
            Ok(types) => types,
            Err(e) => {
                return Outcome::failed(
                    e.with_context(format!("failed to resolve category {}", item.category)),
                );
            }
        };

        if types.is_empty() {
            return Outcome::failed(CleanupError::NoMatchingTypes {
                category: item.category.clone(),
            });
        }

        let mut count = 0;
        let mut errors = AggregateError::new();
        for desc in &types {
            let outcome = self.delete_many(dry_run, desc, &item.namespace).await;
            count += outcome.count;
            if let Some(e) = outcome.error {
                errors.push(e.with_context(cleanup_kind_context(&desc.kind, &item.namespace)));
            }
        }

        Outcome::partial(count, errors)
    }
}

fn cleanup_kind_context(kind: &str, namespace: &str) -> String {
    format!(
        "failed to cleanup resources of kind {} in namespace {}",
        kind, namespace
    )
}
