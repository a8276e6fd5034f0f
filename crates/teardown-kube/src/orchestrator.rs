//! Cleanup orchestration
//!
//! Drives the items of a request through resolution and the executors, in
//! order. A failing item never stops the pass; every failure is collected
//! and the pass reports the count of everything it did target.

use std::sync::Arc;

use teardown_core::{CleanupAction, CleanupItem, ItemIssue, ObjectRef};
use tracing::{debug, info};

use crate::catalog::TypeCatalog;
use crate::delete::DeleteExecutor;
use crate::error::CleanupError;
use crate::lister::ResourceLister;
use crate::outcome::{CleanupResult, Outcome};
use crate::resolver::TypeResolver;
use crate::scale::ScaleExecutor;
use crate::store::ObjectStore;

/// Runs cleanup passes over a list of items
#[derive(Clone)]
pub struct Orchestrator {
    resolver: TypeResolver,
    scale: ScaleExecutor,
    delete: DeleteExecutor,
}

impl Orchestrator {
    /// Wire the resolver and executors over one store and catalog
    pub fn new(store: Arc<dyn ObjectStore>, catalog: Arc<dyn TypeCatalog>) -> Self {
        Self::with_resolver(store, TypeResolver::new(catalog))
    }

    /// Wire the executors over a store, resolving through `resolver`
    pub fn with_resolver(store: Arc<dyn ObjectStore>, resolver: TypeResolver) -> Self {
        let lister = ResourceLister::new(store.clone());
        Self {
            scale: ScaleExecutor::new(store.clone(), lister.clone()),
            delete: DeleteExecutor::new(store, lister, resolver.clone()),
            resolver,
        }
    }

    /// Process every item, in order
    pub async fn process(&self, dry_run: bool, items: &[CleanupItem]) -> CleanupResult {
        let mut result = CleanupResult::default();

        for item in items {
            result.record(self.process_item(dry_run, item).await);
        }

        debug!(
            dry_run,
            items = items.len(),
            count = result.count,
            errors = result.errors.len(),
            "Processed cleanup items"
        );
        result
    }

    async fn process_item(&self, dry_run: bool, item: &CleanupItem) -> Outcome {
        if item.kind.is_empty() {
            return Outcome::failed(CleanupError::Validation {
                message: ItemIssue::MissingKind.describe(item),
            });
        }

        let desc = match self.resolver.resolve_kind(&item.kind).await {
            Ok(desc) => desc,
            Err(e) => {
                return Outcome::failed(
                    e.with_context(format!("failed to lookup group and kind for {}", item.kind)),
                );
            }
        };
        let target = ObjectRef::new(&item.namespace, &item.name);

        match &item.action {
            CleanupAction::ScaleToZero => {
                info!(kind = %desc.kind, namespace = %item.namespace, name = %item.name, "Scaling to zero");
                self.scale
                    .scale_item(dry_run, &desc, item, 0)
                    .await
                    .context(|| format!("failed to scale {} to zero", target))
            }
            CleanupAction::Delete => {
                info!(kind = %desc.kind, namespace = %item.namespace, name = %item.name, "Deleting item");
                self.delete
                    .delete_item(dry_run, &desc, item)
                    .await
                    .context(|| format!("failed to delete {}", target))
            }
            CleanupAction::Unknown => Outcome::failed(CleanupError::Validation {
                message: ItemIssue::MissingAction.describe(item),
            }),
            CleanupAction::Unsupported(raw) => Outcome::failed(CleanupError::UnsupportedAction {
                message: ItemIssue::UnsupportedAction(raw.clone()).describe(item),
            }),
        }
    }
}
