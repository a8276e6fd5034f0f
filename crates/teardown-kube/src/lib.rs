//! Teardown Kube - Pre-destroy cleanup of Kubernetes resources
//!
//! This crate provides:
//! - **Object Stores**: Dynamic get/list/update/delete against the cluster, or in memory for tests
//! - **Type Catalogs**: Live discovery or a compiled registry of served and extension types
//! - **Resolution**: Kind names (`deployments`, `Deployment.apps`) and categories to versioned types
//! - **Executors**: Delete and scale-to-zero, by name or in bulk, with dry-run
//! - **Orchestration**: Ordered item processing that never stops at the first failure
//! - **Controller**: The `CleanupRequest` resource and its condition state machine

pub mod catalog;
pub mod controller;
pub mod crd;
pub mod delete;
pub mod error;
pub mod lister;
pub mod orchestrator;
pub mod outcome;
pub mod resolver;
pub mod scale;
pub mod status;
pub mod store;

pub use catalog::{CatalogEntry, DiscoveryCatalog, ExtensionTypeDef, StaticCatalog, TypeCatalog};
pub use controller::{ControllerConfig, PassReport, ReconcileError, Reconciler, run_controller};
pub use crd::{CleanupRequest, CleanupRequestStatus, RequestSpec, crd_yaml};
pub use delete::DeleteExecutor;
pub use error::{AggregateError, CleanupError, Result};
pub use lister::ResourceLister;
pub use orchestrator::Orchestrator;
pub use outcome::{CleanupResult, Outcome};
pub use resolver::TypeResolver;
pub use scale::{SCALABLE_KINDS, ScaleExecutor, is_scalable};
pub use status::{ConditionReporter, KubeRequestStore, MockRequestStore, RequestStore};
pub use store::{KubeStore, MockObjectStore, ObjectStore, OperationCounts, StoreOperation};
