//! Compiled type registry

use async_trait::async_trait;

use super::{CatalogEntry, ExtensionTypeDef, TypeCatalog};
use crate::error::Result;

/// (group, version, kind, plural) of the built-in types, core group first
const BUILTIN_TYPES: &[(&str, &str, &str, &str)] = &[
    ("", "v1", "Pod", "pods"),
    ("", "v1", "Service", "services"),
    ("", "v1", "ConfigMap", "configmaps"),
    ("", "v1", "Secret", "secrets"),
    ("", "v1", "Namespace", "namespaces"),
    ("", "v1", "PersistentVolumeClaim", "persistentvolumeclaims"),
    ("apps", "v1", "Deployment", "deployments"),
    ("apps", "v1", "StatefulSet", "statefulsets"),
    ("apps", "v1", "DaemonSet", "daemonsets"),
    ("apps", "v1", "ReplicaSet", "replicasets"),
    ("batch", "v1", "Job", "jobs"),
    ("batch", "v1", "CronJob", "cronjobs"),
    ("networking.k8s.io", "v1", "Ingress", "ingresses"),
    (
        "apiextensions.k8s.io",
        "v1",
        "CustomResourceDefinition",
        "customresourcedefinitions",
    ),
];

/// Type catalog backed by a fixed table
///
/// Registered extension types are also served as resources, under their
/// first declared version.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    resources: Vec<CatalogEntry>,
    extension_types: Vec<ExtensionTypeDef>,
}

impl StaticCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the built-in Kubernetes types
    pub fn builtin() -> Self {
        Self {
            resources: BUILTIN_TYPES
                .iter()
                .map(|(group, version, kind, plural)| CatalogEntry::new(*group, *version, *kind, *plural))
                .collect(),
            extension_types: Vec::new(),
        }
    }

    /// Register an extension type definition
    pub fn with_extension_type(mut self, def: ExtensionTypeDef) -> Self {
        if let Some(version) = def.versions.first() {
            let plural = def.name.split('.').next().unwrap_or_default();
            self.resources
                .push(CatalogEntry::new(&def.group, version, &def.kind, plural));
        }
        self.extension_types.push(def);
        self
    }
}

#[async_trait]
impl TypeCatalog for StaticCatalog {
    async fn resources(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.resources.clone())
    }

    async fn extension_types(&self) -> Result<Vec<ExtensionTypeDef>> {
        Ok(self.extension_types.clone())
    }
}
