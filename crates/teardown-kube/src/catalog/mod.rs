//! Type catalogs consulted by the resolver
//!
//! A catalog answers two questions: which resource types the cluster serves,
//! and which extension type definitions exist together with their category
//! labels. Two implementations are provided:
//! - [`StaticCatalog`]: a compiled table of the built-in Kubernetes types, plus
//!   any registered extension types
//! - [`DiscoveryCatalog`]: the live API server, queried on every call

mod builtin;
mod discovery;

pub use builtin::StaticCatalog;
pub use discovery::DiscoveryCatalog;

use async_trait::async_trait;

use crate::error::Result;

/// One served resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// API group, empty for the core group
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Plural resource name, e.g. `deployments`
    pub plural: String,
    /// Singular resource name, e.g. `deployment`
    pub singular: String,
}

impl CatalogEntry {
    /// Entry with the singular name derived from the kind
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        plural: impl Into<String>,
    ) -> Self {
        let kind = kind.into();
        Self {
            group: group.into(),
            version: version.into(),
            singular: kind.to_lowercase(),
            kind,
            plural: plural.into(),
        }
    }
}

/// An extension type definition and the labels it declares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionTypeDef {
    /// Definition name, `<plural>.<group>`
    pub name: String,
    pub group: String,
    pub kind: String,
    /// Declared versions, in declaration order
    pub versions: Vec<String>,
    pub categories: Vec<String>,
}

impl ExtensionTypeDef {
    pub fn new(group: impl Into<String>, kind: impl Into<String>, plural: &str) -> Self {
        let group = group.into();
        Self {
            name: format!("{}.{}", plural, group),
            group,
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive category membership
    pub fn has_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

/// Source of type information for resolution
#[async_trait]
pub trait TypeCatalog: Send + Sync {
    /// Every served resource type, core group first
    async fn resources(&self) -> Result<Vec<CatalogEntry>>;

    /// Every extension type definition
    async fn extension_types(&self) -> Result<Vec<ExtensionTypeDef>>;
}
