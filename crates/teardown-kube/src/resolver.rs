//! Kind and category resolution
//!
//! A kind name from a cleanup item is resolved in two steps:
//! 1. **Direct**: the name is taken as a resource name, plural or singular
//!    (`deployments`, `deployment`, `Deployment`)
//! 2. **Decomposed**: the name is split as `Kind.group` (`Deployment.apps`,
//!    `Widget.example.com`) and the pair is looked up
//!
//! Categories are matched against the labels of extension type definitions.
//!
//! A resolver consults its catalogs in order and stops at the first one that
//! answers. [`TypeResolver::static_first`] puts the compiled table of built-in
//! types in front of a live catalog, so built-in kinds resolve without a
//! round trip and extension types fall through to discovery.

use std::sync::Arc;

use teardown_core::TypeDescriptor;
use tracing::{debug, warn};

use crate::catalog::{CatalogEntry, StaticCatalog, TypeCatalog};
use crate::error::{CleanupError, Result};

/// Maps kind names and categories to versioned types
#[derive(Clone)]
pub struct TypeResolver {
    catalogs: Vec<Arc<dyn TypeCatalog>>,
}

impl TypeResolver {
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self {
            catalogs: vec![catalog],
        }
    }

    /// Built-in types first, then `live` for anything they do not cover
    pub fn static_first(live: Arc<dyn TypeCatalog>) -> Self {
        Self::new(Arc::new(StaticCatalog::builtin())).with_fallback(live)
    }

    /// Consult `catalog` when every earlier catalog has no answer
    pub fn with_fallback(mut self, catalog: Arc<dyn TypeCatalog>) -> Self {
        self.catalogs.push(catalog);
        self
    }

    /// Resolve a kind name, trying the direct strategy then the decomposed one.
    ///
    /// A miss after a catalog failed reports that failure, not a resolution
    /// error.
    pub async fn resolve_kind(&self, name: &str) -> Result<TypeDescriptor> {
        let (kind, group) = split_kind_group(name);
        let mut unavailable = None;

        for catalog in &self.catalogs {
            let resources = match catalog.resources().await {
                Ok(resources) => resources,
                Err(e) => {
                    warn!(name, error = %e, "Type catalog unavailable, trying next");
                    unavailable = Some(e);
                    continue;
                }
            };

            if let Some(entry) = find_direct(&resources, name) {
                debug!(name, kind = %entry.kind, group = %entry.group, "Resolved kind directly");
                return Ok(descriptor(entry));
            }

            if let Some(entry) = find_decomposed(&resources, kind, group) {
                debug!(name, kind = %entry.kind, group = %entry.group, "Resolved kind by group");
                return Ok(descriptor(entry));
            }
        }

        if let Some(e) = unavailable {
            return Err(e);
        }

        Err(CleanupError::Resolution {
            name: name.to_string(),
            reason: if group.is_empty() {
                "no served type matches the name".to_string()
            } else {
                format!("no served type matches kind {} in group {}", kind, group)
            },
        })
    }

    /// Every extension type declaring the category, at its first version.
    ///
    /// The first catalog with a match wins. No match anywhere is an empty
    /// list; callers decide whether that is an error.
    pub async fn resolve_category(&self, category: &str) -> Result<Vec<TypeDescriptor>> {
        let mut unavailable = None;

        for catalog in &self.catalogs {
            let defs = match catalog.extension_types().await {
                Ok(defs) => defs,
                Err(e) => {
                    warn!(category, error = %e, "Type catalog unavailable, trying next");
                    unavailable = Some(e);
                    continue;
                }
            };

            let mut matched = Vec::new();
            for def in defs.iter().filter(|d| d.has_category(category)) {
                match def.versions.first() {
                    Some(version) => {
                        matched.push(TypeDescriptor::new(&def.group, version, &def.kind));
                    }
                    None => {
                        warn!(definition = %def.name, category, "Extension type declares no versions, skipping");
                    }
                }
            }

            if !matched.is_empty() {
                debug!(category, count = matched.len(), "Resolved category");
                return Ok(matched);
            }
        }

        match unavailable {
            Some(e) => Err(e),
            None => {
                debug!(category, count = 0, "Resolved category");
                Ok(Vec::new())
            }
        }
    }
}

fn descriptor(entry: &CatalogEntry) -> TypeDescriptor {
    TypeDescriptor::new(&entry.group, &entry.version, &entry.kind)
}

fn find_direct<'a>(resources: &'a [CatalogEntry], name: &str) -> Option<&'a CatalogEntry> {
    resources.iter().find(|entry| {
        entry.plural.eq_ignore_ascii_case(name) || entry.singular.eq_ignore_ascii_case(name)
    })
}

fn find_decomposed<'a>(resources: &'a [CatalogEntry], kind: &str, group: &str) -> Option<&'a CatalogEntry> {
    resources
        .iter()
        .find(|entry| entry.group == group && entry.kind.eq_ignore_ascii_case(kind))
}

/// Split `Kind.group.suffix` at the first dot; no dot means the core group
fn split_kind_group(name: &str) -> (&str, &str) {
    name.split_once('.').unwrap_or((name, ""))
}
