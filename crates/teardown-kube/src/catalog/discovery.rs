//! Live type catalog

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::Client;
use kube::api::{Api, ListParams};
use kube::discovery::Discovery;
use tracing::debug;

use super::{CatalogEntry, ExtensionTypeDef, TypeCatalog};
use crate::error::Result;
use crate::store::with_deadline;

/// Type catalog queried from the API server
///
/// Discovery runs on every call; nothing is cached between resolutions.
pub struct DiscoveryCatalog {
    client: Client,
    request_timeout: Option<Duration>,
}

impl DiscoveryCatalog {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            request_timeout: None,
        }
    }

    /// Bound every discovery and list call
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl TypeCatalog for DiscoveryCatalog {
    async fn resources(&self) -> Result<Vec<CatalogEntry>> {
        let discovery = with_deadline(
            self.request_timeout,
            "discovery",
            Discovery::new(self.client.clone()).run(),
        )
        .await?;

        // Alphabetical order puts the core group ("") first
        let entries: Vec<CatalogEntry> = discovery
            .groups_alphabetical()
            .into_iter()
            .flat_map(|group| group.recommended_resources())
            .map(|(resource, _caps)| CatalogEntry {
                singular: resource.kind.to_lowercase(),
                group: resource.group,
                version: resource.version,
                kind: resource.kind,
                plural: resource.plural,
            })
            .collect();

        debug!(count = entries.len(), "Discovered served types");
        Ok(entries)
    }

    async fn extension_types(&self) -> Result<Vec<ExtensionTypeDef>> {
        let api: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        let list = with_deadline(
            self.request_timeout,
            "list extension types",
            api.list(&ListParams::default()),
        )
        .await?;

        Ok(list
            .items
            .into_iter()
            .map(|crd| ExtensionTypeDef {
                name: crd.metadata.name.unwrap_or_default(),
                group: crd.spec.group,
                kind: crd.spec.names.kind,
                versions: crd.spec.versions.into_iter().map(|v| v.name).collect(),
                categories: crd.spec.names.categories.unwrap_or_default(),
            })
            .collect())
    }
}
