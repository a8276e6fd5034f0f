//! The `CleanupRequest` custom resource

use std::ops::{Deref, DerefMut};

use kube::{CustomResource, CustomResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use teardown_core::{CleanupRequestSpec, Conditions};

use crate::error::{CleanupError, Result};

pub const API_GROUP: &str = "cleanup.teardown.dev";
pub const API_VERSION: &str = "v1alpha1";

/// Desired state of a `CleanupRequest`
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "cleanup.teardown.dev",
    version = "v1alpha1",
    kind = "CleanupRequest",
    plural = "cleanuprequests",
    shortname = "cleanup",
    namespaced,
    status = "CleanupRequestStatus",
    printcolumn = r#"{"name":"DryRun","type":"boolean","jsonPath":".spec.dryRun"}"#,
    printcolumn = r#"{"name":"Outcome","type":"string","jsonPath":".status.conditions[?(@.type==\"Complete\")].reason"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct RequestSpec {
    #[serde(flatten)]
    pub request: CleanupRequestSpec,
}

impl From<CleanupRequestSpec> for RequestSpec {
    fn from(request: CleanupRequestSpec) -> Self {
        Self { request }
    }
}

impl Deref for RequestSpec {
    type Target = CleanupRequestSpec;

    fn deref(&self) -> &Self::Target {
        &self.request
    }
}

impl DerefMut for RequestSpec {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.request
    }
}

/// Observed state of a `CleanupRequest`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CleanupRequestStatus {
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    pub conditions: Conditions,
}

impl CleanupRequest {
    /// Conditions recorded so far, empty before the first pass
    pub fn conditions(&self) -> Conditions {
        self.status
            .as_ref()
            .map(|s| s.conditions.clone())
            .unwrap_or_default()
    }
}

/// The CustomResourceDefinition manifest as YAML
pub fn crd_yaml() -> Result<String> {
    serde_yaml::to_string(&CleanupRequest::crd())
        .map_err(|e| CleanupError::Serialization(e.to_string()))
}
