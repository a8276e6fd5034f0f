//! Resolved type identities and instance references

use std::fmt;

use serde::{Deserialize, Serialize};

/// Version assumed when a resolved type does not carry one
pub const DEFAULT_VERSION: &str = "v1";

/// Resolved, versioned identity of a resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// API group, empty for the core group
    pub group: String,
    /// API version, may be empty until defaulted
    pub version: String,
    /// Kind, e.g. `Deployment`
    pub kind: String,
}

impl TypeDescriptor {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Same type with the version defaulted to `v1` when empty
    pub fn with_default_version(&self) -> Self {
        let mut out = self.clone();
        if out.version.is_empty() {
            out.version = DEFAULT_VERSION.to_string();
        }
        out
    }

    /// `apiVersion` string, `version` alone for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Whether this is the extension type definition kind
    pub fn is_extension_type_definition(&self) -> bool {
        self.kind == crate::item::EXTENSION_TYPE_KIND
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Minimal identity of a discovered instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Namespace, empty for cluster-scoped instances
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
