//! Cleanup request items and their actions

use std::fmt;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Kind name of the extension type definition kind. Items of this kind
/// may carry a category to target every type declaring it.
pub const EXTENSION_TYPE_KIND: &str = "CustomResourceDefinition";

/// Wire value of [`CleanupAction::Delete`]
pub const ACTION_DELETE: &str = "delete";

/// Wire value of [`CleanupAction::ScaleToZero`]
pub const ACTION_SCALE_TO_ZERO: &str = "scaleToZero";

/// Action applied to the instances an item targets
///
/// Missing and unrecognized actions are kept apart so each gets its own
/// error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CleanupAction {
    /// Remove the instances
    Delete,
    /// Set the replica count of the instances to zero
    ScaleToZero,
    /// No action given
    #[default]
    Unknown,
    /// An action string that is not recognized, kept verbatim
    Unsupported(String),
}

impl CleanupAction {
    /// Wire representation of the action
    pub fn as_str(&self) -> &str {
        match self {
            Self::Delete => ACTION_DELETE,
            Self::ScaleToZero => ACTION_SCALE_TO_ZERO,
            Self::Unknown => "",
            Self::Unsupported(raw) => raw,
        }
    }
}

impl From<String> for CleanupAction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            ACTION_DELETE => Self::Delete,
            ACTION_SCALE_TO_ZERO => Self::ScaleToZero,
            "" => Self::Unknown,
            _ => Self::Unsupported(raw),
        }
    }
}

impl From<&str> for CleanupAction {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<CleanupAction> for String {
    fn from(action: CleanupAction) -> Self {
        match action {
            CleanupAction::Unsupported(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for CleanupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declarative cleanup target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupItem {
    /// Kind (or resource name, optionally `Kind.group`) of the target type
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Namespace of the targets; empty means every namespace
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Name of a single target; empty means every instance of the kind
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Category label of extension types, only used with the
    /// `CustomResourceDefinition` kind
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,

    /// Action to apply: `delete` or `scaleToZero`
    #[serde(default, skip_serializing_if = "is_unknown")]
    #[schemars(with = "String")]
    pub action: CleanupAction,
}

fn is_unknown(action: &CleanupAction) -> bool {
    matches!(action, CleanupAction::Unknown)
}

impl CleanupItem {
    /// Create an item for a kind and action
    pub fn new(kind: impl Into<String>, action: CleanupAction) -> Self {
        Self {
            kind: kind.into(),
            action,
            ..Default::default()
        }
    }

    /// Restrict the item to a namespace
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Target a single named instance
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Target every extension type declaring this category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Check the invariants that do not need the cluster.
    ///
    /// The kind is checked first; an item missing both reports only the kind.
    pub fn validate(&self) -> std::result::Result<(), ItemIssue> {
        if self.kind.is_empty() {
            return Err(ItemIssue::MissingKind);
        }
        match &self.action {
            CleanupAction::Delete | CleanupAction::ScaleToZero => Ok(()),
            CleanupAction::Unknown => Err(ItemIssue::MissingAction),
            CleanupAction::Unsupported(raw) => Err(ItemIssue::UnsupportedAction(raw.clone())),
        }
    }
}

impl fmt::Display for CleanupItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{kind: {:?}, namespace: {:?}, name: {:?}, category: {:?}, action: {:?}}}",
            self.kind,
            self.namespace,
            self.name,
            self.category,
            self.action.as_str()
        )
    }
}

/// A broken invariant of a single item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemIssue {
    MissingKind,
    MissingAction,
    UnsupportedAction(String),
}

impl ItemIssue {
    /// Message for the issue, naming the offending item
    pub fn describe(&self, item: &CleanupItem) -> String {
        match self {
            Self::MissingKind => format!("kind must be specified for item: {}", item),
            Self::MissingAction => format!("action must be specified for item: {}", item),
            Self::UnsupportedAction(_) => format!("unsupported action for item: {}", item),
        }
    }
}

/// Desired state of a cleanup request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequestSpec {
    /// Report what would be cleaned up without mutating anything
    #[serde(default)]
    pub dry_run: bool,

    /// Items processed in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<CleanupItem>,
}

impl CleanupRequestSpec {
    /// Parse a spec from YAML.
    ///
    /// Accepts a full `CleanupRequest` manifest (the spec is read from its
    /// `spec` key) or a bare spec document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(content)?;
        let mapping = doc.as_mapping().ok_or_else(|| CoreError::InvalidRequest {
            message: "expected a mapping at the document root".to_string(),
        })?;

        match mapping.get("spec") {
            Some(spec) => Ok(serde_yaml::from_value(spec.clone())?),
            None => Ok(serde_yaml::from_value(doc)?),
        }
    }

    /// Load a spec from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Offline validation of every item, in order
    pub fn issues(&self) -> Vec<CoreError> {
        self.resources
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                item.validate().err().map(|issue| CoreError::InvalidItem {
                    index,
                    message: issue.describe(item),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_wire() {
        assert_eq!(CleanupAction::from("delete"), CleanupAction::Delete);
        assert_eq!(CleanupAction::from("scaleToZero"), CleanupAction::ScaleToZero);
        assert_eq!(CleanupAction::from(""), CleanupAction::Unknown);
        assert_eq!(
            CleanupAction::from("detach"),
            CleanupAction::Unsupported("detach".to_string())
        );
    }

    #[test]
    fn test_action_keeps_unsupported_value() {
        let item: CleanupItem =
            serde_yaml::from_str("kind: Deployment\naction: Delete\n").unwrap();
        assert_eq!(item.action, CleanupAction::Unsupported("Delete".to_string()));

        let yaml = serde_yaml::to_string(&item).unwrap();
        assert!(yaml.contains("action: Delete"));
    }

    #[test]
    fn test_missing_action_is_unknown() {
        let item: CleanupItem = serde_yaml::from_str("kind: Deployment\n").unwrap();
        assert_eq!(item.action, CleanupAction::Unknown);
    }

    #[test]
    fn test_validate_kind_before_action() {
        let item = CleanupItem::default();
        assert_eq!(item.validate(), Err(ItemIssue::MissingKind));

        let item = CleanupItem::new("Deployment", CleanupAction::Unknown);
        assert_eq!(item.validate(), Err(ItemIssue::MissingAction));

        let item = CleanupItem::new("Deployment", CleanupAction::from("detach"));
        assert_eq!(
            item.validate(),
            Err(ItemIssue::UnsupportedAction("detach".to_string()))
        );

        let item = CleanupItem::new("Deployment", CleanupAction::ScaleToZero);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_issue_messages() {
        let item = CleanupItem::new("", CleanupAction::Delete).in_namespace("ns");
        let message = ItemIssue::MissingKind.describe(&item);
        assert!(message.starts_with("kind must be specified for item"));
        assert!(message.contains("\"ns\""));

        let item = CleanupItem::new("Deployment", CleanupAction::Unknown);
        assert!(
            ItemIssue::MissingAction
                .describe(&item)
                .starts_with("action must be specified for item")
        );
    }

    #[test]
    fn test_spec_from_manifest() {
        let spec = CleanupRequestSpec::from_yaml(
            r#"
apiVersion: cleanup.teardown.dev/v1alpha1
kind: CleanupRequest
metadata:
  name: before-destroy
spec:
  dryRun: true
  resources:
    - kind: Deployment
      namespace: apps
      name: web
      action: scaleToZero
    - kind: CustomResourceDefinition
      category: managed
      action: delete
"#,
        )
        .unwrap();

        assert!(spec.dry_run);
        assert_eq!(spec.resources.len(), 2);
        assert_eq!(spec.resources[0].action, CleanupAction::ScaleToZero);
        assert_eq!(spec.resources[1].category, "managed");
        assert!(spec.issues().is_empty());
    }

    #[test]
    fn test_spec_from_bare_document() {
        let spec = CleanupRequestSpec::from_yaml(
            r#"
resources:
  - namespace: apps
    action: delete
  - kind: Service
"#,
        )
        .unwrap();

        assert!(!spec.dry_run);
        let issues = spec.issues();
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], CoreError::InvalidItem { index: 0, .. }));
        assert!(issues[1].to_string().contains("action must be specified"));
    }

    #[test]
    fn test_spec_rejects_scalar_document() {
        let result = CleanupRequestSpec::from_yaml("just a string");
        assert!(matches!(result, Err(CoreError::InvalidRequest { .. })));
    }
}
