//! Error types for teardown-kube

use std::fmt;

use thiserror::Error;

/// Result type for teardown-kube operations
pub type Result<T> = std::result::Result<T, CleanupError>;

/// Errors that can occur while cleaning up cluster resources
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CleanupError {
    /// An item breaks an invariant (missing kind or action)
    #[error("{message}")]
    Validation { message: String },

    /// A kind could not be mapped to a served type
    #[error("failed to find mapping for kind {name}: {reason}")]
    Resolution { name: String, reason: String },

    /// A category matched no extension type definition
    #[error("no matching types for category {category}")]
    NoMatchingTypes { category: String },

    /// A named target does not exist
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Scaling a kind that has no replicas, or an unrecognized action
    #[error("{message}")]
    UnsupportedAction { message: String },

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// A store call ran past its deadline
    #[error("operation timed out after {0}")]
    Timeout(String),

    /// Any other backing store failure
    #[error("store error: {0}")]
    Store(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An error annotated with the operation it interrupted
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CleanupError>,
    },

    /// Several failures collected during one operation
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl From<serde_json::Error> for CleanupError {
    fn from(e: serde_json::Error) -> Self {
        CleanupError::Serialization(e.to_string())
    }
}

impl CleanupError {
    /// Wrap with a description of the interrupted operation
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleanupError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error below any context layers
    pub fn root(&self) -> &CleanupError {
        match self {
            CleanupError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this is a not-found error, either ours or a Kubernetes 404
    pub fn is_not_found(&self) -> bool {
        match self.root() {
            CleanupError::NotFound { .. } => true,
            CleanupError::Api(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), CleanupError::Validation { .. })
    }

    /// Check if this is an unsupported action error
    pub fn is_unsupported_action(&self) -> bool {
        matches!(self.root(), CleanupError::UnsupportedAction { .. })
    }

    /// Check if this is a resolution error (including empty categories)
    pub fn is_resolution(&self) -> bool {
        matches!(
            self.root(),
            CleanupError::Resolution { .. } | CleanupError::NoMatchingTypes { .. }
        )
    }
}

/// Ordered collection of failures, exposed as a single error
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<CleanupError>,
}

impl AggregateError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CleanupError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[CleanupError] {
        &self.errors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CleanupError> {
        self.errors.iter()
    }

    /// `None` when nothing was collected, a single error when one was,
    /// and the aggregate otherwise
    pub fn into_error(mut self) -> Option<CleanupError> {
        match self.errors.len() {
            0 => None,
            1 => self.errors.pop(),
            _ => Some(CleanupError::Aggregate(self)),
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred during processing", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

impl Extend<CleanupError> for AggregateError {
    fn extend<I: IntoIterator<Item = CleanupError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl FromIterator<CleanupError> for AggregateError {
    fn from_iter<I: IntoIterator<Item = CleanupError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AggregateError {
    type Item = &'a CleanupError;
    type IntoIter = std::slice::Iter<'a, CleanupError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_root() {
        let err = CleanupError::NotFound {
            kind: "Deployment".to_string(),
            namespace: "ns".to_string(),
            name: "web".to_string(),
        }
        .with_context("failed to get ns/web")
        .with_context("failed to scale ns/web to zero");

        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("failed to scale ns/web to zero: failed to get ns/web:"));
    }

    #[test]
    fn test_aggregate_into_error() {
        assert!(AggregateError::new().into_error().is_none());

        let single: AggregateError = vec![CleanupError::Store("boom".to_string())]
            .into_iter()
            .collect();
        assert!(matches!(single.into_error(), Some(CleanupError::Store(_))));

        let many: AggregateError = vec![
            CleanupError::Store("a".to_string()),
            CleanupError::Store("b".to_string()),
        ]
        .into_iter()
        .collect();
        assert!(matches!(many.into_error(), Some(CleanupError::Aggregate(agg)) if agg.len() == 2));
    }

    #[test]
    fn test_aggregate_display() {
        let agg: AggregateError = vec![
            CleanupError::Validation {
                message: "kind must be specified for item: {}".to_string(),
            },
            CleanupError::NoMatchingTypes {
                category: "foo".to_string(),
            },
        ]
        .into_iter()
        .collect();

        insta::assert_snapshot!(agg.to_string(), @r"
        2 errors occurred during processing
          - kind must be specified for item: {}
          - no matching types for category foo
        ");
    }
}
