//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use teardown_core::CoreError;
use teardown_kube::CleanupError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The request document or its items are invalid
    #[error("Validation failed: {message}")]
    #[diagnostic(code(teardown::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Kubernetes client could not be created
    #[error("Cluster error: {message}")]
    #[diagnostic(
        code(teardown::cli::cluster),
        help("check the current kubeconfig context or the in-cluster service account")
    )]
    Cluster { message: String },

    /// A cleanup pass finished with failed items
    #[error("Cleanup finished with {errors} error(s) after targeting {count} resource(s)")]
    #[diagnostic(code(teardown::cli::cleanup))]
    CleanupFailed { count: usize, errors: usize },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(teardown::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(teardown::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            CliError::CleanupFailed { .. } => exit_codes::CLEANUP_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a cluster error
    pub fn cluster(message: impl Into<String>) -> Self {
        Self::Cluster {
            message: message.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::Validation {
                message: other.to_string(),
                help: Some("expected a CleanupRequest manifest or a bare spec with `resources`".to_string()),
            },
        }
    }
}

impl From<CleanupError> for CliError {
    fn from(err: CleanupError) -> Self {
        CliError::Internal {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::validation_with_help("x", "y").exit_code(),
            exit_codes::VALIDATION_ERROR
        );
        assert_eq!(CliError::cluster("x").exit_code(), exit_codes::CLUSTER_ERROR);
        assert_eq!(
            CliError::CleanupFailed { count: 1, errors: 2 }.exit_code(),
            exit_codes::CLEANUP_ERROR
        );
        assert_eq!(CliError::internal("x").exit_code(), exit_codes::ERROR);
    }

    #[test]
    fn test_core_io_error_maps_to_io() {
        let err: CliError =
            CoreError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing")).into();
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);
    }

    #[test]
    fn test_cleanup_failed_message() {
        let err = CliError::CleanupFailed { count: 3, errors: 1 };
        insta::assert_snapshot!(err.to_string(), @"Cleanup finished with 1 error(s) after targeting 3 resource(s)");
    }
}
