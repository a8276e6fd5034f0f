//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - a cleanup request or one of its items is invalid
pub const VALIDATION_ERROR: i32 = 2;

/// Cluster error - the cluster could not be reached or configured
pub const CLUSTER_ERROR: i32 = 3;

/// Cleanup error - a pass finished with at least one failed item
pub const CLEANUP_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
