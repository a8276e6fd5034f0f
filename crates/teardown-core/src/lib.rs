//! Teardown Core - Core types for pre-destroy cluster cleanup
//!
//! This crate provides the foundational types used throughout Teardown:
//! - `CleanupItem` / `CleanupAction`: One declarative target and what to do with it
//! - `CleanupRequestSpec`: The ordered item list plus the dry-run switch
//! - `TypeDescriptor` / `ObjectRef`: Resolved type identities and instance references
//! - `Conditions`: Status conditions merged by type

pub mod condition;
pub mod error;
pub mod item;
pub mod types;

pub use condition::{
    CONDITION_COMPLETE, CONDITION_INITIALIZED, Condition, ConditionStatus, Conditions,
    REASON_COMPLETED_SUCCESSFULLY, REASON_COMPLETED_WITH_ERRORS, REASON_NO_RESOURCES,
    REASON_RECONCILING,
};
pub use error::{CoreError, Result};
pub use item::{
    ACTION_DELETE, ACTION_SCALE_TO_ZERO, CleanupAction, CleanupItem, CleanupRequestSpec,
    EXTENSION_TYPE_KIND, ItemIssue,
};
pub use types::{DEFAULT_VERSION, ObjectRef, TypeDescriptor};
