//! CLI command implementations

pub mod apply;
pub mod crd;
pub mod run;
pub mod validate;
