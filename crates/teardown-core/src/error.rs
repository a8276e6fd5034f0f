//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to parse cleanup request: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cleanup request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid item #{index}: {message}")]
    InvalidItem { index: usize, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
