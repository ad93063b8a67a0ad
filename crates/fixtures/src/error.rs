//! Error types for fixture loading

use thiserror::Error;

use crate::types::Category;

/// Result type alias using [`FixtureError`]
pub type Result<T> = std::result::Result<T, FixtureError>;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported fixture format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Duplicate fixture id {id} in {category} fixtures")]
    DuplicateId { category: Category, id: String },

    #[error("Malformed fixture id {id:?} in {category} fixtures")]
    InvalidId { category: Category, id: String },

    #[error("Fixture {id} has an empty {field} field")]
    EmptyField { id: String, field: &'static str },
}
