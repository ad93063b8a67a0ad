//! Error types for E2E testing

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Translation did not render within {timeout_ms} ms")]
    OutputTimeout { timeout_ms: u64 },

    #[error("Output mismatch: expected {expected:?}, got {actual:?}\n{detail}")]
    Mismatch {
        expected: String,
        actual: String,
        detail: String,
    },

    #[error("Repeated translation differs: first {first:?}, then {second:?}")]
    Idempotence { first: String, second: String },

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright driver error: {0}")]
    Driver(String),

    #[error("Playwright driver exited unexpectedly")]
    DriverExited,

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Fixture error: {0}")]
    Fixture(#[from] swiftcheck_fixtures::FixtureError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// How a failed case is classified in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The page did not load
    Navigation,
    /// The translation did not render in time
    Timeout,
    /// Rendered text differs from the fixture
    Mismatch,
    /// A repeated translation produced different text
    Idempotence,
    /// The browser or driver failed underneath the test
    Harness,
}

impl E2eError {
    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::Navigation { .. } => FailureKind::Navigation,
            E2eError::OutputTimeout { .. } | E2eError::Timeout(_) => FailureKind::Timeout,
            E2eError::Mismatch { .. } => FailureKind::Mismatch,
            E2eError::Idempotence { .. } => FailureKind::Idempotence,
            _ => FailureKind::Harness,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
