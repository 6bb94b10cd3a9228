//! Error types for SERP fetching and comparison.

use thiserror::Error;

/// Errors surfaced by the serpdelta library
#[derive(Debug, Error)]
pub enum SerpError {
    /// Malformed request parameters, rejected before any fetch is attempted
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The results page could not be retrieved or no results were located
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Browser launch or CDP communication failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// A fetch exceeded its overall deadline
    #[error("Fetch timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl From<anyhow::Error> for SerpError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Fetch(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `SerpError`
pub type SerpResult<T> = Result<T, SerpError>;
