//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the cache's collaborators.
///
/// The cache never fails on its own account: these variants come from key
/// normalization or from setting up a timer facility. Fetch failures are not
/// wrapped here, they reach the caller of `get` in the fetch function's own
/// error type.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key could not be serialized into a canonical string
    #[error("Key normalization failed: {0}")]
    KeyNormalization(#[from] serde_json::Error),

    /// A custom normalizer rejected the key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A runtime-backed scheduler was requested outside a Tokio runtime
    #[error("No Tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
