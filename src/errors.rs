//! Error types for trace reconstruction
//!
//! Only construction-time failures surface as errors: artifact loading and
//! configuration parsing. Runtime anomalies (missing artifacts, unresolved
//! selectors, jump-depth underflow) are absorbed and logged by the tracer.

use alloy::primitives::Address;
use thiserror::Error;

use crate::source_map::SourceMapError;

/// Top-level error type for the tracing system
#[derive(Debug, Error)]
pub enum TraceError {
    /// Errors loading or decoding contract artifacts
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Errors reading the trace configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Artifact-specific errors
///
/// These occur while loading the artifact set or while deriving the
/// per-contract lookup tables at tracer construction. Each variant names
/// the offending file or contract.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Artifact file could not be read
    #[error("Failed to read artifact file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Artifact file is not valid JSON or misses required fields
    #[error("Failed to parse artifact file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Compressed source map of one contract could not be decoded
    #[error("Malformed source map for {address}: {source}")]
    SourceMap {
        address: Address,
        #[source]
        source: SourceMapError,
    },
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON
    #[error("Failed to parse config file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
