//! Compiled contract artifacts
//!
//! The tracer consumes one artifact per traced contract address: the
//! deployed bytecode, the full source text, the compressed source map
//! and the AST. Anything else the compiler emits is ignored.

use std::{collections::HashMap, fs, path::Path};

use alloy::primitives::{Address, Bytes};
use serde::Deserialize;

use crate::ast::AstNode;
use crate::errors::ArtifactError;

/// Compiled artifact of a single contract
#[derive(Debug, Clone, Deserialize)]
pub struct ContractArtifact {
    /// Display name used when rendering the trace
    pub name: String,
    /// Deployed (runtime) bytecode
    pub bytecode: Bytes,
    /// Full source text
    pub source_code: String,
    /// Compressed source map for the deployed bytecode
    pub source_map: String,
    /// Compiler AST of the source unit
    pub ast: AstNode,
}

/// All artifacts of a replay, keyed by contract address
pub type ArtifactSet = HashMap<Address, ContractArtifact>;

/// Loads the artifact set from a single JSON file mapping hex addresses
/// to artifacts. Parsing normalizes address case, so mixed-case keys are
/// accepted.
pub fn load_artifacts(path: impl AsRef<Path>) -> Result<ArtifactSet, ArtifactError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
        path: path.display().to_string(),
        source,
    })
}
