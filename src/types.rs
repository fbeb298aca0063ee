//! Core output and configuration types

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ConfigError;

/// One reconstructed source-level call
///
/// Frames are appended as functions are entered and never mutated
/// afterwards; the full frame sequence is the trace output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallFrame {
    /// Contract the entered function belongs to
    pub contract: Address,
    /// 1-based source line of the entry point
    pub line: usize,
    /// Instruction ordinal at which the frame was opened
    pub instruction: usize,
    /// Source snippet identifying the entry (function head or callsite)
    pub source: String,
    /// Message-call depth plus intra-contract jump depth
    pub depth: usize,
    /// Decoded arguments as `"name = value"` strings, in source order
    pub params: Vec<String>,
    /// PC of the JUMP that opened the frame; used to recognize the
    /// matching return landing pad
    #[serde(skip)]
    pub(crate) pc: Option<usize>,
}

/// Transaction selection for a replay run
///
/// Loaded from a JSON file of the form
/// `{"tx": "0x…", "from": "0x…"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceConfig {
    /// Hash of the transaction to replay
    pub tx: B256,
    /// Sender address
    pub from: Address,
}

impl TraceConfig {
    /// Reads the configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}
