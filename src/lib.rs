//! # Source-level EVM transaction tracer
//!
//! Reconstructs a human-readable, source-level execution trace of a
//! single smart-contract transaction from per-instruction VM callbacks
//! and a set of compiled contract artifacts (bytecode, source code,
//! source map, AST).
//!
//! The tracer infers the source-level call stack from raw program
//! counters and opcode sequences: external message calls are resolved by
//! matching 4-byte function selectors against the contract AST, internal
//! calls are recognized from JUMP/JUMPDEST pairs whose source mappings
//! land on private function definitions, and argument values are decoded
//! from calldata (external entries) or the evaluation stack (internal
//! entries).
//!
//! ## Usage
//!
//! ```no_run
//! use soltrace::{load_artifacts, SourceTracer};
//!
//! # fn main() -> Result<(), soltrace::TraceError> {
//! let artifacts = load_artifacts("artifacts.json")?;
//! let mut tracer = SourceTracer::new(artifacts)?;
//!
//! // Drive the transaction through a revm interpreter with `&mut tracer`
//! // installed as the inspector, then inspect the reconstructed trace:
//! for frame in tracer.frames() {
//!     println!("{}:{} {}", frame.contract, frame.line, frame.source);
//! }
//! print!("{}", tracer.render());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module structure
//!
//! - `tracer`: the trace state machine and its revm adapter
//! - `artifact`: compiled contract artifacts and loading
//! - `ast`: AST node model, function discovery and selectors
//! - `source_map`: compressed source-map decoding
//! - `bytecode`: PC → instruction ordinal indexing
//! - `decode`: parameter decoding from calldata or the stack
//! - `traits`: the VM view interfaces the tracer consumes
//! - `types`: call frames and configuration
//! - `errors`: error types and handling

pub mod artifact;
pub mod ast;
pub mod bytecode;
pub mod decode;
pub mod errors;
pub mod source_map;
pub mod tracer;
pub mod traits;
pub mod types;

// Re-export core types for easier access
pub use artifact::{load_artifacts, ArtifactSet, ContractArtifact};
pub use errors::{ArtifactError, ConfigError, TraceError};
pub use tracer::SourceTracer;
pub use traits::{ContractView, MemoryView, StackView, VmStep};
pub use types::{CallFrame, TraceConfig};

// Re-export core libraries for convenience
pub use alloy;
pub use revm;
