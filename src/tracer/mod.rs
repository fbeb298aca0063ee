//! Source-level trace reconstruction
//!
//! This module provides the main [`SourceTracer`] type and its lookup
//! machinery. The implementation is split across several files:
//!
//! - `mod.rs`: tracer state, construction and per-contract lookups
//! - `step.rs`: the callback-driven trace state machine
//! - `inspector.rs`: `revm` Inspector adapter
//!
//! # State management
//!
//! All per-contract tables are owned by the tracer: decoded source maps
//! and private-function lists are built eagerly at construction (a
//! malformed source map is the only fatal error), while PC→instruction
//! indices are built lazily from the runtime bytecode the VM reports on
//! the first step inside a contract.

use std::collections::HashMap;
use std::fmt::Write as _;

use alloy::primitives::Address;
use tracing::warn;

mod inspector;
mod step;

use crate::artifact::ArtifactSet;
use crate::ast::{FunctionDefinition, FunctionSelector};
use crate::bytecode::instruction_index;
use crate::errors::ArtifactError;
use crate::source_map::{parse_source_map, SourceMapping};
use crate::types::CallFrame;

/// Reconstructs the source-level call stack of one transaction
///
/// The tracer consumes VM callbacks ([`SourceTracer::on_call_start`],
/// [`SourceTracer::on_step`]) and accumulates one [`CallFrame`] per
/// entered function. Frames are never popped: the output is the ordered
/// set of every function entry observed, an audit log rather than a live
/// stack.
#[derive(Debug)]
pub struct SourceTracer {
    artifacts: ArtifactSet,
    /// Every frame entered so far, in entry order
    frames: Vec<CallFrame>,
    /// Candidate frame recorded at a JUMP, consumed by the next JUMPDEST
    pending_jump: Option<CallFrame>,
    /// Count of unresolved internal jumps, floored at zero
    jump_depth: usize,
    /// Message-call depth, maintained by the revm adapter
    call_depth: usize,
    instruction_maps: HashMap<Address, HashMap<usize, usize>>,
    source_maps: HashMap<Address, Vec<SourceMapping>>,
    private_functions: HashMap<Address, Vec<FunctionDefinition>>,
}

impl SourceTracer {
    /// Builds a tracer over the given artifact set.
    ///
    /// Decodes every contract's source map up front; a malformed map
    /// fails construction with the offending contract's address.
    pub fn new(artifacts: ArtifactSet) -> Result<Self, ArtifactError> {
        let mut source_maps = HashMap::new();
        let mut private_functions = HashMap::new();

        for (address, artifact) in &artifacts {
            let mappings = parse_source_map(&artifact.source_map, &artifact.source_code)
                .map_err(|source| ArtifactError::SourceMap {
                    address: *address,
                    source,
                })?;
            source_maps.insert(*address, mappings);
            private_functions.insert(
                *address,
                artifact.ast.private_functions().into_iter().cloned().collect(),
            );
        }

        Ok(Self {
            artifacts,
            frames: Vec::new(),
            pending_jump: None,
            jump_depth: 0,
            call_depth: 0,
            instruction_maps: HashMap::new(),
            source_maps,
            private_functions,
        })
    }

    /// Frames entered so far, in entry order.
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Consumes the tracer and returns the accumulated frames.
    pub fn into_frames(self) -> Vec<CallFrame> {
        self.frames
    }

    /// Artifact set the tracer was built over.
    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Renders the trace, one line per frame:
    /// `<contract_name>:<line><TAB × (depth + 2)><source_snippet>`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for frame in &self.frames {
            let name = self
                .artifacts
                .get(&frame.contract)
                .map(|artifact| artifact.name.as_str())
                .unwrap_or("N/A");
            let _ = writeln!(
                out,
                "{}:{}{}{}",
                name,
                frame.line,
                "\t".repeat(frame.depth + 2),
                frame.source
            );
        }
        out
    }

    /// Instruction ordinal for `pc`, memoizing the index per contract.
    ///
    /// A PC outside the index is absorbed: logged, ordinal 0.
    pub(crate) fn instruction_at(&mut self, address: Address, code: &[u8], pc: usize) -> usize {
        let index = self
            .instruction_maps
            .entry(address)
            .or_insert_with(|| instruction_index(code));
        match index.get(&pc) {
            Some(ordinal) => *ordinal,
            None => {
                warn!(contract = %address, pc, "missing instruction mapping");
                0
            }
        }
    }

    pub(crate) fn mapping_at(&self, address: Address, instruction: usize) -> Option<SourceMapping> {
        self.source_maps.get(&address)?.get(instruction).copied()
    }

    /// Last mapping before `instruction` whose span differs from it.
    ///
    /// At a CALL-family instruction the current mapping usually covers
    /// the whole call expression emitted by the compiler's calling
    /// preamble; the last differing mapping identifies the callsite
    /// expression itself. Falls back to the current mapping when no
    /// earlier span differs.
    pub(crate) fn previous_mapping_at(
        &self,
        address: Address,
        instruction: usize,
    ) -> Option<SourceMapping> {
        let mappings = self.source_maps.get(&address)?;
        let current = *mappings.get(instruction)?;

        let mut i = instruction;
        while i > 0 {
            let candidate = mappings[i - 1];
            if candidate.start != current.start || candidate.length != current.length {
                return Some(candidate);
            }
            i -= 1;
        }
        Some(current)
    }

    /// Source text covered by `mapping`, `"N/A"` when out of range or
    /// synthetic.
    pub(crate) fn snippet(&self, address: Address, mapping: &SourceMapping) -> String {
        let Some(artifact) = self.artifacts.get(&address) else {
            return "N/A".into();
        };
        let Some((start, length)) = mapping.span() else {
            return "N/A".into();
        };
        artifact
            .source_code
            .get(start..start + length)
            .map(str::to_owned)
            .unwrap_or_else(|| "N/A".into())
    }

    /// Private function whose definition starts exactly at the mapping's
    /// span start.
    pub(crate) fn private_function_at(
        &self,
        address: Address,
        mapping: &SourceMapping,
    ) -> Option<&FunctionDefinition> {
        self.private_functions
            .get(&address)?
            .iter()
            .find(|func| func.src.start as i64 == mapping.start)
    }

    /// Externally addressable function of `address` matching `selector`.
    pub(crate) fn find_public_function(
        &self,
        address: Address,
        selector: [u8; 4],
    ) -> Option<&FunctionDefinition> {
        let artifact = self.artifacts.get(&address)?;
        artifact
            .ast
            .public_functions()
            .into_iter()
            .find(|func| func.selector() == FunctionSelector::Hash(selector))
    }
}
