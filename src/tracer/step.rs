//! The trace state machine
//!
//! The tracer is a filter over the instruction stream. It reacts to the
//! CALL family (external frames), JUMP (pending-jump candidate) and
//! JUMPDEST (internal entry or return); every other opcode only clears
//! the pending register.
//!
//! Internal calls have no dedicated opcodes: the compiler implements
//! them as a JUMP into the function body and a JUMP back to a landing
//! pad placed right after the callsite. Entry is recognized by the
//! JUMPDEST's source mapping starting exactly at a known private
//! function definition; return is recognized by the landing pad sitting
//! at `pc + 1` of a JUMP that previously opened a frame. Both are
//! heuristics and both tolerate misclassification: the jump depth is
//! floored at zero and extra frames are acceptable.

use alloy::primitives::{hex, Address, B256, U256};
use once_cell::sync::Lazy;
use regex::Regex;
use revm::bytecode::opcode::{
    CALL, CALLCODE, DELEGATECALL, INVALID, JUMP, JUMPDEST, RETURN, REVERT, SELFDESTRUCT,
    STATICCALL, STOP,
};
use tracing::{debug, warn};

use super::SourceTracer;
use crate::ast::{FunctionKind, FunctionSelector};
use crate::decode::{decode_calldata, decode_stack_args};
use crate::traits::{ContractView, MemoryView, StackView, VmStep};
use crate::types::CallFrame;

/// A pending jump whose snippet is itself a whole function definition
/// comes from a modifier or a public function head, not from a callsite,
/// and must not open a frame.
static FUNCTION_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"function(.*\s)+\}").expect("static pattern"));

impl SourceTracer {
    /// Start-of-call hook, invoked once per message-call frame.
    ///
    /// Only the root entry opens a source frame here; nested calls are
    /// opened at their CALL-family instruction where the callsite is
    /// visible. An untraced callee takes no action.
    pub fn on_call_start(
        &mut self,
        _from: Address,
        to: Address,
        _is_call: bool,
        input: &[u8],
        _gas: u64,
        value: U256,
    ) {
        let Some(frame) = self.root_frame(to, input, value) else {
            return;
        };
        self.frames.push(frame);
    }

    /// Per-instruction hook, invoked before each opcode executes.
    pub fn on_step<M, S, C>(&mut self, step: &VmStep<'_, M, S, C>)
    where
        M: MemoryView + ?Sized,
        S: StackView + ?Sized,
        C: ContractView + ?Sized,
    {
        let address = step.contract.address();

        match step.opcode {
            CALL | CALLCODE | STATICCALL | DELEGATECALL => {
                self.handle_external_call(step, address);
            }
            JUMP => {
                // The candidate survives exactly until the next
                // instruction, where a JUMPDEST may consume it.
                self.pending_jump = self.jump_candidate(step, address);
                return;
            }
            JUMPDEST => {
                self.handle_jumpdest(step, address);
            }
            // Frames are not popped on exit: the trace is the cumulative
            // set of entries, not the live stack.
            RETURN | REVERT | STOP | SELFDESTRUCT | INVALID => {}
            _ => {}
        }

        self.pending_jump = None;
    }

    /// Fault hook; observation only.
    pub fn on_fault<M, S, C>(&mut self, step: &VmStep<'_, M, S, C>)
    where
        M: MemoryView + ?Sized,
        S: StackView + ?Sized,
        C: ContractView + ?Sized,
    {
        warn!(
            contract = %step.contract.address(),
            pc = step.pc,
            opcode = step.opcode,
            depth = step.depth,
            "vm fault"
        );
    }

    /// End-of-call hook; observation only.
    pub fn on_end(&mut self, output: &[u8], gas_used: u64) {
        debug!(output_len = output.len(), gas_used, "message call finished");
    }

    fn root_frame(&self, to: Address, input: &[u8], value: U256) -> Option<CallFrame> {
        let artifact = self.artifacts.get(&to)?;
        let functions = artifact.ast.public_functions();

        let selector = input.get(..4).and_then(|s| <[u8; 4]>::try_from(s).ok());
        let wanted = match selector {
            Some(selector) => FunctionSelector::Hash(selector),
            // Short calldata carries no selector: it dispatches to the
            // receive handler when value is attached and one exists,
            // otherwise to the fallback.
            None => {
                let has_receive = functions.iter().any(|f| f.kind == FunctionKind::Receive);
                if has_receive && !value.is_zero() {
                    FunctionSelector::Receive
                } else {
                    FunctionSelector::Fallback
                }
            }
        };

        let Some(func) = functions.into_iter().find(|f| f.selector() == wanted) else {
            debug!(contract = %to, "no function matches entry selector");
            return None;
        };

        let start = func.src.start;
        let line = 1 + artifact
            .source_code
            .as_bytes()
            .iter()
            .take(start)
            .filter(|&&b| b == b'\n')
            .count();
        let source = artifact
            .source_code
            .get(start..start + func.src.length)
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        let params = decode_calldata(
            &func.parameters.parameters,
            input.get(4..).unwrap_or_default(),
        );

        Some(CallFrame {
            contract: to,
            line,
            instruction: 0,
            source,
            depth: 0,
            params,
            pc: None,
        })
    }

    /// CALL/CALLCODE/STATICCALL/DELEGATECALL: opens a frame for the
    /// callee, with the callsite snippet taken from the caller's source
    /// map. The sub-call itself runs later; its input is already laid
    /// out in memory at `stack[3] .. stack[3] + stack[4]`.
    fn handle_external_call<M, S, C>(&mut self, step: &VmStep<'_, M, S, C>, address: Address)
    where
        M: MemoryView + ?Sized,
        S: StackView + ?Sized,
        C: ContractView + ?Sized,
    {
        let Some(target_word) = step.stack.back(1) else {
            warn!(contract = %address, pc = step.pc, "call target missing from stack");
            return;
        };
        let target = Address::from_word(B256::from(target_word));

        let (Some(offset), Some(length)) = (
            step.stack.back(3).and_then(word_to_usize),
            step.stack.back(4).and_then(word_to_usize),
        ) else {
            warn!(contract = %address, pc = step.pc, "call data range missing from stack");
            return;
        };
        let data = step.memory.slice(offset, length);

        let Some(selector) = data.get(..4).and_then(|s| <[u8; 4]>::try_from(s).ok()) else {
            debug!(contract = %address, pc = step.pc, "call input shorter than a selector");
            return;
        };
        let Some(func) = self.find_public_function(target, selector).cloned() else {
            debug!(
                contract = %target,
                selector = %hex::encode(selector),
                "unresolved call selector"
            );
            return;
        };

        let params = decode_calldata(&func.parameters.parameters, &data[4..]);
        let instruction = self.instruction_at(address, step.contract.code(), step.pc);
        let (line, source) = match self.previous_mapping_at(address, instruction) {
            Some(mapping) => (mapping.line, self.snippet(address, &mapping)),
            None => {
                warn!(contract = %address, instruction, "missing source mapping at call site");
                (0, "N/A".to_string())
            }
        };

        self.frames.push(CallFrame {
            contract: target,
            line,
            instruction,
            source,
            depth: step.depth + self.jump_depth,
            params,
            pc: None,
        });
    }

    /// Records the candidate frame for a JUMP. Whether it was a call or
    /// a return is only decided at the following JUMPDEST.
    fn jump_candidate<M, S, C>(
        &mut self,
        step: &VmStep<'_, M, S, C>,
        address: Address,
    ) -> Option<CallFrame>
    where
        M: MemoryView + ?Sized,
        S: StackView + ?Sized,
        C: ContractView + ?Sized,
    {
        if !self.artifacts.contains_key(&address) {
            return None;
        }

        let instruction = self.instruction_at(address, step.contract.code(), step.pc);
        let mapping = self.mapping_at(address, instruction)?;

        Some(CallFrame {
            contract: address,
            line: mapping.line,
            instruction,
            source: self.snippet(address, &mapping),
            depth: step.depth + self.jump_depth,
            params: Vec::new(),
            pc: Some(step.pc),
        })
    }

    fn handle_jumpdest<M, S, C>(&mut self, step: &VmStep<'_, M, S, C>, address: Address)
    where
        M: MemoryView + ?Sized,
        S: StackView + ?Sized,
        C: ContractView + ?Sized,
    {
        // Return: some frame was opened by a JUMP sitting immediately
        // before this landing pad.
        if let Some(return_pc) = step.pc.checked_sub(1) {
            if self.frames.iter().rev().any(|f| f.pc == Some(return_pc)) {
                if self.jump_depth == 0 {
                    warn!(contract = %address, pc = step.pc, "jump depth underflow");
                } else {
                    self.jump_depth -= 1;
                }
                return;
            }
        }

        // Entry: the landing pad's mapping starts a known private
        // function definition and a jump candidate is pending.
        let instruction = self.instruction_at(address, step.contract.code(), step.pc);
        let Some(mapping) = self.mapping_at(address, instruction) else {
            return;
        };
        let Some(func) = self.private_function_at(address, &mapping).cloned() else {
            return;
        };
        let Some(mut frame) = self.pending_jump.take() else {
            return;
        };
        if FUNCTION_HEAD.is_match(&frame.source) {
            return;
        }

        frame.params = decode_stack_args(&func.parameters.parameters, step.stack);
        self.frames.push(frame);
        self.jump_depth += 1;
    }
}

fn word_to_usize(word: U256) -> Option<usize> {
    usize::try_from(word).ok()
}
