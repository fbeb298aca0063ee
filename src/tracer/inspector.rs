//! REVM Inspector implementation for the source tracer
//!
//! Wires [`SourceTracer`] into a revm interpreter: the `call`/`create`
//! hooks maintain the message-call depth (depth 1 while root-frame code
//! executes), the root call is forwarded to the start-of-call handler
//! and every interpreter step is forwarded through the view traits.

use std::borrow::Borrow;

use alloy::primitives::Address;
use revm::{
    context::ContextTr,
    interpreter::{
        interpreter_types::{InputsTr, Jumps, LegacyBytecode},
        CallInputs, CallOutcome, CreateInputs, CreateOutcome, Interpreter,
    },
    Inspector,
};

use super::SourceTracer;
use crate::traits::{ContractView, VmStep};

/// Executing-contract view over one interpreter step
struct StepContract<'a> {
    code: &'a [u8],
    address: Address,
}

impl ContractView for StepContract<'_> {
    fn code(&self) -> &[u8] {
        self.code
    }

    fn address(&self) -> Address {
        self.address
    }
}

impl<CTX> Inspector<CTX> for SourceTracer
where
    CTX: ContextTr,
{
    fn call(&mut self, context: &mut CTX, inputs: &mut CallInputs) -> Option<CallOutcome> {
        self.call_depth += 1;
        if self.call_depth == 1 {
            let input = inputs.input.bytes(context);
            self.on_call_start(
                inputs.caller,
                inputs.target_address,
                true,
                &input,
                inputs.gas_limit,
                inputs.call_value(),
            );
        }
        None
    }

    fn call_end(&mut self, _context: &mut CTX, _inputs: &CallInputs, outcome: &mut CallOutcome) {
        if self.call_depth == 1 {
            self.on_end(&outcome.result.output, outcome.result.gas.spent());
        }
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    fn create(&mut self, _context: &mut CTX, _inputs: &mut CreateInputs) -> Option<CreateOutcome> {
        self.call_depth += 1;
        None
    }

    fn create_end(
        &mut self,
        _context: &mut CTX,
        _inputs: &CreateInputs,
        _outcome: &mut CreateOutcome,
    ) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    fn step(&mut self, interp: &mut Interpreter, _context: &mut CTX) {
        let memory = interp.memory.borrow();
        let memory_bytes = memory.context_memory();
        let contract = StepContract {
            code: interp.bytecode.bytecode_slice(),
            address: interp
                .input
                .bytecode_address()
                .copied()
                .unwrap_or_else(|| interp.input.target_address()),
        };
        let step = VmStep {
            pc: interp.bytecode.pc(),
            opcode: interp.bytecode.opcode(),
            memory: &*memory_bytes,
            stack: interp.stack.data().as_slice(),
            contract: &contract,
            depth: self.call_depth,
        };
        self.on_step(&step);
    }
}
