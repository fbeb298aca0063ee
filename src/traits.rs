//! VM-facing view traits
//!
//! The tracer consumes per-instruction callbacks from whatever virtual
//! machine drives the replay. These traits are the entire surface it
//! needs: a readable memory, a readable evaluation stack and the identity
//! of the executing contract. The `revm` adapter in `tracer::inspector`
//! implements them over a live interpreter; tests implement them over
//! plain vectors.

use alloy::primitives::{Address, U256};

/// Read access to the VM memory of the executing frame
pub trait MemoryView {
    /// Copies `length` bytes starting at `offset`. Reads past the
    /// initialized region yield zeros.
    fn slice(&self, offset: usize, length: usize) -> Vec<u8>;
}

/// Read access to the VM evaluation stack
pub trait StackView {
    /// Word at position `i` counted from the top (0 = top), `None` when
    /// the stack is shallower.
    fn back(&self, i: usize) -> Option<U256>;
}

/// Identity and code of the executing contract
pub trait ContractView {
    /// Deployed bytecode currently executing.
    fn code(&self) -> &[u8];

    /// Address owning that bytecode.
    fn address(&self) -> Address;
}

/// One pre-execution instruction observation
///
/// `depth` is the VM-reported message-call depth; it is 1 while the root
/// frame's code executes.
pub struct VmStep<'a, M: ?Sized, S: ?Sized, C: ?Sized> {
    pub pc: usize,
    pub opcode: u8,
    pub memory: &'a M,
    pub stack: &'a S,
    pub contract: &'a C,
    pub depth: usize,
}

impl MemoryView for [u8] {
    fn slice(&self, offset: usize, length: usize) -> Vec<u8> {
        let mut out = vec![0u8; length];
        if offset < self.len() {
            let end = self.len().min(offset.saturating_add(length));
            out[..end - offset].copy_from_slice(&self[offset..end]);
        }
        out
    }
}

impl StackView for [U256] {
    fn back(&self, i: usize) -> Option<U256> {
        self.iter().rev().nth(i).copied()
    }
}
