//! PC to instruction-ordinal indexing
//!
//! Source maps are addressed by instruction ordinal while the VM reports
//! byte-offset program counters, so every traced contract needs a mapping
//! between the two. PUSH immediates occupy bytes without being
//! instructions and must be skipped, otherwise immediate bytes would be
//! misread as opcodes.

use std::collections::HashMap;

use revm::bytecode::opcode::{PUSH1, PUSH32};

/// Builds the PC → instruction ordinal index for one deployed bytecode.
///
/// A `PUSH_n` opcode consumes `n + 1` program-counter positions but a
/// single ordinal. A PUSH truncated by the end of the code still yields
/// its ordinal; the scan simply stops afterwards.
pub fn instruction_index(code: &[u8]) -> HashMap<usize, usize> {
    let mut index = HashMap::new();
    let mut pc = 0usize;
    let mut ordinal = 0usize;

    while pc < code.len() {
        index.insert(pc, ordinal);
        let opcode = code[pc];
        pc += 1;
        if (PUSH1..=PUSH32).contains(&opcode) {
            pc += (opcode - PUSH1) as usize + 1;
        }
        ordinal += 1;
    }

    index
}
