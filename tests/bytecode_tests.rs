//! Tests for the PC → instruction ordinal index

use soltrace::bytecode::instruction_index;

#[test]
fn skips_push_immediates() {
    // PUSH1 0xaa; PUSH2 0xbb 0xcc; ADD; STOP
    let code = [0x60, 0xaa, 0x61, 0xbb, 0xcc, 0x01, 0x00];
    let index = instruction_index(&code);

    assert_eq!(index.len(), 4);
    assert_eq!(index[&0], 0);
    assert_eq!(index[&2], 1);
    assert_eq!(index[&5], 2);
    assert_eq!(index[&6], 3);
    // Immediate bytes are not instruction boundaries.
    assert!(!index.contains_key(&1));
    assert!(!index.contains_key(&3));
    assert!(!index.contains_key(&4));
}

#[test]
fn truncated_trailing_push_yields_one_ordinal() {
    // STOP; PUSH32 with only three immediate bytes present
    let code = [0x00, 0x7f, 0x01, 0x02, 0x03];
    let index = instruction_index(&code);

    assert_eq!(index.len(), 2);
    assert_eq!(index[&0], 0);
    assert_eq!(index[&1], 1);
}

#[test]
fn ordinals_strictly_increase_along_pcs() {
    // PUSH1 0x01; JUMPDEST; PUSH1 0x02; JUMP; JUMPDEST; STOP
    let code = [0x60, 0x01, 0x5b, 0x60, 0x02, 0x56, 0x5b, 0x00];
    let index = instruction_index(&code);

    let mut pcs: Vec<usize> = index.keys().copied().collect();
    pcs.sort_unstable();
    let ordinals: Vec<usize> = pcs.iter().map(|pc| index[pc]).collect();

    for pair in ordinals.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[test]
fn empty_code_yields_empty_index() {
    assert!(instruction_index(&[]).is_empty());
}
