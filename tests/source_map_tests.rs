//! Tests for compressed source-map decoding
//!
//! Covers the delta-inheritance format, line precomputation, the
//! density invariant against the instruction index, error reporting for
//! malformed maps and the encode/decode round-trip.

use soltrace::bytecode::instruction_index;
use soltrace::source_map::{encode_source_map, parse_source_map, JumpKind, SourceMapping};

#[test]
fn decodes_delta_inheritance() {
    let source = "contract A {}\n";
    let mappings = parse_source_map("10:5:1:i;;12:3", source).unwrap();

    assert_eq!(mappings.len(), 3);
    assert_eq!(
        mappings[0],
        SourceMapping {
            start: 10,
            length: 5,
            file: 1,
            jump: JumpKind::Into,
            line: 1,
        }
    );
    // A fully empty entry repeats the previous one.
    assert_eq!(mappings[1], mappings[0]);
    // Unmentioned trailing fields inherit as well.
    assert_eq!(
        mappings[2],
        SourceMapping {
            start: 12,
            length: 3,
            file: 1,
            jump: JumpKind::Into,
            line: 1,
        }
    );
}

#[test]
fn computes_lines_with_monotone_cursor() {
    let source = "first\nsecond\nthird\n";
    let mappings = parse_source_map("0:5:0:-;6:6;13:5;0:5", source).unwrap();

    assert_eq!(mappings[0].line, 1);
    assert_eq!(mappings[1].line, 2);
    assert_eq!(mappings[2].line, 3);
    // A regressing offset restarts the scan from the beginning.
    assert_eq!(mappings[3].line, 1);
}

#[test]
fn tolerates_negative_offsets_and_extra_fields() {
    let source = "contract A {}\n";
    // Compiler-generated code and the modifier-depth field of newer
    // compilers must both decode.
    let mappings = parse_source_map("-1:-1:-1:-;0:13:0:i:1", source).unwrap();

    assert_eq!(mappings[0].start, -1);
    assert_eq!(mappings[0].span(), None);
    assert_eq!(mappings[0].line, 1);
    assert_eq!(mappings[1].start, 0);
    assert_eq!(mappings[1].jump, JumpKind::Into);
}

#[test]
fn rejects_malformed_integer_fields() {
    let err = parse_source_map("10:5:0:-;x:3", "source").unwrap_err();
    assert_eq!(err.entry, 1);
    assert!(err.to_string().contains("start"));
}

#[test]
fn rejects_unknown_jump_classifier() {
    let err = parse_source_map("10:5:0:q", "source").unwrap_err();
    assert_eq!(err.entry, 0);
}

#[test]
fn decoded_length_matches_instruction_count() {
    // PUSH1 0x03; JUMP; JUMPDEST; STOP
    let code = [0x60, 0x03, 0x56, 0x5b, 0x00];
    let index = instruction_index(&code);

    let source = "contract A {}\n";
    let mappings = parse_source_map("0:13:0:-;;;", source).unwrap();

    assert_eq!(mappings.len(), index.len());
}

#[test]
fn encode_decode_round_trips() {
    let source = "first\nsecond\nthird\n";
    let original = parse_source_map("10:5:1:i;;12:3;:8:0:o;0:2", source).unwrap();

    let encoded = encode_source_map(&original);
    let reparsed = parse_source_map(&encoded, source).unwrap();

    assert_eq!(original, reparsed);
}

#[test]
fn encode_drops_repeated_fields() {
    let source = "contract A {}\n";
    let mappings = parse_source_map("10:5:1:i;10:5:1:i;12:5:1:i", source).unwrap();

    assert_eq!(encode_source_map(&mappings), "10:5:1:i;;12");
}
