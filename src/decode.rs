//! Parameter decoding
//!
//! Arguments are rendered as `"name = value"` strings, either from the
//! ABI-encoded calldata of an external call (buffer mode) or from the
//! evaluation stack at an internal function entry (stack mode). Only
//! primitive types are rendered; every other type still consumes its
//! 32-byte slot so subsequent parameters stay aligned.

use alloy::primitives::{Address, B256, I256, U256};
use tracing::warn;

use crate::ast::Parameter;
use crate::traits::StackView;

/// Decodes parameters from an ABI-encoded argument buffer.
///
/// `data` starts after the 4-byte selector. Each parameter consumes one
/// 32-byte big-endian word whether or not it is rendered. A buffer that
/// runs out mid-list is absorbed: the remaining parameters are elided.
pub fn decode_calldata(params: &[Parameter], data: &[u8]) -> Vec<String> {
    let mut decoded = Vec::new();
    let mut offset = 0usize;

    for param in params {
        let Some(word) = data.get(offset..offset + 32) else {
            warn!(offset, available = data.len(), "calldata exhausted while decoding parameters");
            break;
        };
        offset += 32;
        if let Some(rendered) = decode_word(param, U256::from_be_slice(word)) {
            decoded.push(rendered);
        }
    }

    decoded
}

/// Decodes parameters from the evaluation stack at a function entry.
///
/// The callee's arguments sit on top of the stack in reverse source
/// order, one word each; the rendered list is reversed afterwards so the
/// output follows source order.
pub fn decode_stack_args<S>(params: &[Parameter], stack: &S) -> Vec<String>
where
    S: StackView + ?Sized,
{
    let mut decoded = Vec::new();

    for (slot, param) in params.iter().rev().enumerate() {
        let Some(word) = stack.back(slot) else {
            warn!(slot, "evaluation stack exhausted while decoding parameters");
            break;
        };
        if let Some(rendered) = decode_word(param, word) {
            decoded.push(rendered);
        }
    }

    decoded.reverse();
    decoded
}

/// Renders a single 32-byte word according to the parameter's type.
///
/// Unsigned integers print as decimal, signed integers as two's
/// complement decimal, addresses in checksummed form. Unsupported types
/// yield `None`.
pub fn decode_word(param: &Parameter, word: U256) -> Option<String> {
    let type_string = param.type_descriptions.type_string.as_str();

    let value = if type_string.starts_with("uint") {
        word.to_string()
    } else if type_string.starts_with("int") {
        I256::from_raw(word).to_string()
    } else if type_string.starts_with("address") {
        Address::from_word(B256::from(word)).to_checksum(None)
    } else if type_string == "bool" {
        if word.is_zero() { "false" } else { "true" }.to_string()
    } else {
        return None;
    };

    Some(format!("{} = {}", param.name, value))
}
