//! Minimal ABI call-data encoding.
//!
//! Supports exactly the argument shapes the builders emit: address, uint256,
//! bool, and string. Static arguments occupy one 32-byte head word; dynamic
//! strings put their offset in the head and length-prefixed padded bytes in
//! the tail.

use alloy_primitives::{Address, U256, keccak256};

/// Typed argument for call-data encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    Str(String),
}

impl AbiValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::Uint(_) => "uint256",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, Self::Str(_))
    }
}

/// Canonical function signature for a name and argument list, e.g.
/// `recordProvenance(address,uint256,string)`.
pub fn canonical_signature(name: &str, args: &[AbiValue]) -> String {
    let types: Vec<&str> = args.iter().map(AbiValue::type_name).collect();
    format!("{name}({})", types.join(","))
}

/// First four bytes of the keccak-256 of the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode a full call: selector followed by head/tail encoded arguments.
pub fn encode_call(name: &str, args: &[AbiValue]) -> Vec<u8> {
    let mut data = selector(&canonical_signature(name, args)).to_vec();
    data.extend_from_slice(&encode_arguments(args));
    data
}

fn encode_arguments(args: &[AbiValue]) -> Vec<u8> {
    let head_len = 32 * args.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for arg in args {
        if arg.is_dynamic() {
            let offset = U256::from(head_len + tail.len());
            head.extend_from_slice(&offset.to_be_bytes::<32>());
            encode_tail(&mut tail, arg);
        } else {
            encode_static(&mut head, arg);
        }
    }

    head.extend_from_slice(&tail);
    head
}

fn encode_static(out: &mut Vec<u8>, arg: &AbiValue) {
    match arg {
        AbiValue::Address(address) => {
            out.extend_from_slice(&[0u8; 12]);
            out.extend_from_slice(address.as_slice());
        }
        AbiValue::Uint(value) => out.extend_from_slice(&value.to_be_bytes::<32>()),
        AbiValue::Bool(flag) => {
            let mut word = [0u8; 32];
            word[31] = u8::from(*flag);
            out.extend_from_slice(&word);
        }
        AbiValue::Str(_) => unreachable!("dynamic values are tail-encoded"),
    }
}

fn encode_tail(out: &mut Vec<u8>, arg: &AbiValue) {
    let AbiValue::Str(text) = arg else {
        unreachable!("only strings are dynamic here");
    };
    let bytes = text.as_bytes();
    out.extend_from_slice(&U256::from(bytes.len()).to_be_bytes::<32>());
    out.extend_from_slice(bytes);
    let padding = (32 - bytes.len() % 32) % 32;
    out.extend_from_slice(&vec![0u8; padding]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_known_transfer_value() {
        assert_eq!(
            hex::encode(selector("transfer(address,uint256)")),
            "a9059cbb"
        );
    }

    #[test]
    fn canonical_signature_lists_argument_types() {
        let args = [
            AbiValue::Address(Address::ZERO),
            AbiValue::Uint(U256::from(1u8)),
            AbiValue::Str("x".to_string()),
        ];
        assert_eq!(
            canonical_signature("recordProvenance", &args),
            "recordProvenance(address,uint256,string)"
        );
    }

    #[test]
    fn static_arguments_are_left_padded_words() {
        let owner = Address::repeat_byte(0xaa);
        let data = encode_call("f", &[AbiValue::Address(owner), AbiValue::Bool(true)]);
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], owner.as_slice());
        assert_eq!(data[4 + 63], 1);
    }

    #[test]
    fn string_argument_encodes_offset_length_and_padding() {
        let data = encode_call("g", &[AbiValue::Str("hello".to_string())]);
        let args = &data[4..];
        // Offset word points just past the single head word.
        assert_eq!(U256::from_be_slice(&args[..32]), U256::from(32u8));
        // Length word, then content padded to a full word.
        assert_eq!(U256::from_be_slice(&args[32..64]), U256::from(5u8));
        assert_eq!(&args[64..69], b"hello");
        assert_eq!(&args[69..96], &[0u8; 27]);
        assert_eq!(args.len(), 96);
    }

    #[test]
    fn mixed_static_and_dynamic_layout() {
        let data = encode_call(
            "h",
            &[
                AbiValue::Uint(U256::from(7u8)),
                AbiValue::Str("ab".to_string()),
            ],
        );
        let args = &data[4..];
        assert_eq!(U256::from_be_slice(&args[..32]), U256::from(7u8));
        // Dynamic offset = two head words = 64.
        assert_eq!(U256::from_be_slice(&args[32..64]), U256::from(64u8));
        assert_eq!(U256::from_be_slice(&args[64..96]), U256::from(2u8));
        assert_eq!(&args[96..98], b"ab");
    }

    #[test]
    fn empty_string_still_emits_length_word() {
        let data = encode_call("g", &[AbiValue::Str(String::new())]);
        let args = &data[4..];
        assert_eq!(args.len(), 64);
        assert_eq!(U256::from_be_slice(&args[32..64]), U256::ZERO);
    }
}
