// Path: crates/consensus/src/ibft2.rs
//! IBFT2 genesis extraData.
//!
//! The blob is the RLP encoding of
//! `[vanity (32 zero bytes), [validator addresses], vote, round, seals]`
//! where `vote` is the empty byte string, `round` is a 4-byte little-endian
//! zero and `seals` is the empty list.

use alloy_rlp::{Encodable, Header};
use besu_crypto::Address;

/// Length of the vanity prefix.
pub const VANITY_LEN: usize = 32;

/// Encodes the extraData for the given validators, in the given order.
pub fn encode_extra_data(validators: &[Address]) -> Vec<u8> {
    let vanity = [0u8; VANITY_LEN];
    let vote: &[u8] = &[];
    let round = 0u32.to_le_bytes();

    let validators_payload: usize = validators.iter().map(|a| a.length()).sum();
    let validators_header = Header {
        list: true,
        payload_length: validators_payload,
    };
    let seals_header = Header {
        list: true,
        payload_length: 0,
    };

    let payload_length = vanity.length()
        + validators_header.length()
        + validators_payload
        + vote.length()
        + round.length()
        + seals_header.length();
    let outer = Header {
        list: true,
        payload_length,
    };

    let mut out = Vec::with_capacity(outer.length() + payload_length);
    outer.encode(&mut out);
    vanity.encode(&mut out);
    validators_header.encode(&mut out);
    for address in validators {
        address.encode(&mut out);
    }
    vote.encode(&mut out);
    round.encode(&mut out);
    seals_header.encode(&mut out);
    out
}

/// `0x`-prefixed hex of [`encode_extra_data`], as written into `genesis.json`.
pub fn extra_data_hex(validators: &[Address]) -> String {
    format!("0x{}", hex::encode(encode_extra_data(validators)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use besu_crypto::address::parse_address;

    fn zeros() -> String {
        "00".repeat(VANITY_LEN)
    }

    #[test]
    fn empty_validator_set() {
        // vanity, empty list, empty vote, 4-byte round, empty seals
        let expected = format!("0xe9a0{}c080{}c0", zeros(), "8400000000");
        assert_eq!(extra_data_hex(&[]), expected);
    }

    #[test]
    fn single_validator_golden() {
        let addr = parse_address("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap();
        let expected = format!(
            "0xf83ea0{}d5947e5f4552091a69125d5dfcb7b8c2659029395bdf808400000000c0",
            zeros()
        );
        assert_eq!(extra_data_hex(&[addr]), expected);
    }

    #[test]
    fn two_validators_use_long_list_form() {
        let a = parse_address("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap();
        let b = parse_address("0x2b5ad5c4795c026514f8317c7a215e218dccd6cf").unwrap();
        let encoded = encode_extra_data(&[a, b]);
        assert_eq!(encoded.len(), 2 + 0x53);
        assert_eq!(encoded.get(..2), Some(&[0xf8, 0x53][..]));
        assert_eq!(encoded.get(35), Some(&0xea));
    }

    #[test]
    fn order_is_significant_and_output_deterministic() {
        let a = parse_address("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap();
        let b = parse_address("0x2b5ad5c4795c026514f8317c7a215e218dccd6cf").unwrap();
        assert_eq!(encode_extra_data(&[a, b]), encode_extra_data(&[a, b]));
        assert_ne!(encode_extra_data(&[a, b]), encode_extra_data(&[b, a]));
    }
}
