// Path: crates/crypto/src/address.rs
//! Hex parsing of public keys and Ethereum-style address derivation.

use crate::algorithms::hash::keccak256;
use crate::error::CryptoError;

/// A 20-byte account address.
pub type Address = [u8; 20];

/// Length of an uncompressed secp256k1 public key without its SEC1 prefix.
pub const PUBLIC_KEY_LEN: usize = 64;
/// SEC1 tag of an uncompressed point.
pub const UNCOMPRESSED_TAG: u8 = 0x04;

/// Removes a leading `0x` or `0X`, if any.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decodes a hex string with an optional `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(strip_hex_prefix(s.trim())).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

/// Parses an uncompressed public key into its 64-byte `x || y` form.
///
/// Accepts 64 raw bytes, or 65 bytes starting with the `04` tag.
pub fn parse_public_key(s: &str) -> Result<[u8; PUBLIC_KEY_LEN], CryptoError> {
    let bytes = decode_hex(s)?;
    let raw = match bytes.split_first() {
        Some((&UNCOMPRESSED_TAG, rest)) if bytes.len() == PUBLIC_KEY_LEN + 1 => rest,
        Some(_) if bytes.len() == PUBLIC_KEY_LEN + 1 => {
            return Err(CryptoError::InvalidPublicKey(
                "65-byte key must start with the 04 tag".to_string(),
            ))
        }
        _ => bytes.as_slice(),
    };
    <[u8; PUBLIC_KEY_LEN]>::try_from(raw).map_err(|_| CryptoError::InvalidLength {
        expected: PUBLIC_KEY_LEN,
        got: raw.len(),
    })
}

/// The low-order 20 bytes of Keccak-256 over `x || y`.
pub fn address_from_raw(public: &[u8; PUBLIC_KEY_LEN]) -> Address {
    let digest = keccak256(public);
    let mut address = [0u8; 20];
    for (dst, src) in address.iter_mut().zip(digest.iter().skip(12)) {
        *dst = *src;
    }
    address
}

/// Derives the address of a hex-encoded public key.
pub fn address_from_public_key(public_key: &str) -> Result<Address, CryptoError> {
    parse_public_key(public_key).map(|raw| address_from_raw(&raw))
}

/// Formats an address as lower-case `0x` hex.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Parses a `0x`-prefixed or bare 20-byte hex address.
pub fn parse_address(s: &str) -> Result<Address, CryptoError> {
    let bytes = decode_hex(s)?;
    let got = bytes.len();
    Address::try_from(bytes).map_err(|_| CryptoError::InvalidLength { expected: 20, got })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Public key of private key 1, i.e. the secp256k1 generator point.
    const G: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
                     483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    #[test]
    fn generator_point_maps_to_known_address() {
        let addr = address_from_public_key(G).unwrap();
        assert_eq!(
            format_address(&addr),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn tag_and_prefix_are_optional() {
        let untagged = G.get(2..).unwrap();
        let expected = address_from_public_key(G).unwrap();
        assert_eq!(address_from_public_key(untagged).unwrap(), expected);
        assert_eq!(
            address_from_public_key(&format!("0x{untagged}")).unwrap(),
            expected
        );
        assert_eq!(
            address_from_public_key(&format!("0x{G}")).unwrap(),
            expected
        );
    }

    #[test]
    fn wrong_lengths_and_tags_are_rejected() {
        assert!(matches!(
            parse_public_key("abcd"),
            Err(CryptoError::InvalidLength { expected: 64, got: 2 })
        ));
        let bad_tag = format!("02{}", G.get(2..).unwrap());
        assert!(matches!(
            parse_public_key(&bad_tag),
            Err(CryptoError::InvalidPublicKey(_))
        ));
        assert!(matches!(parse_public_key("0xzz"), Err(CryptoError::InvalidHex(_))));
    }

    #[test]
    fn addresses_parse_with_or_without_prefix() {
        let a = parse_address("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap();
        let b = parse_address("7E5F4552091A69125D5DFCB7B8C2659029395BDF").unwrap();
        assert_eq!(a, b);
        assert!(matches!(
            parse_address("0x1234"),
            Err(CryptoError::InvalidLength { expected: 20, got: 2 })
        ));
    }
}
