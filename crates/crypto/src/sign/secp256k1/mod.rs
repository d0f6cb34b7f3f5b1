// Path: crates/crypto/src/sign/secp256k1/mod.rs
//! secp256k1 node keys as stored in a node group's key secret.

use crate::address::{
    address_from_raw, decode_hex, parse_public_key, Address, PUBLIC_KEY_LEN, UNCOMPRESSED_TAG,
};
use crate::error::CryptoError;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

/// Length of a secp256k1 private scalar in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// A node's secp256k1 key pair.
#[derive(Clone)]
pub struct NodeKeyPair {
    secret: SecretKey,
    public: [u8; PUBLIC_KEY_LEN],
}

impl NodeKeyPair {
    /// Generate a new key pair from the operating system RNG
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a new key pair from the given RNG
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_secret(SecretKey::random(rng))
    }

    fn from_secret(secret: SecretKey) -> Self {
        let point = secret.public_key().to_encoded_point(false);
        let mut public = [0u8; PUBLIC_KEY_LEN];
        // Skip the 04 tag of the SEC1 encoding.
        for (dst, src) in public.iter_mut().zip(point.as_bytes().iter().skip(1)) {
            *dst = *src;
        }
        Self { secret, public }
    }

    /// Create from a hex-encoded private scalar
    pub fn from_private_hex(private_key: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(decode_hex(private_key)?);
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(CryptoError::InvalidLength {
                expected: PRIVATE_KEY_LEN,
                got: bytes.len(),
            });
        }
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_secret(secret))
    }

    /// Validates a user-supplied pair: the public key must be a curve point and
    /// the private key must derive it.
    pub fn from_supplied(public_key: &str, private_key: &str) -> Result<Self, CryptoError> {
        let supplied = parse_public_key(public_key)?;
        validate_point(&supplied)?;
        let pair = Self::from_private_hex(private_key)?;
        if pair.public != supplied {
            return Err(CryptoError::KeyMismatch {
                public_key: public_key.to_string(),
            });
        }
        Ok(pair)
    }

    /// The uncompressed public key without its tag.
    pub fn public_key_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public
    }

    /// The public key as `0x`-prefixed hex, the `public.key` secret field.
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public))
    }

    /// The public key as bare hex, the `enode.key` secret field and enode URL id.
    pub fn enode_id(&self) -> String {
        hex::encode(self.public)
    }

    /// The private scalar as bare hex, the `private.key` secret field.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret.to_bytes()))
    }

    /// The account address of this key.
    pub fn address(&self) -> Address {
        address_from_raw(&self.public)
    }
}

impl std::fmt::Debug for NodeKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeKeyPair")
            .field("public", &self.enode_id())
            .finish_non_exhaustive()
    }
}

/// Checks that `x || y` is a point on secp256k1.
pub fn validate_point(public: &[u8; PUBLIC_KEY_LEN]) -> Result<(), CryptoError> {
    let mut sec1 = [0u8; PUBLIC_KEY_LEN + 1];
    let (tag, coords) = sec1.split_at_mut(1);
    tag.copy_from_slice(&[UNCOMPRESSED_TAG]);
    coords.copy_from_slice(public);
    PublicKey::from_sec1_bytes(&sec1)
        .map(|_| ())
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

#[cfg(test)]
mod tests;
