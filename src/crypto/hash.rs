//! Digest functions
//!
//! The chain hashes everything with blake2b-256 personalized as
//! `ckb-default-hash`. Ethereum- and Bitcoin-style signing wrap the
//! transaction digest in their message-signing prefixes first.

use std::fmt;

use blake2b_simd::{Params, State};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use sha3::Keccak256;

use crate::constants::{HASH_PERSONALIZATION, IDENTITY_HASH_SIZE};

/// 32-byte hash output
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// All-zero hash
    pub const fn zero() -> Self {
        Hash([0u8; 32])
    }

    /// Parse from hex, with or without a `0x` prefix
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut arr = [0u8; 32];
        hex::decode_to_slice(hex, &mut arr)?;
        Ok(Hash(arr))
    }

    /// Lowercase hex without a `0x` prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw 32-byte digest
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

/// blake2b-256 with an arbitrary 16-byte personalization
pub fn personalized_hash(message: &[u8], personalization: &[u8; 16]) -> Hash {
    let hash = Params::new()
        .hash_length(32)
        .personal(personalization)
        .hash(message);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_bytes());
    Hash(out)
}

/// The chain's default hash
pub fn ckb_hash(message: &[u8]) -> Hash {
    personalized_hash(message, HASH_PERSONALIZATION)
}

/// First 20 bytes of [`ckb_hash`], used as the default lock argument
pub fn blake160(message: &[u8]) -> [u8; IDENTITY_HASH_SIZE] {
    let hash = ckb_hash(message);
    let mut out = [0u8; IDENTITY_HASH_SIZE];
    out.copy_from_slice(&hash.0[..IDENTITY_HASH_SIZE]);
    out
}

/// Incremental [`ckb_hash`] for digests built from several parts
pub struct CkbHasher {
    state: State,
}

impl Default for CkbHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CkbHasher {
    pub fn new() -> Self {
        let state = Params::new()
            .hash_length(32)
            .personal(HASH_PERSONALIZATION)
            .to_state();
        Self { state }
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.state.update(data);
        self
    }

    pub fn finalize(&self) -> Hash {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.state.finalize().as_bytes());
        Hash(out)
    }
}

/// Keccak-256 over `0x19 "Ethereum Signed Message:\n" || decimal(len) || message`
pub fn legacy_prefixed_hash(message: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    Hash(hasher.finalize().into())
}

/// Double SHA-256 over `0x18 "Bitcoin Signed Message:\n" || varint(len) || message`
pub fn bitcoin_message_hash(message: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(b"\x18Bitcoin Signed Message:\n");
    hasher.update(compact_size(message.len() as u64));
    hasher.update(message);
    let first = hasher.finalize();
    Hash(Sha256::digest(first).into())
}

/// Bitcoin variable-length integer
fn compact_size(n: u64) -> Vec<u8> {
    match n {
        0..=0xfc => vec![n as u8],
        0xfd..=0xffff => {
            let mut v = vec![0xfd];
            v.extend_from_slice(&(n as u16).to_le_bytes());
            v
        }
        0x1_0000..=0xffff_ffff => {
            let mut v = vec![0xfe];
            v.extend_from_slice(&(n as u32).to_le_bytes());
            v
        }
        _ => {
            let mut v = vec![0xff];
            v.extend_from_slice(&n.to_le_bytes());
            v
        }
    }
}
