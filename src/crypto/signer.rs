//! Recoverable ECDSA signing
//!
//! Produces the 65-byte compact form `v || r || s`. The nonce is derived per
//! RFC 6979 so signing the same digest twice gives identical bytes.

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::constants::{PUBKEY_SIZE, SIGNATURE_SIZE};
use crate::crypto::Hash;
use crate::error::{Error, Result};

/// 65-byte recoverable signature, laid out as `v || r || s`
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverableSignature(#[serde(with = "sig_serde")] pub [u8; SIGNATURE_SIZE]);

mod sig_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::SIGNATURE_SIZE;

    pub fn serialize<S>(bytes: &[u8; SIGNATURE_SIZE], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; SIGNATURE_SIZE], D::Error>
    where
        D: Deserializer<'de>,
    {
        let text: String = Deserialize::deserialize(deserializer)?;
        let mut arr = [0u8; SIGNATURE_SIZE];
        hex::decode_to_slice(text.trim_start_matches("0x"), &mut arr)
            .map_err(|_| serde::de::Error::custom("Invalid signature length"))?;
        Ok(arr)
    }
}

impl RecoverableSignature {
    /// All-zero placeholder used while the signing digest is computed
    pub const fn placeholder() -> Self {
        RecoverableSignature([0u8; SIGNATURE_SIZE])
    }

    /// Assemble `v || r || s` from a recovery id and a 64-byte `r || s`
    pub fn from_parts(recovery_id: u8, rs: &[u8; 64]) -> Self {
        let mut out = [0u8; SIGNATURE_SIZE];
        out[0] = recovery_id;
        out[1..].copy_from_slice(rs);
        RecoverableSignature(out)
    }

    /// Leading recovery byte, 0 or 1
    pub fn recovery_id(&self) -> u8 {
        self.0[0]
    }

    /// Big-endian `r` scalar
    pub fn r(&self) -> &[u8] {
        &self.0[1..33]
    }

    /// Big-endian `s` scalar
    pub fn s(&self) -> &[u8] {
        &self.0[33..65]
    }

    /// `v || r || s`, as carried in witness 0
    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE] {
        self.0
    }

    /// `r || s || v`, the layout of the chain's stock secp256k1 lock
    pub fn to_rsv_bytes(&self) -> [u8; SIGNATURE_SIZE] {
        let mut out = [0u8; SIGNATURE_SIZE];
        out[..64].copy_from_slice(&self.0[1..]);
        out[64] = self.0[0];
        out
    }

    /// Reconstruct the compressed public key that produced this signature
    pub fn recover_public_key(&self, digest: &Hash) -> Result<[u8; PUBKEY_SIZE]> {
        let signature = Signature::from_slice(&self.0[1..])
            .map_err(|e| Error::SignatureComputationFailed(e.to_string()))?;
        let recovery_id =
            RecoveryId::from_byte(self.recovery_id()).ok_or(Error::SignatureRecoveryFailed)?;
        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
            .map_err(|_| Error::SignatureRecoveryFailed)?;
        compress(&key)
    }
}

impl std::fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

pub(crate) fn compress(key: &VerifyingKey) -> Result<[u8; PUBKEY_SIZE]> {
    let point = key.to_encoded_point(true);
    point
        .as_bytes()
        .try_into()
        .map_err(|_| Error::KeyDerivationFailed)
}

/// Sign `digest` with `secret` and resolve the recovery id against `public_key`.
///
/// Only ids 0 and 1 are searched; the x-overflow ids 2 and 3 have negligible
/// probability on secp256k1. If neither candidate reproduces `public_key` the
/// key state is corrupt and [`Error::SignatureRecoveryFailed`] is returned.
pub fn sign_recoverable(
    secret: &[u8; 32],
    public_key: &[u8; PUBKEY_SIZE],
    digest: &Hash,
) -> Result<RecoverableSignature> {
    let signing_key = SigningKey::from_slice(secret).map_err(|_| Error::KeyDerivationFailed)?;
    let signature: Signature = signing_key
        .sign_prehash(digest.as_bytes())
        .map_err(|e| Error::SignatureComputationFailed(e.to_string()))?;
    let mut rs = [0u8; 64];
    rs.copy_from_slice(&signature.to_bytes());

    for v in 0u8..2 {
        let Some(recovery_id) = RecoveryId::from_byte(v) else {
            continue;
        };
        let candidate =
            match VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id) {
                Ok(key) => key,
                Err(_) => continue,
            };
        if compress(&candidate)? == *public_key {
            trace!("signature recovery id {} for digest {}", v, digest);
            return Ok(RecoverableSignature::from_parts(v, &rs));
        }
    }

    Err(Error::SignatureRecoveryFailed)
}
