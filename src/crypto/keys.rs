//! Key lifecycle
//!
//! [`KeyManager`] exclusively owns the 32-byte secret and the compressed
//! public key derived from it. Both buffers are zeroed on every failure path,
//! on [`KeyManager::wipe`] and on drop.

use std::fmt;

use k256::ecdsa::SigningKey;
use log::debug;
use zeroize::Zeroize;

use crate::address::{self, Network};
use crate::constants::{IDENTITY_HASH_SIZE, PUBKEY_SIZE};
use crate::crypto::signer::{compress, sign_recoverable, RecoverableSignature};
use crate::crypto::{bitcoin_message_hash, blake160, legacy_prefixed_hash, Hash};
use crate::error::{Error, Result};
use crate::tx::Script;

/// Signature convention selected at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SigningAlgorithm {
    /// Sign the transaction digest directly
    Native = 0x00,
    /// Sign `keccak256(0x19 "Ethereum Signed Message:\n" len digest)`
    EthereumStyle = 0x01,
    /// Sign `sha256d(0x18 "Bitcoin Signed Message:\n" len digest)`
    BitcoinStyle = 0x04,
}

impl TryFrom<u8> for SigningAlgorithm {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0x00 => Ok(SigningAlgorithm::Native),
            0x01 => Ok(SigningAlgorithm::EthereumStyle),
            0x04 => Ok(SigningAlgorithm::BitcoinStyle),
            other => Err(Error::InvalidAlgorithm(other)),
        }
    }
}

impl SigningAlgorithm {
    /// Wire tag accepted by [`KeyManager::load_tagged`]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Digest actually handed to the signer for a transaction signing hash
    pub fn message_digest(self, sighash: &Hash) -> Hash {
        match self {
            SigningAlgorithm::Native => *sighash,
            SigningAlgorithm::EthereumStyle => legacy_prefixed_hash(sighash.as_bytes()),
            SigningAlgorithm::BitcoinStyle => bitcoin_message_hash(sighash.as_bytes()),
        }
    }
}

/// Owner of the session's secret key
///
/// The secret lives on the heap so moving the manager never copies it.
pub struct KeyManager {
    secret: Box<[u8; 32]>,
    public_key: [u8; PUBKEY_SIZE],
    algorithm: SigningAlgorithm,
    ready: bool,
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("secret", &"[REDACTED]")
            .field("public_key", &hex::encode(self.public_key))
            .field("algorithm", &self.algorithm)
            .field("ready", &self.ready)
            .finish()
    }
}

impl Drop for KeyManager {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl KeyManager {
    /// Empty manager; every accessor fails with [`Error::NotReady`] until `load`
    pub fn new() -> Self {
        Self {
            secret: Box::new([0u8; 32]),
            public_key: [0u8; PUBKEY_SIZE],
            algorithm: SigningAlgorithm::Native,
            ready: false,
        }
    }

    /// Create and load in one step
    pub fn from_secret(secret: &[u8], algorithm: SigningAlgorithm) -> Result<Self> {
        let mut manager = Self::new();
        manager.load(secret, algorithm)?;
        Ok(manager)
    }

    /// Load a secret and derive its compressed public key.
    ///
    /// Any previously loaded key is wiped first. On failure nothing survives.
    pub fn load(&mut self, secret: &[u8], algorithm: SigningAlgorithm) -> Result<()> {
        self.wipe();
        let result = self.try_load(secret, algorithm);
        if result.is_err() {
            self.wipe();
        }
        result
    }

    /// Like [`KeyManager::load`] but with the algorithm given as its wire tag
    pub fn load_tagged(&mut self, secret: &[u8], algorithm_tag: u8) -> Result<()> {
        match SigningAlgorithm::try_from(algorithm_tag) {
            Ok(algorithm) => self.load(secret, algorithm),
            Err(e) => {
                self.wipe();
                Err(e)
            }
        }
    }

    fn try_load(&mut self, secret: &[u8], algorithm: SigningAlgorithm) -> Result<()> {
        if secret.len() != 32 {
            return Err(Error::InvalidParameter("secret key must be 32 bytes"));
        }
        self.secret.copy_from_slice(secret);

        let signing_key =
            SigningKey::from_slice(&self.secret[..]).map_err(|_| Error::KeyDerivationFailed)?;
        self.public_key = compress(signing_key.verifying_key())?;
        self.algorithm = algorithm;
        self.ready = true;

        debug!(
            "loaded {:?} key, public key {}",
            algorithm,
            hex::encode(self.public_key)
        );
        Ok(())
    }

    /// Zero all key material and drop back to the not-ready state. Idempotent.
    pub fn wipe(&mut self) {
        if self.ready {
            debug!("wiping key material");
        }
        (*self.secret).zeroize();
        self.public_key.zeroize();
        self.algorithm = SigningAlgorithm::Native;
        self.ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// True when every byte of key material is zero
    pub fn is_wiped(&self) -> bool {
        !self.ready
            && self.secret.iter().all(|b| *b == 0)
            && self.public_key.iter().all(|b| *b == 0)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }

    pub fn algorithm(&self) -> Result<SigningAlgorithm> {
        self.ensure_ready()?;
        Ok(self.algorithm)
    }

    /// Compressed public key `[0x02|0x03] || x`
    pub fn public_key(&self) -> Result<[u8; PUBKEY_SIZE]> {
        self.ensure_ready()?;
        Ok(self.public_key)
    }

    /// blake160 of the compressed public key
    pub fn identity_hash(&self) -> Result<[u8; IDENTITY_HASH_SIZE]> {
        self.ensure_ready()?;
        Ok(blake160(&self.public_key))
    }

    /// The default secp256k1/blake160 lock guarding this key's cells
    pub fn default_lock_script(&self) -> Result<Script> {
        Ok(Script::secp256k1_blake160(&self.identity_hash()?))
    }

    /// Full-format address of the default lock
    pub fn address(&self, network: Network) -> Result<String> {
        address::full_address(network, &self.identity_hash()?)
    }

    /// Sign a 32-byte digest as-is.
    ///
    /// Every algorithm currently shares the same wire form with a 0/1 recovery
    /// id; they only differ in how the digest was produced upstream.
    pub fn sign(&self, digest: &Hash) -> Result<RecoverableSignature> {
        self.ensure_ready()?;
        match self.algorithm {
            SigningAlgorithm::Native
            | SigningAlgorithm::EthereumStyle
            | SigningAlgorithm::BitcoinStyle => {
                sign_recoverable(&*self.secret, &self.public_key, digest)
            }
        }
    }

    /// Apply the algorithm's message prefix to a transaction signing hash, then sign
    pub fn sign_transaction_digest(&self, sighash: &Hash) -> Result<RecoverableSignature> {
        let algorithm = self.algorithm()?;
        self.sign(&algorithm.message_digest(sighash))
    }
}
