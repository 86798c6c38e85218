//! CKB on-device transaction signer
//!
//! Holds a raw secp256k1 secret in memory, signs transaction digests with
//! recoverable ECDSA signatures and assembles molecule-encoded transactions
//! ready for broadcast. No network I/O happens here.

pub mod address;
pub mod config;
pub mod crypto;
pub mod error;
pub mod tx;

pub use error::{Error, Result};

/// Protocol constants - HARD-CODED, NEVER CONFIGURABLE
pub mod constants {
    /// Personalization tag of the chain's blake2b-256 hash
    pub const HASH_PERSONALIZATION: &[u8; 16] = b"ckb-default-hash";

    /// Code hash of the default secp256k1/blake160 lock script
    pub const SECP256K1_BLAKE160_CODE_HASH: [u8; 32] = [
        0x9b, 0xd7, 0xe0, 0x6f, 0x3e, 0xcf, 0x4b, 0xe0, 0xf2, 0xfc, 0xd2, 0x18, 0x8b, 0x23, 0xf1,
        0xb9, 0xfc, 0xc8, 0x8e, 0x5d, 0x4b, 0x65, 0xa8, 0x63, 0x7b, 0x17, 0x72, 0x3b, 0xbd, 0xa3,
        0xcc, 0xe8,
    ];

    /// Hash type of the default lock (`type`)
    pub const SECP256K1_BLAKE160_HASH_TYPE: u8 = 0x01;

    /// Mainnet transaction hash of the secp256k1 dep group
    pub const MAINNET_SECP256K1_DEP_TX_HASH: [u8; 32] = [
        0x71, 0xa7, 0xba, 0x8f, 0xc9, 0x63, 0x49, 0xfe, 0xa0, 0xed, 0x3a, 0x5c, 0x47, 0x99, 0x2e,
        0x3b, 0x40, 0x84, 0xb0, 0x31, 0xa4, 0x22, 0x64, 0xa0, 0x18, 0xe0, 0x07, 0x2e, 0x81, 0x72,
        0xe4, 0x6c,
    ];

    /// Testnet transaction hash of the secp256k1 dep group
    pub const TESTNET_SECP256K1_DEP_TX_HASH: [u8; 32] = [
        0xf8, 0xde, 0x3b, 0xb4, 0x7d, 0x05, 0x5c, 0xdf, 0x46, 0x0d, 0x93, 0xa2, 0xa6, 0xe1, 0xb0,
        0x5f, 0x74, 0x32, 0xf9, 0x77, 0x7c, 0x8c, 0x47, 0x4a, 0xbf, 0x4e, 0xec, 0x1d, 0x4a, 0xee,
        0x5d, 0x37,
    ];

    /// Mainnet address prefix
    pub const MAINNET_PREFIX: &str = "ckb";

    /// Testnet address prefix
    pub const TESTNET_PREFIX: &str = "ckt";

    /// Format byte of a full-format address payload
    pub const ADDRESS_FULL_FORMAT: u8 = 0x00;

    /// Length of a compact recoverable signature (v || r || s)
    pub const SIGNATURE_SIZE: usize = 65;

    /// Length of a compressed secp256k1 public key
    pub const PUBKEY_SIZE: usize = 33;

    /// Length of the identity hash (blake160 of the public key)
    pub const IDENTITY_HASH_SIZE: usize = 20;

    /// Default builder limits (embedded memory budget, not protocol limits)
    pub const DEFAULT_MAX_CELL_DEPS: usize = 4;
    pub const DEFAULT_MAX_HEADER_DEPS: usize = 4;
    pub const DEFAULT_MAX_INPUTS: usize = 8;
    pub const DEFAULT_MAX_OUTPUTS: usize = 8;
    pub const DEFAULT_MAX_WITNESSES: usize = 8;
}
