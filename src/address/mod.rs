//! Address module - full-format addresses for the default lock

mod bech32m;

pub use bech32m::{decode, encode, encode_into, encoded_len};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Error, Result};

/// Network an address is valid on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn prefix(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_PREFIX,
            Network::Testnet => TESTNET_PREFIX,
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            MAINNET_PREFIX => Some(Network::Mainnet),
            TESTNET_PREFIX => Some(Network::Testnet),
            _ => None,
        }
    }
}

/// `format(0x00) || code_hash || hash_type || args`
pub fn full_payload(code_hash: &[u8; 32], hash_type: u8, args: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + 32 + 1 + args.len());
    payload.push(ADDRESS_FULL_FORMAT);
    payload.extend_from_slice(code_hash);
    payload.push(hash_type);
    payload.extend_from_slice(args);
    payload
}

/// Full-format address of the default secp256k1/blake160 lock for `identity`
pub fn full_address(network: Network, identity: &[u8; IDENTITY_HASH_SIZE]) -> Result<String> {
    let payload = full_payload(
        &SECP256K1_BLAKE160_CODE_HASH,
        SECP256K1_BLAKE160_HASH_TYPE,
        identity,
    );
    encode(network.prefix(), &payload)
}

/// Recover network and lock argument from a default-lock full-format address
pub fn parse_full_address(text: &str) -> Result<(Network, [u8; IDENTITY_HASH_SIZE])> {
    let (prefix, payload) = decode(text)?;
    let network =
        Network::from_prefix(&prefix).ok_or(Error::InvalidParameter("unknown address prefix"))?;
    if payload.len() != 1 + 32 + 1 + IDENTITY_HASH_SIZE
        || payload[0] != ADDRESS_FULL_FORMAT
        || payload[1..33] != SECP256K1_BLAKE160_CODE_HASH
        || payload[33] != SECP256K1_BLAKE160_HASH_TYPE
    {
        return Err(Error::InvalidParameter("not a default-lock full address"));
    }
    let mut identity = [0u8; IDENTITY_HASH_SIZE];
    identity.copy_from_slice(&payload[34..]);
    Ok((network, identity))
}
