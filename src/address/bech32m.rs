//! Checksummed base-32 text encoding (bech32m variant)
//!
//! Full-format addresses run past 90 characters, so the 0.9 API of the
//! `bech32` crate is used, which does not cap the length.

use bech32::{FromBase32, ToBase32, Variant};

use crate::error::{Error, Result};

const CHECKSUM_LEN: usize = 6;

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(Error::InvalidParameter("address prefix is empty"));
    }
    if !prefix.bytes().all(|c| (33..=126).contains(&c) && !c.is_ascii_uppercase()) {
        return Err(Error::InvalidParameter("address prefix must be lowercase printable ASCII"));
    }
    Ok(())
}

/// Length of the encoded text, excluding any terminator
pub fn encoded_len(prefix: &str, payload: &[u8]) -> usize {
    prefix.len() + 1 + (payload.len() * 8 + 4) / 5 + CHECKSUM_LEN
}

/// Encode `payload` under the human-readable `prefix`
pub fn encode(prefix: &str, payload: &[u8]) -> Result<String> {
    validate_prefix(prefix)?;
    bech32::encode(prefix, payload.to_base32(), Variant::Bech32m)
        .map_err(|_| Error::InvalidParameter("address prefix rejected"))
}

/// Encode into a caller-owned buffer and NUL-terminate it.
///
/// The buffer must hold [`encoded_len`] + 1 bytes. Returns the text length.
pub fn encode_into(prefix: &str, payload: &[u8], out: &mut [u8]) -> Result<usize> {
    validate_prefix(prefix)?;
    let needed = encoded_len(prefix, payload) + 1;
    if out.len() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }

    let text = encode(prefix, payload)?;
    out[..text.len()].copy_from_slice(text.as_bytes());
    out[text.len()] = 0;
    Ok(text.len())
}

/// Split an address into prefix and payload, verifying its checksum
pub fn decode(text: &str) -> Result<(String, Vec<u8>)> {
    if text.bytes().any(|c| c.is_ascii_uppercase()) {
        return Err(Error::InvalidParameter("address must be lowercase"));
    }
    let (prefix, symbols, variant) =
        bech32::decode(text).map_err(|_| Error::InvalidParameter("invalid address encoding"))?;
    if variant != Variant::Bech32m {
        return Err(Error::InvalidParameter("address checksum is not bech32m"));
    }
    let payload = Vec::<u8>::from_base32(&symbols)
        .map_err(|_| Error::InvalidParameter("invalid address padding"))?;
    Ok((prefix, payload))
}
