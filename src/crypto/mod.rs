//! Cryptography module - digests, key lifecycle, recoverable signatures

mod hash;
mod keys;
mod signer;

pub use hash::*;
pub use keys::*;
pub use signer::*;
