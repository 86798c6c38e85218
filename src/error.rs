//! Error taxonomy shared by every component of the signer.
//!
//! Every failure aborts the current call and is returned unchanged to the caller.
//! Nothing in this crate retries internally.

use thiserror::Error;

/// Signer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Key manager not ready (no key loaded)")]
    NotReady,
    #[error("Invalid signing algorithm tag: 0x{0:02x}")]
    InvalidAlgorithm(u8),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("Public key derivation failed")]
    KeyDerivationFailed,
    #[error("Signature computation failed: {0}")]
    SignatureComputationFailed(String),
    #[error("No recovery id reproduces the signer's public key")]
    SignatureRecoveryFailed,
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("Capacity exceeded: at most {max} {collection}")]
    CapacityExceeded { collection: &'static str, max: usize },
    #[error("Out of memory during serialization")]
    OutOfMemory,
    #[error("Malformed molecule data: {0}")]
    Malformed(&'static str),
}

impl Error {
    /// Broken invariant: the caller should drop the current session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::KeyDerivationFailed | Error::SignatureRecoveryFailed)
    }

    /// Contract violation that the caller must fix rather than retry.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::BufferTooSmall { .. } | Error::CapacityExceeded { .. } | Error::InvalidParameter(_)
        )
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

pub type Result<T> = std::result::Result<T, Error>;
