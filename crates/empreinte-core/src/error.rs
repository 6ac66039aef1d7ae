//! Cryptographic error types for `empreinte-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Digital signature creation failure (key reconstruction, signing).
    #[error("signature error: {0}")]
    Signature(String),

    /// Malformed transport encoding or wrong-length key/signature material.
    ///
    /// Distinct from a cryptographic mismatch: a decode failure means the
    /// input could not even be interpreted, not that a well-formed
    /// signature failed to verify.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid key material (CSPRNG failure, rejected seed).
    #[error("invalid key material: {0}")]
    KeyMaterial(String),
}
