//! Base64 transport codec for keys and signatures.
//!
//! Keys and signatures cross the protocol boundary as opaque base64
//! strings (the key store exposes encoded material only). Decoding
//! failures are [`CryptoError::Decode`] — a distinct failure kind from
//! a cryptographic mismatch.

use data_encoding::BASE64;

use crate::error::CryptoError;

/// Encode raw bytes as standard base64 with padding.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode a base64 string back into raw bytes.
///
/// # Errors
///
/// Returns [`CryptoError::Decode`] if the input is not valid base64.
pub fn decode(text: &str) -> Result<Vec<u8>, CryptoError> {
    BASE64
        .decode(text.as_bytes())
        .map_err(|e| CryptoError::Decode(format!("invalid base64: {e}")))
}
