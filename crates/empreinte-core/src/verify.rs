//! Detached Ed25519 signature verification.
//!
//! Pure function from the caller's perspective: no mutation, no I/O.
//! Malformed inputs (wrong-length key or signature) are reported as
//! [`CryptoError::Decode`], while a well-formed signature that simply
//! does not match yields `Ok(false)` — callers must surface the two
//! differently (protocol error vs. negative verification result).

use ring::signature::{UnparsedPublicKey, ED25519};

use crate::error::CryptoError;
use crate::keypair::{PUBLIC_KEY_LEN, SIGNATURE_LEN};

/// Verify a detached signature over `payload` under `public_key`.
///
/// # Errors
///
/// Returns [`CryptoError::Decode`] if the public key is not exactly
/// [`PUBLIC_KEY_LEN`] bytes or the signature is not exactly
/// [`SIGNATURE_LEN`] bytes.
pub fn verify_signature(
    signature: &[u8],
    payload: &[u8],
    public_key: &[u8],
) -> Result<bool, CryptoError> {
    if public_key.len() != PUBLIC_KEY_LEN {
        return Err(CryptoError::Decode(format!(
            "invalid public key length: {} bytes (expected {PUBLIC_KEY_LEN})",
            public_key.len()
        )));
    }
    if signature.len() != SIGNATURE_LEN {
        return Err(CryptoError::Decode(format!(
            "invalid signature length: {} bytes (expected {SIGNATURE_LEN})",
            signature.len()
        )));
    }

    let key = UnparsedPublicKey::new(&ED25519, public_key);
    Ok(key.verify(payload, signature).is_ok())
}
