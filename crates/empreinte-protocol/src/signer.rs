//! Challenge signing and record verification.
//!
//! Signing produces a [`SignatureRecord`] that carries the public key of
//! the provisioning epoch it was signed under. Verification decodes the
//! signature and key from that record — never from a separately held
//! mutable field — which closes the stale-key window: a record can only
//! ever be checked against its own epoch.

use empreinte_core::{decode, verify_signature};
use serde::{Deserialize, Serialize};

use crate::error::{KeyStoreError, ProtocolError};
use crate::keystore::SecureKeyStore;

/// Fixed message shown by the signing challenge.
pub const SIGN_PROMPT: &str = "Sign in";

/// Tri-state verification status of a signature record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Validity {
    /// Not yet verified — verification is a separate, explicit step.
    Unknown,
    Valid,
    Invalid,
}

/// Ephemeral per-challenge value: the signed payload, the encoded
/// signature, and the epoch public key. Replaced on every new challenge
/// attempt; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    /// The bytes that were signed.
    pub payload: Vec<u8>,
    /// Base64-encoded signature.
    pub signature: String,
    /// Base64-encoded public key of the same provisioning epoch.
    pub public_key: String,
    /// Verification status.
    pub valid: Validity,
}

/// Issue the signing challenge and produce a record for `payload`.
///
/// `public_key` must be the key returned by the provisioning step of the
/// current run; it is embedded in the record so verification cannot read
/// a stale key.
///
/// # Errors
///
/// - [`ProtocolError::UserCancelled`] if the user declines the challenge
/// - [`ProtocolError::SigningUnavailable`] on any other store failure,
///   carrying the diagnostic message
pub fn sign_challenge(
    store: &dyn SecureKeyStore,
    public_key: &str,
    payload: &[u8],
) -> Result<SignatureRecord, ProtocolError> {
    let signature = store.sign(SIGN_PROMPT, payload).map_err(|e| match e {
        KeyStoreError::UserCancelled => ProtocolError::UserCancelled,
        KeyStoreError::NoActiveKey | KeyStoreError::Unavailable(_) => {
            ProtocolError::SigningUnavailable(e.to_string())
        }
    })?;

    tracing::debug!(payload_len = payload.len(), "challenge signed");
    Ok(SignatureRecord {
        payload: payload.to_vec(),
        signature,
        public_key: public_key.to_owned(),
        valid: Validity::Unknown,
    })
}

/// Decode a record's signature and epoch key and verify it.
///
/// Returns `Ok(true)` on a match, `Ok(false)` on a well-formed
/// cryptographic mismatch.
///
/// # Errors
///
/// Returns [`ProtocolError::Crypto`] if the signature or key cannot be
/// decoded — a distinct failure kind from a mismatch.
pub fn verify_record(record: &SignatureRecord) -> Result<bool, ProtocolError> {
    let signature = decode(&record.signature)?;
    let public_key = decode(&record.public_key)?;
    Ok(verify_signature(&signature, &record.payload, &public_key)?)
}
