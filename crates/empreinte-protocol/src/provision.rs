//! Key provisioning — fresh keypair, single-active-keypair invariant.
//!
//! Provisioning always destroys any existing keypair before creating a
//! new one, so an app reinstall or retry never accumulates orphaned
//! keys and every successful run starts a fresh protocol epoch.

use crate::error::{KeyStoreError, ProtocolError};
use crate::gate::BiometricGate;
use crate::keystore::SecureKeyStore;

/// Fixed confirmation message shown by the key-creation challenge.
pub const PROVISION_PROMPT: &str = "Confirm biometrics";

/// Provision a fresh keypair and return its base64-encoded public half.
///
/// Steps:
/// 1. Re-probe capability — no sensor means no provisioning.
/// 2. Destroy any existing keypair unconditionally.
/// 3. Create a new keypair behind the biometric challenge.
///
/// # Errors
///
/// - [`ProtocolError::NoSensor`] if the gate reports no usable sensor
/// - [`ProtocolError::UserCancelled`] if the user declines the challenge
/// - [`ProtocolError::Platform`] on any store failure; the store leaves
///   no keypair in a partial state
pub fn provision(
    gate: &dyn BiometricGate,
    store: &dyn SecureKeyStore,
) -> Result<String, ProtocolError> {
    let capability = gate.capability();
    if !capability.available {
        return Err(ProtocolError::NoSensor);
    }

    if store.keys_exist() {
        tracing::debug!("existing keypair found, destroying before re-provisioning");
        store.delete_keys().map_err(map_store_error)?;
    }

    let public_key = store.create_keys(PROVISION_PROMPT).map_err(map_store_error)?;
    tracing::info!("provisioned fresh keypair");
    Ok(public_key)
}

/// Map store failures during provisioning into the protocol taxonomy.
fn map_store_error(err: KeyStoreError) -> ProtocolError {
    match err {
        KeyStoreError::UserCancelled => ProtocolError::UserCancelled,
        KeyStoreError::NoActiveKey | KeyStoreError::Unavailable(_) => {
            ProtocolError::Platform(err.to_string())
        }
    }
}
