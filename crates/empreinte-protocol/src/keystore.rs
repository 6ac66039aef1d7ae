//! Secure key store — the hardware-gated keypair owner.
//!
//! The store owns the asymmetric keypair: only the base64-encoded public
//! half ever crosses the [`SecureKeyStore`] boundary, and every
//! key-creating or signing operation is gated by a user-presence
//! challenge. [`SoftwareKeyStore`] is the in-memory reference
//! implementation over `empreinte-core` Ed25519; on real hardware an
//! enclave-backed implementation takes its place.

use std::sync::{Arc, Mutex, PoisonError};

use empreinte_core::{encoding, DeviceKeyPair};

use crate::error::{KeyStoreError, PresenceError};

// ---------------------------------------------------------------------------
// User presence
// ---------------------------------------------------------------------------

/// User-presence challenge — the platform prompt raised before a gated
/// cryptographic operation proceeds.
pub trait UserPresence: Send + Sync {
    /// Block until the user confirms or declines the prompt.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Cancelled`] if the user declines, or
    /// [`PresenceError::Unavailable`] if the mechanism itself fails.
    fn confirm(&self, prompt: &str) -> Result<(), PresenceError>;
}

/// Presence check that always approves — demo shells and tests.
pub struct AlwaysPresent;

impl UserPresence for AlwaysPresent {
    fn confirm(&self, _prompt: &str) -> Result<(), PresenceError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Key store trait
// ---------------------------------------------------------------------------

/// Platform-backed key store abstraction.
///
/// At most one keypair exists at a time (single-active-keypair
/// invariant — the provisioner deletes before creating). `create_keys`
/// is atomic from the caller's perspective: it either installs a usable
/// keypair and returns its public half, or leaves no new key behind.
pub trait SecureKeyStore: Send + Sync {
    /// Whether a keypair currently exists.
    fn keys_exist(&self) -> bool;

    /// Destroy the current keypair, if any.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Unavailable`] on a platform failure.
    fn delete_keys(&self) -> Result<(), KeyStoreError>;

    /// Create a fresh keypair behind a user-presence challenge and
    /// return the base64-encoded public half.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::UserCancelled`] if the user declines the
    /// challenge, or [`KeyStoreError::Unavailable`] on a platform failure.
    fn create_keys(&self, prompt: &str) -> Result<String, KeyStoreError>;

    /// Sign `payload` with the active private key behind a user-presence
    /// challenge and return the base64-encoded signature.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::UserCancelled`] if the user declines,
    /// [`KeyStoreError::NoActiveKey`] if no keypair exists, or
    /// [`KeyStoreError::Unavailable`] on a platform failure.
    fn sign(&self, prompt: &str, payload: &[u8]) -> Result<String, KeyStoreError>;
}

// ---------------------------------------------------------------------------
// Software key store
// ---------------------------------------------------------------------------

/// In-memory key store over `empreinte-core` Ed25519.
///
/// The private half lives behind the mutex and never crosses the trait
/// boundary. Nothing is persisted.
pub struct SoftwareKeyStore {
    presence: Arc<dyn UserPresence>,
    key: Mutex<Option<DeviceKeyPair>>,
}

impl SoftwareKeyStore {
    /// Create an empty store gated by the given presence check.
    #[must_use]
    pub fn new(presence: Arc<dyn UserPresence>) -> Self {
        Self {
            presence,
            key: Mutex::new(None),
        }
    }

    fn confirm_presence(&self, prompt: &str) -> Result<(), KeyStoreError> {
        self.presence.confirm(prompt).map_err(|e| match e {
            PresenceError::Cancelled => KeyStoreError::UserCancelled,
            PresenceError::Unavailable(msg) => KeyStoreError::Unavailable(msg),
        })
    }
}

impl SecureKeyStore for SoftwareKeyStore {
    fn keys_exist(&self) -> bool {
        self.key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn delete_keys(&self) -> Result<(), KeyStoreError> {
        self.key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }

    fn create_keys(&self, prompt: &str) -> Result<String, KeyStoreError> {
        self.confirm_presence(prompt)?;

        // Generate before installing — a keygen failure leaves the store
        // exactly as it was (create is atomic from the caller's view).
        let keypair = DeviceKeyPair::generate()
            .map_err(|e| KeyStoreError::Unavailable(e.to_string()))?;
        let public = encoding::encode(keypair.public_key());

        *self.key.lock().unwrap_or_else(PoisonError::into_inner) = Some(keypair);
        Ok(public)
    }

    fn sign(&self, prompt: &str, payload: &[u8]) -> Result<String, KeyStoreError> {
        self.confirm_presence(prompt)?;

        let guard = self.key.lock().unwrap_or_else(PoisonError::into_inner);
        let keypair = guard.as_ref().ok_or(KeyStoreError::NoActiveKey)?;
        let signature = keypair
            .sign(payload)
            .map_err(|e| KeyStoreError::Unavailable(e.to_string()))?;
        Ok(encoding::encode(&signature))
    }
}
