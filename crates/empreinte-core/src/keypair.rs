//! Ed25519 device keypairs for challenge/response signing.
//!
//! This module provides:
//! - [`DeviceKeyPair::generate`] — create a fresh keypair from OS randomness
//! - [`DeviceKeyPair::sign`] — produce a detached signature over a payload
//!
//! The seed (private half) is held in a zeroize-on-drop buffer and never
//! leaves this type. Only the 32-byte public half is exposed, so callers
//! can hand it out as the verification key without touching the seed.

use rand::rngs::OsRng;
use rand::RngCore;
use ring::signature::{Ed25519KeyPair, KeyPair};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Ed25519 public key length in bytes (256 bits).
pub const PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 seed (private key) length in bytes (256 bits).
pub const SEED_LEN: usize = 32;

/// Ed25519 signature length in bytes (512 bits).
pub const SIGNATURE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Seed newtype
// ---------------------------------------------------------------------------

/// Private seed bytes. Zeroized on drop, never exposed outside this module.
#[derive(Zeroize, ZeroizeOnDrop)]
struct SigningSeed([u8; SEED_LEN]);

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 device keypair held in memory.
///
/// This type intentionally does NOT implement `Serialize` or `Clone` —
/// the seed must not be duplicated or accidentally written out. `Debug`
/// is masked.
pub struct DeviceKeyPair {
    seed: SigningSeed,
    public: [u8; PUBLIC_KEY_LEN],
}

impl std::fmt::Debug for DeviceKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DeviceKeyPair(***)")
    }
}

impl DeviceKeyPair {
    /// Generate a fresh Ed25519 keypair from a random 32-byte seed.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyMaterial`] if `ring` rejects the seed.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed_bytes = [0u8; SEED_LEN];
        OsRng.fill_bytes(&mut seed_bytes);

        let kp = Ed25519KeyPair::from_seed_unchecked(&seed_bytes).map_err(|e| {
            seed_bytes.zeroize();
            CryptoError::KeyMaterial(format!("Ed25519 key generation failed: {e}"))
        })?;

        let mut public = [0u8; PUBLIC_KEY_LEN];
        public.copy_from_slice(kp.public_key().as_ref());

        let seed = SigningSeed(seed_bytes);
        seed_bytes.zeroize();

        Ok(Self { seed, public })
    }

    /// The 32-byte public half. Safe to distribute.
    #[must_use]
    pub const fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public
    }

    /// Produce a detached Ed25519 signature over `message`.
    ///
    /// The key pair is reconstructed from the stored seed and public half;
    /// the seed never leaves this type.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Signature`] if key reconstruction fails.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let kp = Ed25519KeyPair::from_seed_and_public_key(&self.seed.0, &self.public)
            .map_err(|e| CryptoError::Signature(format!("Ed25519 key reconstruction failed: {e}")))?;

        Ok(kp.sign(message).as_ref().to_vec())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
