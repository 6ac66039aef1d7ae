//! `empreinte-protocol` — Biometric key-lifecycle and challenge/response
//! signature protocol.
//!
//! Coordinates key provisioning, challenge signing, and local verification
//! against a hardware-gated key store. The presentation layer consumes
//! immutable [`ProtocolSnapshot`] values and issues exactly one command:
//! run the protocol.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod device;
pub mod error;
pub mod gate;
pub mod keystore;
pub mod orchestrator;
pub mod provision;
pub mod signer;

pub use device::{DeviceIdentity, DeviceType};
pub use error::{KeyStoreError, PresenceError, ProtocolError};
pub use gate::{BiometricCapability, BiometricGate, BiometricKind, StaticGate};
pub use keystore::{AlwaysPresent, SecureKeyStore, SoftwareKeyStore, UserPresence};
pub use orchestrator::{Orchestrator, ProtocolSnapshot, ProtocolState, TransitionObserver};
pub use provision::{provision, PROVISION_PROMPT};
pub use signer::{sign_challenge, verify_record, SignatureRecord, Validity, SIGN_PROMPT};
