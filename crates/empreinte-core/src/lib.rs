//! `empreinte-core` — Pure cryptographic primitives for EMPREINTE.
//!
//! This crate is the audit target: zero network, zero async, zero I/O.
//! It provides Ed25519 device keypairs, detached signature verification,
//! and the base64 transport codec used at the protocol boundary.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod encoding;
pub mod error;
pub mod keypair;
pub mod verify;

pub use encoding::{decode, encode};
pub use error::CryptoError;
pub use keypair::{DeviceKeyPair, PUBLIC_KEY_LEN, SEED_LEN, SIGNATURE_LEN};
pub use verify::verify_signature;
