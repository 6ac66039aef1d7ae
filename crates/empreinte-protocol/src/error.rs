//! Protocol error types for `empreinte-protocol`.

use empreinte_core::CryptoError;
use thiserror::Error;

/// Errors produced by the secure key store collaborator.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// User declined or failed the biometric challenge gating the operation.
    #[error("biometric challenge cancelled by user")]
    UserCancelled,

    /// No active keypair exists — signing requires prior provisioning.
    #[error("no active keypair in the key store")]
    NoActiveKey,

    /// Store/OS-level failure creating or using keys. The diagnostic is
    /// surfaced verbatim to the user.
    #[error("key store unavailable: {0}")]
    Unavailable(String),
}

/// Errors produced by a user-presence check.
#[derive(Debug, Error)]
pub enum PresenceError {
    /// User declined the presence challenge.
    #[error("presence challenge declined")]
    Cancelled,

    /// The presence mechanism itself failed.
    #[error("presence check unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced at the orchestrator boundary.
///
/// All variants except [`ProtocolError::RunInFlight`] are converted into
/// a terminal display state by the orchestrator; none propagate to crash
/// the process.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// No biometric sensor or enrollment — recoverable by enrolling and
    /// retrying.
    #[error("no biometric sensor available")]
    NoSensor,

    /// User declined or failed the biometric challenge — retry allowed.
    #[error("biometric challenge cancelled by user")]
    UserCancelled,

    /// The key store could not produce a signature.
    #[error("signing unavailable: {0}")]
    SigningUnavailable(String),

    /// Store/OS-level failure creating or deleting keys.
    #[error("platform error: {0}")]
    Platform(String),

    /// Cryptographic failure (delegated from core — decode errors land here).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A second trigger arrived while a protocol run was in flight.
    #[error("a protocol run is already in flight")]
    RunInFlight,
}
