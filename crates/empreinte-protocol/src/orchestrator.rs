//! Protocol orchestrator — the key-lifecycle state machine.
//!
//! One external trigger drives the whole sequence:
//!
//! ```text
//! Idle -> Checking -> { NoBiometrics | Ready }
//! Ready -> Provisioning -> Signing -> Verifying -> { Valid | Invalid | Error }
//! ```
//!
//! Terminal states are re-triggerable. A fresh keypair is provisioned on
//! every run, so verification is never checked against a stale key. All
//! failures become a terminal display state; nothing propagates out of a
//! run except [`ProtocolError::RunInFlight`] for a rejected concurrent
//! trigger.
//!
//! The presentation layer consumes immutable [`ProtocolSnapshot`] values,
//! either by polling [`Orchestrator::snapshot`] or through an observer
//! callback invoked on every transition.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::device::DeviceIdentity;
use crate::error::ProtocolError;
use crate::gate::{BiometricCapability, BiometricGate};
use crate::keystore::SecureKeyStore;
use crate::provision::provision;
use crate::signer::{sign_challenge, verify_record, Validity};

// ---------------------------------------------------------------------------
// Display strings
// ---------------------------------------------------------------------------

/// Result text for a matching signature.
const RESULT_VALID: &str = "Valid: the generated signature and key match the payload";

/// Result text for a well-formed mismatch.
const RESULT_INVALID: &str = "Invalid: the signature does not match the payload";

// ---------------------------------------------------------------------------
// State machine types
// ---------------------------------------------------------------------------

/// State of the protocol state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ProtocolState {
    /// Nothing has run yet.
    Idle,
    /// Re-probing the sensor gate.
    Checking,
    /// No usable sensor — terminal until the next probe.
    NoBiometrics,
    /// Sensor present; a run proceeds to provisioning immediately.
    Ready,
    /// Provisioning a fresh keypair behind the biometric challenge.
    Provisioning,
    /// Signing the device payload behind the biometric challenge.
    Signing,
    /// Decoding and verifying the signature against the epoch key.
    Verifying,
    /// Verification succeeded.
    Valid,
    /// Well-formed signature, cryptographic mismatch.
    Invalid,
    /// Any provisioning, signing, or decode failure.
    Error {
        /// Diagnostic text surfaced to the user.
        detail: String,
    },
}

impl ProtocolState {
    /// Whether this state ends a run (the trigger is accepted again).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NoBiometrics | Self::Valid | Self::Invalid | Self::Error { .. }
        )
    }
}

/// Immutable view of orchestrator state, cloned per transition.
///
/// Everything the presentation layer renders is here, as display-ready
/// strings. Fields keep their last value until replaced: after an
/// `Invalid` outcome the signature and key text remain visible for
/// inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSnapshot {
    /// Current machine state.
    pub state: ProtocolState,
    /// Human-readable capability message from the last probe.
    pub capability_message: String,
    /// Base64 public key of the current epoch, once provisioned.
    pub public_key: Option<String>,
    /// Base64 signature of the last challenge, once signed.
    pub signature: Option<String>,
    /// Payload text (the device unique id), shown on a valid outcome.
    pub payload: Option<String>,
    /// Terminal result or error text.
    pub result_message: Option<String>,
}

impl ProtocolSnapshot {
    fn initial() -> Self {
        Self {
            state: ProtocolState::Idle,
            capability_message: BiometricCapability::none().message().to_owned(),
            public_key: None,
            signature: None,
            payload: None,
            result_message: None,
        }
    }
}

/// Callback invoked with the fresh snapshot after every transition.
pub type TransitionObserver = Box<dyn Fn(&ProtocolSnapshot) + Send + Sync>;

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Coordinates provisioning, signing, and verification over the
/// collaborator seams, and owns the only mutable protocol state.
///
/// State is only ever mutated by the run in flight; a second trigger
/// while one is running is rejected, keeping the machine single-writer.
pub struct Orchestrator {
    gate: Arc<dyn BiometricGate>,
    store: Arc<dyn SecureKeyStore>,
    identity: DeviceIdentity,
    snapshot: Mutex<ProtocolSnapshot>,
    in_flight: AtomicBool,
    observer: Option<TransitionObserver>,
}

impl Orchestrator {
    /// Create an orchestrator over the given collaborators.
    #[must_use]
    pub fn new(
        gate: Arc<dyn BiometricGate>,
        store: Arc<dyn SecureKeyStore>,
        identity: DeviceIdentity,
    ) -> Self {
        Self {
            gate,
            store,
            identity,
            snapshot: Mutex::new(ProtocolSnapshot::initial()),
            in_flight: AtomicBool::new(false),
            observer: None,
        }
    }

    /// Attach an observer invoked on every transition.
    #[must_use]
    pub fn with_observer(mut self, observer: TransitionObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The device identity this orchestrator signs for.
    #[must_use]
    pub const fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Current snapshot (polling interface).
    #[must_use]
    pub fn snapshot(&self) -> ProtocolSnapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Probe capability and refresh the capability message.
    ///
    /// Used at startup and safe to repeat; does not advance the state
    /// machine — only a trigger does that.
    pub fn check_capability(&self) -> BiometricCapability {
        let capability = self.gate.capability();
        self.transition(|s| s.capability_message = capability.message().to_owned());
        capability
    }

    /// Run one full protocol sequence (the "Enable Biometrics" trigger).
    ///
    /// Strictly sequential: signing never starts before provisioning
    /// completes, verification never starts before signing completes.
    /// Returns the terminal snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::RunInFlight`] if another run is executing;
    /// protocol state is untouched in that case. Every other failure is
    /// absorbed into the `Error` terminal state.
    pub fn run(&self) -> Result<ProtocolSnapshot, ProtocolError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("trigger rejected: protocol run already in flight");
            return Err(ProtocolError::RunInFlight);
        }

        let terminal = self.run_locked();
        self.in_flight.store(false, Ordering::Release);
        Ok(terminal)
    }

    /// The protocol sequence proper. Caller holds the single-flight claim.
    fn run_locked(&self) -> ProtocolSnapshot {
        self.transition(|s| {
            s.state = ProtocolState::Checking;
            s.result_message = None;
        });

        let capability = self.gate.capability();
        tracing::debug!(available = capability.available, kind = ?capability.kind, "probed sensor gate");
        self.transition(|s| s.capability_message = capability.message().to_owned());

        if !capability.available {
            return self.transition(|s| s.state = ProtocolState::NoBiometrics);
        }

        self.transition(|s| s.state = ProtocolState::Ready);

        // Fresh keypair every attempt: verification below is never
        // checked against a stale key.
        self.transition(|s| s.state = ProtocolState::Provisioning);
        let public_key = match provision(self.gate.as_ref(), self.store.as_ref()) {
            Ok(key) => key,
            Err(e) => return self.fail(&e),
        };
        self.transition(|s| s.public_key = Some(public_key.clone()));

        self.transition(|s| s.state = ProtocolState::Signing);
        let mut record =
            match sign_challenge(self.store.as_ref(), &public_key, self.identity.payload()) {
                Ok(record) => record,
                Err(e) => return self.fail(&e),
            };
        self.transition(|s| s.signature = Some(record.signature.clone()));

        self.transition(|s| s.state = ProtocolState::Verifying);
        match verify_record(&record) {
            Ok(true) => {
                record.valid = Validity::Valid;
                tracing::info!("signature verified against epoch key");
                self.transition(|s| {
                    s.state = ProtocolState::Valid;
                    s.payload = Some(self.identity.unique_id.clone());
                    s.result_message = Some(RESULT_VALID.to_owned());
                })
            }
            Ok(false) => {
                record.valid = Validity::Invalid;
                tracing::warn!("signature mismatch");
                self.transition(|s| {
                    s.state = ProtocolState::Invalid;
                    s.result_message = Some(RESULT_INVALID.to_owned());
                })
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Absorb a failure into the `Error` terminal state.
    fn fail(&self, err: &ProtocolError) -> ProtocolSnapshot {
        tracing::warn!(error = %err, "protocol run failed");
        let detail = err.to_string();
        self.transition(|s| {
            s.state = ProtocolState::Error {
                detail: detail.clone(),
            };
            s.result_message = Some(detail.clone());
        })
    }

    /// Apply a mutation under the lock, then notify the observer with
    /// the fresh snapshot (outside the lock).
    fn transition(&self, apply: impl FnOnce(&mut ProtocolSnapshot)) -> ProtocolSnapshot {
        let fresh = {
            let mut guard = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
            apply(&mut guard);
            guard.clone()
        };
        if let Some(observer) = &self.observer {
            observer(&fresh);
        }
        fresh
    }
}
