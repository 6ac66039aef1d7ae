#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Integration tests for the full protocol state machine — capability
//! gating, key lifecycle across runs, fail-fast ordering, verification
//! outcomes, and the single-flight trigger guard.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use empreinte_protocol::{
    AlwaysPresent, BiometricCapability, BiometricGate, BiometricKind, DeviceIdentity, DeviceType,
    KeyStoreError, Orchestrator, ProtocolError, ProtocolState, SecureKeyStore, SoftwareKeyStore,
    StaticGate,
};

// ---------------------------------------------------------------------------
// Test collaborators
// ---------------------------------------------------------------------------

/// Gate that counts probes.
struct CountingGate {
    capability: BiometricCapability,
    probes: AtomicUsize,
}

impl CountingGate {
    fn new(capability: BiometricCapability) -> Self {
        Self {
            capability,
            probes: AtomicUsize::new(0),
        }
    }
}

impl BiometricGate for CountingGate {
    fn capability(&self) -> BiometricCapability {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.capability
    }
}

/// Key store wrapper that counts every call.
struct CountingStore {
    inner: SoftwareKeyStore,
    exist_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    create_calls: AtomicUsize,
    sign_calls: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: SoftwareKeyStore::new(Arc::new(AlwaysPresent)),
            exist_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    fn total_calls(&self) -> usize {
        self.exist_calls.load(Ordering::SeqCst)
            + self.delete_calls.load(Ordering::SeqCst)
            + self.create_calls.load(Ordering::SeqCst)
            + self.sign_calls.load(Ordering::SeqCst)
    }
}

impl SecureKeyStore for CountingStore {
    fn keys_exist(&self) -> bool {
        self.exist_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.keys_exist()
    }

    fn delete_keys(&self) -> Result<(), KeyStoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_keys()
    }

    fn create_keys(&self, prompt: &str) -> Result<String, KeyStoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_keys(prompt)
    }

    fn sign(&self, prompt: &str, payload: &[u8]) -> Result<String, KeyStoreError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sign(prompt, payload)
    }
}

/// Store whose `create_keys` always fails, counting signing attempts.
struct FailingCreateStore {
    sign_calls: AtomicUsize,
}

impl SecureKeyStore for FailingCreateStore {
    fn keys_exist(&self) -> bool {
        false
    }

    fn delete_keys(&self) -> Result<(), KeyStoreError> {
        Ok(())
    }

    fn create_keys(&self, _prompt: &str) -> Result<String, KeyStoreError> {
        Err(KeyStoreError::Unavailable("enclave offline".into()))
    }

    fn sign(&self, _prompt: &str, _payload: &[u8]) -> Result<String, KeyStoreError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        Err(KeyStoreError::Unavailable("unreachable".into()))
    }
}

/// Store that signs a different payload than asked — forces a mismatch.
struct TamperingStore {
    inner: SoftwareKeyStore,
}

impl SecureKeyStore for TamperingStore {
    fn keys_exist(&self) -> bool {
        self.inner.keys_exist()
    }

    fn delete_keys(&self) -> Result<(), KeyStoreError> {
        self.inner.delete_keys()
    }

    fn create_keys(&self, prompt: &str) -> Result<String, KeyStoreError> {
        self.inner.create_keys(prompt)
    }

    fn sign(&self, prompt: &str, _payload: &[u8]) -> Result<String, KeyStoreError> {
        self.inner.sign(prompt, b"a completely different payload")
    }
}

/// Store that returns garbage instead of a base64 signature.
struct CorruptEncodingStore {
    inner: SoftwareKeyStore,
}

impl SecureKeyStore for CorruptEncodingStore {
    fn keys_exist(&self) -> bool {
        self.inner.keys_exist()
    }

    fn delete_keys(&self) -> Result<(), KeyStoreError> {
        self.inner.delete_keys()
    }

    fn create_keys(&self, prompt: &str) -> Result<String, KeyStoreError> {
        self.inner.create_keys(prompt)
    }

    fn sign(&self, _prompt: &str, _payload: &[u8]) -> Result<String, KeyStoreError> {
        Ok("!!!not-base64!!!".into())
    }
}

/// Store whose `sign` blocks until released — for the re-entrancy test.
struct BlockingStore {
    inner: SoftwareKeyStore,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl SecureKeyStore for BlockingStore {
    fn keys_exist(&self) -> bool {
        self.inner.keys_exist()
    }

    fn delete_keys(&self) -> Result<(), KeyStoreError> {
        self.inner.delete_keys()
    }

    fn create_keys(&self, prompt: &str) -> Result<String, KeyStoreError> {
        self.inner.create_keys(prompt)
    }

    fn sign(&self, prompt: &str, payload: &[u8]) -> Result<String, KeyStoreError> {
        self.entered
            .lock()
            .unwrap()
            .send(())
            .expect("test harness alive");
        self.release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(5))
            .expect("test harness releases the store");
        self.inner.sign(prompt, payload)
    }
}

fn identity() -> DeviceIdentity {
    DeviceIdentity::new(
        "pixel-7".into(),
        "device-uuid-42".into(),
        DeviceType::Handset,
    )
}

fn face_gate() -> Arc<StaticGate> {
    Arc::new(StaticGate::with_kind(BiometricKind::Face))
}

// ---------------------------------------------------------------------------
// Capability gating
// ---------------------------------------------------------------------------

/// Sensor absent: the machine reaches `NoBiometrics` and the key store
/// is never touched.
#[test]
fn no_sensor_means_no_store_calls() {
    let store = Arc::new(CountingStore::new());
    let orch = Orchestrator::new(
        Arc::new(StaticGate::absent()),
        Arc::clone(&store) as Arc<dyn SecureKeyStore>,
        identity(),
    );

    let snap = orch.run().unwrap();
    assert_eq!(snap.state, ProtocolState::NoBiometrics);
    assert_eq!(store.total_calls(), 0, "no key-store calls may occur");
}

/// Two probes with no state change in between yield identical values.
#[test]
fn capability_probe_is_idempotent() {
    let gate = CountingGate::new(BiometricCapability::with_kind(BiometricKind::Fingerprint));
    let first = gate.capability();
    let second = gate.capability();
    assert_eq!(first, second);
    assert_eq!(gate.probes.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Key lifecycle across runs
// ---------------------------------------------------------------------------

/// Two consecutive successful runs leave exactly one keypair in the
/// store: the second run deletes the first epoch's key before creating
/// its own.
#[test]
fn consecutive_runs_keep_a_single_keypair() {
    let store = Arc::new(CountingStore::new());
    let orch = Orchestrator::new(
        face_gate(),
        Arc::clone(&store) as Arc<dyn SecureKeyStore>,
        identity(),
    );

    assert!(!store.inner.keys_exist());

    let first = orch.run().unwrap();
    assert_eq!(first.state, ProtocolState::Valid);
    assert!(store.inner.keys_exist());

    let second = orch.run().unwrap();
    assert_eq!(second.state, ProtocolState::Valid);
    assert!(store.inner.keys_exist());

    assert_eq!(store.create_calls.load(Ordering::SeqCst), 2);
    // Only the second run found an existing keypair to destroy.
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Face sensor, provisioning and signing succeed, verifier matches:
/// terminal `Valid` with the payload and a match message displayed.
#[test]
fn successful_run_reaches_valid_with_match_text() {
    let orch = Orchestrator::new(
        face_gate(),
        Arc::new(SoftwareKeyStore::new(Arc::new(AlwaysPresent))),
        identity(),
    );

    let snap = orch.run().unwrap();
    assert_eq!(snap.state, ProtocolState::Valid);
    assert_eq!(snap.capability_message, "This device has face recognition");
    assert_eq!(snap.payload.as_deref(), Some("device-uuid-42"));
    assert!(snap.result_message.unwrap().contains("match"));
}

/// Verifier reports a mismatch: terminal `Invalid`, mismatch text, and
/// the signature/key text remain visible for inspection.
#[test]
fn mismatch_reaches_invalid_and_keeps_material_visible() {
    let orch = Orchestrator::new(
        face_gate(),
        Arc::new(TamperingStore {
            inner: SoftwareKeyStore::new(Arc::new(AlwaysPresent)),
        }),
        identity(),
    );

    let snap = orch.run().unwrap();
    assert_eq!(snap.state, ProtocolState::Invalid);
    assert!(snap.public_key.is_some(), "key text stays visible");
    assert!(snap.signature.is_some(), "signature text stays visible");
    assert!(snap.result_message.unwrap().contains("does not match"));
}

/// A signature that cannot be decoded is an `Error`, not an `Invalid`.
#[test]
fn decode_failure_is_error_not_invalid() {
    let orch = Orchestrator::new(
        face_gate(),
        Arc::new(CorruptEncodingStore {
            inner: SoftwareKeyStore::new(Arc::new(AlwaysPresent)),
        }),
        identity(),
    );

    let snap = orch.run().unwrap();
    match snap.state {
        ProtocolState::Error { detail } => assert!(detail.contains("decode")),
        other => panic!("expected Error state, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Fail-fast ordering
// ---------------------------------------------------------------------------

/// Provisioning failure goes straight to `Error` — signing is never
/// invoked, so no stale-key signing can ever happen.
#[test]
fn provisioning_failure_never_signs() {
    let store = Arc::new(FailingCreateStore {
        sign_calls: AtomicUsize::new(0),
    });
    let orch = Orchestrator::new(
        face_gate(),
        Arc::clone(&store) as Arc<dyn SecureKeyStore>,
        identity(),
    );

    let snap = orch.run().unwrap();
    assert!(matches!(snap.state, ProtocolState::Error { .. }));
    assert_eq!(store.sign_calls.load(Ordering::SeqCst), 0);
    assert!(snap.result_message.unwrap().contains("enclave offline"));
}

// ---------------------------------------------------------------------------
// Single-flight guard
// ---------------------------------------------------------------------------

/// A second trigger while a run is blocked inside signing is rejected
/// without touching protocol state; the first run then completes.
#[test]
fn second_trigger_is_rejected_while_run_in_flight() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();

    let orch = Arc::new(Orchestrator::new(
        face_gate(),
        Arc::new(BlockingStore {
            inner: SoftwareKeyStore::new(Arc::new(AlwaysPresent)),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        }),
        identity(),
    ));

    let runner = Arc::clone(&orch);
    let handle = thread::spawn(move || runner.run());

    // Wait until the first run is blocked inside the signing challenge.
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first run reaches signing");

    let rejected = orch.run();
    assert!(matches!(rejected, Err(ProtocolError::RunInFlight)));

    release_tx.send(()).expect("release the blocked store");
    let snap = handle.join().expect("runner thread").unwrap();
    assert_eq!(snap.state, ProtocolState::Valid);
}
