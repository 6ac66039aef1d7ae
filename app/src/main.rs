//! EMPREINTE demo shell — thin console presentation layer.
//!
//! Renders orchestrator snapshots as text and exposes exactly one
//! command: run the protocol. The sensor is simulated (`--sensor`
//! selects the kind) and the user-presence challenge is answered on
//! stdin, or auto-approved with `--yes`. Protocol runs execute on a
//! blocking worker so the prompt never stalls the runtime.

use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};

use empreinte_protocol::{
    AlwaysPresent, BiometricKind, DeviceIdentity, DeviceType, Orchestrator, PresenceError,
    ProtocolError, ProtocolSnapshot, SoftwareKeyStore, StaticGate, UserPresence,
};
use tracing_subscriber::EnvFilter;

/// Fallback unique id when the host exposes none.
const FALLBACK_UNIQUE_ID: &str = "unknown-device";

// ---------------------------------------------------------------------------
// Host identity detection
// ---------------------------------------------------------------------------

/// Read the device identity once at startup.
///
/// The stable unique id comes from `/etc/machine-id` where present; the
/// model id from the hostname. A console host has no mobile device
/// class, so the type is `Unknown`.
fn detect_identity() -> DeviceIdentity {
    let unique_id = std::fs::read_to_string("/etc/machine-id")
        .map(|s| s.trim().to_owned())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_UNIQUE_ID.to_owned());

    let device_id = std::fs::read_to_string("/etc/hostname")
        .map(|s| s.trim().to_owned())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown-host".to_owned());

    DeviceIdentity::new(device_id, unique_id, DeviceType::Unknown)
}

// ---------------------------------------------------------------------------
// Stdin presence challenge
// ---------------------------------------------------------------------------

/// User-presence challenge answered on stdin — stands in for the
/// native biometric prompt.
struct StdinPresence {
    // Serializes concurrent prompts; only one run is in flight anyway.
    input: Mutex<()>,
}

impl UserPresence for StdinPresence {
    fn confirm(&self, prompt: &str) -> Result<(), PresenceError> {
        let _guard = self.input.lock().unwrap_or_else(PoisonError::into_inner);

        print!("[biometric] {prompt} — confirm? [Y/n] ");
        std::io::stdout()
            .flush()
            .map_err(|e| PresenceError::Unavailable(e.to_string()))?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| PresenceError::Unavailable(e.to_string()))?;

        match line.trim() {
            "" | "y" | "Y" | "yes" => Ok(()),
            _ => Err(PresenceError::Cancelled),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_section(label: &str, value: Option<&str>) {
    if let Some(text) = value {
        println!("  {label}:");
        println!("    {text}");
    }
}

fn print_snapshot(snapshot: &ProtocolSnapshot) {
    println!();
    println!("  {}", snapshot.capability_message);
    print_section("Public Key", snapshot.public_key.as_deref());
    print_section("Signature", snapshot.signature.as_deref());
    print_section("Payload", snapshot.payload.as_deref());
    print_section("Result", snapshot.result_message.as_deref());
    println!();
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

struct Options {
    sensor: BiometricKind,
    auto_confirm: bool,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        sensor: BiometricKind::Generic,
        auto_confirm: false,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sensor" => {
                let value = args.next().ok_or("--sensor requires a value")?;
                options.sensor = match value.as_str() {
                    "none" => BiometricKind::None,
                    "fingerprint" => BiometricKind::Fingerprint,
                    "face" => BiometricKind::Face,
                    "generic" => BiometricKind::Generic,
                    other => return Err(format!("unknown sensor kind: {other}")),
                };
            }
            "--yes" => options.auto_confirm = true,
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(options)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!("usage: empreinte [--sensor none|fingerprint|face|generic] [--yes]");
            std::process::exit(2);
        }
    };

    let gate = if options.sensor == BiometricKind::None {
        Arc::new(StaticGate::absent())
    } else {
        Arc::new(StaticGate::with_kind(options.sensor))
    };
    let presence: Arc<dyn UserPresence> = if options.auto_confirm {
        Arc::new(AlwaysPresent)
    } else {
        Arc::new(StdinPresence {
            input: Mutex::new(()),
        })
    };
    let store = Arc::new(SoftwareKeyStore::new(presence));

    let identity = detect_identity();
    tracing::info!(
        device_id = %identity.device_id,
        unique_id = %identity.unique_id,
        "detected device identity"
    );

    let orchestrator = Arc::new(
        Orchestrator::new(gate, store, identity).with_observer(Box::new(|snapshot| {
            tracing::debug!(state = ?snapshot.state, "transition");
        })),
    );

    // Startup probe, as the original app does on mount.
    orchestrator.check_capability();
    println!("EMPREINTE — biometric keypair & signature demo");
    println!("  device: {}", orchestrator.identity().unique_id);
    print_snapshot(&orchestrator.snapshot());

    let stdin = std::io::stdin();
    loop {
        print!("Press Enter to run the protocol (q to quit): ");
        if std::io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) if line.trim() == "q" => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("stdin read failed: {e}");
                break;
            }
        }

        // Platform calls block on human interaction — run off the runtime.
        let runner = Arc::clone(&orchestrator);
        let outcome = tokio::task::spawn_blocking(move || runner.run()).await;

        match outcome {
            Ok(Ok(snapshot)) => print_snapshot(&snapshot),
            Ok(Err(ProtocolError::RunInFlight)) => {
                println!("A protocol run is already in flight.");
            }
            Ok(Err(e)) => println!("Protocol error: {e}"),
            Err(e) => {
                tracing::error!("worker task failed: {e}");
                break;
            }
        }
    }
}
