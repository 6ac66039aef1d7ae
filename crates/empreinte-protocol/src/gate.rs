//! Biometric sensor gate — capability detection.
//!
//! The gate reports sensor presence and kind. Probing has no side
//! effects beyond reading hardware state and is safe to repeat:
//! availability can change across app lifecycle events (e.g., the user
//! enrolls a fingerprint while the app is backgrounded), so the
//! orchestrator re-probes at the start of every run.

use serde::{Deserialize, Serialize};

/// Kind of biometric sensor present on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BiometricKind {
    /// No sensor or no enrollment.
    None,
    Fingerprint,
    Face,
    /// Sensor present but the platform does not say which kind.
    Generic,
}

impl BiometricKind {
    /// Human-readable capability message for display.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::None => "This device does not have biometrics enabled",
            Self::Fingerprint => "This device has fingerprint recognition",
            Self::Face => "This device has face recognition",
            Self::Generic => "This device has biometric authentication",
        }
    }
}

/// Result of a capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricCapability {
    /// Whether a usable sensor is available.
    pub available: bool,
    /// The sensor kind.
    pub kind: BiometricKind,
}

impl BiometricCapability {
    /// Capability of a device with no sensor.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            available: false,
            kind: BiometricKind::None,
        }
    }

    /// Capability of a device with the given sensor kind present.
    #[must_use]
    pub const fn with_kind(kind: BiometricKind) -> Self {
        Self {
            available: true,
            kind,
        }
    }

    /// Display message for this capability.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.kind.describe()
    }
}

/// Platform biometric sensor abstraction.
///
/// Implementations read hardware/enrollment state. `capability` must be
/// idempotent: two probes with no state change in between yield the same
/// value.
pub trait BiometricGate: Send + Sync {
    /// Probe sensor presence and kind.
    fn capability(&self) -> BiometricCapability;
}

/// Gate with a fixed capability — demo shells and tests.
pub struct StaticGate {
    capability: BiometricCapability,
}

impl StaticGate {
    /// Gate reporting the given sensor kind as present.
    #[must_use]
    pub const fn with_kind(kind: BiometricKind) -> Self {
        Self {
            capability: BiometricCapability::with_kind(kind),
        }
    }

    /// Gate reporting no sensor.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            capability: BiometricCapability::none(),
        }
    }
}

impl BiometricGate for StaticGate {
    fn capability(&self) -> BiometricCapability {
        self.capability
    }
}
