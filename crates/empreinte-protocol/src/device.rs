//! Device identity — the read-once signing payload source.
//!
//! Read once at startup and never mutated. The stable unique id is the
//! payload every challenge signs; the model id and device class are
//! display-only metadata.

use serde::{Deserialize, Serialize};

/// Coarse device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceType {
    Handset,
    Tablet,
    Tv,
    Unknown,
}

impl DeviceType {
    /// String representation for display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Handset => "handset",
            Self::Tablet => "tablet",
            Self::Tv => "tv",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable device identity, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    /// Model identifier string.
    pub device_id: String,
    /// Opaque stable device identifier — the signing payload.
    pub unique_id: String,
    /// Coarse device class.
    pub device_type: DeviceType,
}

impl DeviceIdentity {
    /// Create an identity from its three components.
    #[must_use]
    pub const fn new(device_id: String, unique_id: String, device_type: DeviceType) -> Self {
        Self {
            device_id,
            unique_id,
            device_type,
        }
    }

    /// The bytes every challenge signs.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        self.unique_id.as_bytes()
    }
}
