// Visionect API resource types
//
// Models for the device and session resources. The server only supports
// whole-resource PUTs, so every type captures unmodelled fields in a
// flattened `extra` map -- a read-modify-write cycle must round-trip
// fields this crate knows nothing about, byte-for-byte in meaning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Device ───────────────────────────────────────────────────────────

/// A device record from `/api/device`.
///
/// Visionect returns several dozen fields per device; only the ones the
/// facade mutates or normalizes are modelled explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "Uuid")]
    pub uuid: String,

    /// Free-form option map (`"Name"`, timezone, sleep modes, ...).
    /// Mutated by `set_device_option`; always PUT back whole.
    #[serde(rename = "Options", default)]
    pub options: Map<String, Value>,

    #[serde(rename = "Displays", default)]
    pub displays: Vec<Display>,

    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    /// The device's display name, when configured.
    pub fn name(&self) -> Option<&str> {
        self.options.get("Name").and_then(Value::as_str)
    }
}

/// One physical display panel of a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Display {
    /// Rotation in quarter turns (0-3).
    #[serde(rename = "Rotation", default)]
    pub rotation: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Live status block nested under a device record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(rename = "Battery", default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<i64>,

    /// Reported in millivolts by some firmware versions, volts by others.
    #[serde(
        rename = "BatteryVoltage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub battery_voltage: Option<f64>,

    #[serde(
        rename = "IPAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_address: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Session ──────────────────────────────────────────────────────────

/// A session record from `/api/session/{uuid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "Uuid")]
    pub uuid: String,

    #[serde(rename = "Backend", default)]
    pub backend: Backend,

    /// Session-level options (`DefaultEncoding`, `DefaultDithering`, ...).
    #[serde(rename = "Options", default)]
    pub options: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The rendering backend driving a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Backend {
    /// Backend type; `"HTML"` for URL-driven content.
    #[serde(rename = "Name", default)]
    pub name: String,

    /// Backend parameters (`url`, `ReloadTimeout`, ...). String-valued
    /// on the wire even for numeric settings.
    #[serde(rename = "Fields", default)]
    pub fields: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
