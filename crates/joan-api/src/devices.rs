// Device endpoints
//
// Read and read-modify-write operations on `/api/device`. Visionect has
// no partial updates: every mutation fetches the full resource, edits it
// in place, and PUTs the whole object back. All writes are fail-closed;
// if the preceding fetch fails, nothing is written.

use std::net::IpAddr;

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{Payload, VisionectClient};
use crate::error::Error;
use crate::models::Device;

impl VisionectClient {
    /// List every device the server knows about.
    ///
    /// `GET /api/device`
    pub async fn get_all_devices(&self) -> Result<Vec<Device>, Error> {
        debug!("listing devices");
        self.get_json("/api/device").await
    }

    /// Fetch a single device record.
    ///
    /// `GET /api/device/{uuid}`
    pub async fn get_device(&self, uuid: &str) -> Result<Device, Error> {
        self.get_json(&format!("/api/device/{uuid}")).await
    }

    /// Fetch the merged device view: the device record overlaid with its
    /// session record (device fields win on collision), with a couple of
    /// status fields normalized -- an `IPAddress` that does not parse is
    /// dropped, and a `BatteryVoltage` reported in millivolts is scaled
    /// to volts.
    pub async fn get_device_data(&self, uuid: &str) -> Result<Value, Error> {
        let device: Value = self.get_json(&format!("/api/device/{uuid}")).await?;
        let session: Value = self.get_json(&format!("/api/session/{uuid}")).await?;

        let mut merged = match device {
            Value::Object(map) => map,
            other => {
                return Err(Error::Deserialization {
                    message: "device record is not a JSON object".into(),
                    body: other.to_string(),
                });
            }
        };

        if let Value::Object(session) = session {
            for (key, value) in session {
                merged.entry(key).or_insert(value);
            }
        }

        normalize_status(&mut merged);
        Ok(Value::Object(merged))
    }

    /// Replace a full device record.
    ///
    /// `PUT /api/device/{uuid}`
    pub async fn put_device(&self, device: &Device) -> Result<(), Error> {
        self.put_json(&format!("/api/device/{}", device.uuid), device)
            .await
    }

    /// Set the rotation of the device's first display and PUT the whole
    /// device back.
    ///
    /// Not safe to race against another writer for the same UUID: the
    /// server has no compare-and-swap, so the last PUT wins.
    pub async fn set_display_rotation(&self, uuid: &str, rotation: i64) -> Result<(), Error> {
        let mut device = self.get_device(uuid).await?;

        let display = device.displays.first_mut().ok_or_else(|| Error::MissingField {
            uuid: uuid.to_owned(),
            message: "device reports no displays".into(),
        })?;
        display.rotation = rotation;

        debug!(uuid, rotation, "setting display rotation");
        self.put_device(&device).await
    }

    /// Set one key in the device's `Options` map and PUT the whole
    /// device back.
    pub async fn set_device_option(
        &self,
        uuid: &str,
        key: &str,
        value: &str,
    ) -> Result<(), Error> {
        let mut device = self.get_device(uuid).await?;
        device
            .options
            .insert(key.to_owned(), Value::String(value.to_owned()));

        debug!(uuid, key, value, "setting device option");
        self.put_device(&device).await
    }

    /// Reboot one device.
    ///
    /// `POST /api/device/{uuid}/reboot`
    pub async fn reboot_device(&self, uuid: &str) -> Result<(), Error> {
        debug!(uuid, "rebooting device");
        self.post(&format!("/api/device/{uuid}/reboot"), None::<&()>)
            .await
    }

    /// Reboot many devices in one round trip.
    ///
    /// `POST /api/device/reboot` with a JSON array of UUIDs. An empty
    /// list is a success no-op; no request is made.
    pub async fn reboot_devices(&self, uuids: &[String]) -> Result<(), Error> {
        if uuids.is_empty() {
            return Ok(());
        }
        debug!(count = uuids.len(), "batch rebooting devices");
        self.post("/api/device/reboot", Some(&json!(uuids))).await
    }

    /// Fetch the current rendering of a device's screen as PNG bytes.
    ///
    /// `GET /api/live/device/{uuid}/image.png`
    pub async fn get_device_screenshot(&self, uuid: &str) -> Result<Vec<u8>, Error> {
        let payload = self
            .request(
                reqwest::Method::GET,
                &format!("/api/live/device/{uuid}/image.png"),
                None::<&()>,
                false,
            )
            .await?;

        match payload {
            Payload::Bytes(bytes) => Ok(bytes),
            other => Err(Error::Deserialization {
                message: "expected an image response".into(),
                body: format!("{other:?}"),
            }),
        }
    }
}

/// Normalize the merged record's `Status` block in place.
fn normalize_status(merged: &mut serde_json::Map<String, Value>) {
    let Some(Value::Object(status)) = merged.get_mut("Status") else {
        return;
    };

    // Some firmware reports an unparseable placeholder address.
    let bogus_ip = status
        .get("IPAddress")
        .and_then(Value::as_str)
        .is_some_and(|ip| ip.parse::<IpAddr>().is_err());
    if bogus_ip {
        status.remove("IPAddress");
    }

    // Battery voltage arrives in millivolts on some versions, volts on
    // others; anything over 100 cannot be volts.
    if let Some(mv) = status.get("BatteryVoltage").and_then(Value::as_f64) {
        if mv > 100.0 {
            status.insert("BatteryVoltage".into(), json!(mv / 1000.0));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    fn merged(status: Value) -> serde_json::Map<String, Value> {
        let Value::Object(map) = json!({ "Uuid": "abc", "Status": status }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn invalid_ip_is_dropped() {
        let mut map = merged(json!({ "IPAddress": "not-an-ip", "Battery": 50 }));
        normalize_status(&mut map);
        let status = &map["Status"];
        assert!(status.get("IPAddress").is_none());
        assert_eq!(status["Battery"], json!(50));
    }

    #[test]
    fn valid_ips_survive() {
        for ip in ["10.0.0.9", "fd00::5"] {
            let mut map = merged(json!({ "IPAddress": ip }));
            normalize_status(&mut map);
            assert_eq!(map["Status"]["IPAddress"], json!(ip));
        }
    }

    #[test]
    fn millivolts_are_scaled_to_volts() {
        let mut map = merged(json!({ "BatteryVoltage": 4012.0 }));
        normalize_status(&mut map);
        assert_eq!(map["Status"]["BatteryVoltage"], json!(4.012));
    }

    #[test]
    fn plausible_volts_are_untouched() {
        let mut map = merged(json!({ "BatteryVoltage": 3.98 }));
        normalize_status(&mut map);
        assert_eq!(map["Status"]["BatteryVoltage"], json!(3.98));
    }
}
