// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structured reports with JSON payloads.

use serde::Serialize;

use crate::command::Command;
use crate::error::ParseError;
use crate::protocol::topics;
use crate::types::{DeviceInfo, Value};

/// Publishes the device description.
///
/// Fields that are `None` are left out of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfoUpdate(pub DeviceInfo);

impl Command for DeviceInfoUpdate {
    fn topic(&self) -> String {
        topics::INFO_UPDATE.to_string()
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

/// The geographical position of the device.
///
/// # Examples
///
/// ```
/// use blynk_mqtt::command::{Command, Location};
///
/// let location = Location::new(52.52, 13.405).with_altitude(34.0);
/// assert_eq!(location.topic(), "loc");
/// assert_eq!(
///     location.payload().unwrap(),
///     r#"{"lat":52.52,"lon":13.405,"alt":34.0}"#
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Altitude in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<f64>,
    /// Horizontal dilution of precision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdop: Option<f64>,
}

impl Location {
    /// Creates a location from coordinates.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            alt: None,
            hdop: None,
        }
    }

    /// Sets the altitude.
    #[must_use]
    pub const fn with_altitude(mut self, alt: f64) -> Self {
        self.alt = Some(alt);
        self
    }

    /// Sets the horizontal dilution of precision.
    #[must_use]
    pub const fn with_hdop(mut self, hdop: f64) -> Self {
        self.hdop = Some(hdop);
        self
    }
}

impl Command for Location {
    fn topic(&self) -> String {
        topics::LOCATION_UPDATE.to_string()
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Free-form key/value metadata shown in the device details.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(pub serde_json::Map<String, serde_json::Value>);

impl Metadata {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, replacing any previous value for the key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl Command for Metadata {
    fn topic(&self) -> String {
        topics::METADATA_UPDATE.to_string()
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Triggers a server-side automation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationTrigger {
    /// The automation identifier.
    pub automation_id: u64,
    /// Switch-like state (e.g. `on`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Value passed to the automation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl AutomationTrigger {
    /// Creates a trigger with neither state nor value.
    #[must_use]
    pub const fn new(automation_id: u64) -> Self {
        Self {
            automation_id,
            state: None,
            value: None,
        }
    }

    /// Sets the state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Sets the value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl Command for AutomationTrigger {
    fn topic(&self) -> String {
        topics::AUTOMATION_TRIGGER.to_string()
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Progress of a custom over-the-air update.
///
/// # Examples
///
/// ```
/// use blynk_mqtt::command::{Command, OtaStatus};
///
/// let status = OtaStatus::new("failed").with_error(3, "checksum mismatch");
/// assert_eq!(
///     status.payload().unwrap(),
///     r#"{"status":"failed","errorCode":3,"errorMessage":"checksum mismatch"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtaStatus {
    /// The update stage (e.g. `downloading`, `success`).
    pub status: String,
    /// The firmware version being installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The image size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Failure code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl OtaStatus {
    /// Creates a status report.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            version: None,
            size: None,
            error_code: None,
            error_message: None,
        }
    }

    /// Sets the firmware version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the image size.
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the failure code and description.
    #[must_use]
    pub fn with_error(mut self, code: i64, message: impl Into<String>) -> Self {
        self.error_code = Some(code);
        self.error_message = Some(message.into());
        self
    }
}

impl Command for OtaStatus {
    fn topic(&self) -> String {
        topics::OTA_STATUS.to_string()
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_info_omits_unknown_fields() {
        let cmd = DeviceInfoUpdate(DeviceInfo::new().with_board("ESP32"));
        assert_eq!(cmd.topic(), "info/mcu");
        assert_eq!(cmd.payload().unwrap(), r#"{"board":"ESP32"}"#);
    }

    #[test]
    fn device_info_camel_case() {
        let info = DeviceInfo::new()
            .with_firmware_version("1.0.1")
            .with_app_name("Greenhouse");
        let payload = DeviceInfoUpdate(info).payload().unwrap();
        assert_eq!(
            payload,
            r#"{"firmwareVersion":"1.0.1","appName":"Greenhouse"}"#
        );
    }

    #[test]
    fn location_with_hdop() {
        let payload = Location::new(1.5, -2.25).with_hdop(0.9).payload().unwrap();
        assert_eq!(payload, r#"{"lat":1.5,"lon":-2.25,"hdop":0.9}"#);
    }

    #[test]
    fn metadata_entries() {
        let metadata = Metadata::new()
            .with("sensorModel", "DHT22")
            .with("revision", 3);
        let json: serde_json::Value = serde_json::from_str(&metadata.payload().unwrap()).unwrap();
        assert_eq!(json["sensorModel"], "DHT22");
        assert_eq!(json["revision"], 3);
        assert_eq!(metadata.topic(), "meta");
    }

    #[test]
    fn automation_trigger_fields() {
        let trigger = AutomationTrigger::new(77).with_state("on").with_value(12);
        assert_eq!(trigger.topic(), "automation/trigger");
        assert_eq!(
            trigger.payload().unwrap(),
            r#"{"automationId":77,"state":"on","value":12}"#
        );
    }

    #[test]
    fn automation_trigger_id_only() {
        assert_eq!(
            AutomationTrigger::new(5).payload().unwrap(),
            r#"{"automationId":5}"#
        );
    }

    #[test]
    fn ota_status_progress() {
        let status = OtaStatus::new("downloading")
            .with_version("2.0.0")
            .with_size(524_288);
        assert_eq!(status.topic(), "ota/status");
        assert_eq!(
            status.payload().unwrap(),
            r#"{"status":"downloading","version":"2.0.0","size":524288}"#
        );
    }
}
