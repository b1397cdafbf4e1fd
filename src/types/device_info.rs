// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static device description reported to the Blynk console.

use serde::{Deserialize, Serialize};

/// Board, firmware and application identification of the device.
///
/// Every field is optional; unknown fields are left out of the published
/// JSON.
///
/// # Examples
///
/// ```
/// use blynk_mqtt::types::DeviceInfo;
///
/// let info = DeviceInfo::new()
///     .with_board("ESP32-DevKitC")
///     .with_firmware_version("1.2.0");
///
/// assert_eq!(
///     serde_json::to_string(&info).unwrap(),
///     r#"{"board":"ESP32-DevKitC","firmwareVersion":"1.2.0"}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Board type (e.g. `ESP32`, `RP2040`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    /// Firmware version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    /// Application name and version (e.g. `MyProject/1.2.3`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
}

impl DeviceInfo {
    /// Creates an empty device description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the board type.
    #[must_use]
    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = Some(board.into());
        self
    }

    /// Sets the firmware version.
    #[must_use]
    pub fn with_firmware_version(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = Some(version.into());
        self
    }

    /// Sets the application name.
    #[must_use]
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Returns `true` when no field is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.board.is_none() && self.firmware_version.is_none() && self.app_name.is_none()
    }

    /// Overwrites the fields that `update` sets, keeping the others.
    pub fn merge(&mut self, update: DeviceInfo) {
        if update.board.is_some() {
            self.board = update.board;
        }
        if update.firmware_version.is_some() {
            self.firmware_version = update.firmware_version;
        }
        if update.app_name.is_some() {
            self.app_name = update.app_name;
        }
    }
}
