// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Over-the-air update commands sent by the server.

use serde::{Deserialize, Serialize};

/// An OTA command for a custom update implementation.
///
/// The well-known keys are decoded into fields; any other key of the JSON
/// object is kept in [`OtaRequest::extra`].
///
/// # Examples
///
/// ```
/// use blynk_mqtt::event::OtaRequest;
///
/// let request: OtaRequest = serde_json::from_str(
///     r#"{"command":"start","url":"http://fw.local/1.1.bin","version":"1.1.0","channel":"beta"}"#,
/// )
/// .unwrap();
///
/// assert_eq!(request.command.as_deref(), Some("start"));
/// assert_eq!(request.version.as_deref(), Some("1.1.0"));
/// assert_eq!(request.extra["channel"], "beta");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtaRequest {
    /// The requested action (e.g. `start`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Where to download the firmware image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// The firmware version to install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Expected image size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Any other keys of the request.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
