// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain-text messages: notifications, timeline events and device logs.

use crate::command::Command;
use crate::error::ParseError;
use crate::protocol::topics;
use crate::types::LogLevel;

/// A push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notify {
    /// The notification text.
    pub message: String,
}

impl Notify {
    /// Creates a notification.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Command for Notify {
    fn topic(&self) -> String {
        topics::NOTIFY.to_string()
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(self.message.clone())
    }
}

/// A timeline event, identified by the event code configured in the
/// device template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// The event code.
    pub code: String,
    /// Optional description; may be empty.
    pub description: String,
}

impl LogEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

impl Command for LogEvent {
    fn topic(&self) -> String {
        topics::event(&self.code)
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(self.description.clone())
    }
}

/// A device log entry.
///
/// # Examples
///
/// ```
/// use blynk_mqtt::command::{Command, DeviceLog};
/// use blynk_mqtt::types::LogLevel;
///
/// let level: LogLevel = "error".parse().unwrap();
/// let cmd = DeviceLog::new(level, "sensor timeout");
/// assert_eq!(cmd.topic(), "log/error");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLog {
    /// The severity.
    pub level: LogLevel,
    /// The log text.
    pub message: String,
}

impl DeviceLog {
    /// Creates a log entry.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl Command for DeviceLog {
    fn topic(&self) -> String {
        topics::device_log(self.level)
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(self.message.clone())
    }
}
