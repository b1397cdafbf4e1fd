// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uplink messages sent from the device to Blynk.
//!
//! Every message is a typed [`Command`] that knows its MQTT topic and how to
//! encode its payload. The [`Publisher`] trait sends commands and offers one
//! convenience method per message kind.
//!
//! # Available Commands
//!
//! | Command | Topic | Payload |
//! |---------|-------|---------|
//! | [`VirtualWrite`] | `ds/V<n>` | value(s), NUL-separated |
//! | [`SetProperty`] | `ds/<pin>/prop/<property>` | value |
//! | [`BridgeWrite`] | `bridge/<token>/ds/V<n>` | value |
//! | [`Notify`] | `notify` | message |
//! | [`LogEvent`] | `event/<code>` | description |
//! | [`DeviceLog`] | `log/<level>` | message |
//! | [`DeviceInfoUpdate`] | `info/mcu` | JSON |
//! | [`Location`] | `loc` | JSON |
//! | [`Metadata`] | `meta` | JSON |
//! | [`AutomationTrigger`] | `automation/trigger` | JSON |
//! | [`OtaStatus`] | `ota/status` | JSON |
//!
//! # Examples
//!
//! ```
//! use blynk_mqtt::command::{Command, VirtualWrite};
//! use blynk_mqtt::types::{Value, VirtualPin};
//!
//! let cmd = VirtualWrite::new(VirtualPin::new(3), vec![255, 128, 0]);
//!
//! assert_eq!(cmd.topic(), "ds/V3");
//! assert_eq!(cmd.payload().unwrap(), "255\u{0}128\u{0}0");
//! ```

mod datastream;
mod message;
mod report;

pub use datastream::{BridgeWrite, SetProperty, VirtualWrite};
pub use message::{DeviceLog, LogEvent, Notify};
pub use report::{AutomationTrigger, DeviceInfoUpdate, Location, Metadata, OtaStatus};

use crate::error::{ParseError, Result};
use crate::types::{LogLevel, Value, VirtualPin};

/// A message the device publishes to Blynk.
pub trait Command {
    /// Returns the MQTT topic of the message.
    fn topic(&self) -> String;

    /// Encodes the message payload.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the payload cannot be serialized.
    fn payload(&self) -> std::result::Result<String, ParseError>;
}

/// Sends uplink messages.
///
/// Implemented by [`BlynkClient`](crate::BlynkClient) and by the
/// [`Link`](crate::Link) handed to event handlers, so handlers can answer
/// while being dispatched.
///
/// All methods fail with [`Error::NotConnected`](crate::Error::NotConnected)
/// while the device is offline.
pub trait Publisher {
    /// Publishes a command.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is not connected, the payload cannot be
    /// encoded or the transport rejects the message.
    fn send<C: Command + ?Sized>(&mut self, command: &C) -> Result<()>;

    /// Writes one or more values to a virtual pin.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn virtual_write(&mut self, pin: impl Into<VirtualPin>, value: impl Into<Value>) -> Result<()> {
        self.send(&VirtualWrite::new(pin.into(), value))
    }

    /// Sets a widget property (e.g. `label`, `color`) of a pin.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn set_property(
        &mut self,
        pin: &str,
        property: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.send(&SetProperty::new(pin, property, value))
    }

    /// Sends a push notification to the app.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn notify(&mut self, message: &str) -> Result<()> {
        self.send(&Notify::new(message))
    }

    /// Logs an event to the device timeline.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn log_event(&mut self, code: &str, description: &str) -> Result<()> {
        self.send(&LogEvent::new(code, description))
    }

    /// Writes a value to a virtual pin of another device.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn bridge_virtual_write(
        &mut self,
        target_token: &str,
        pin: impl Into<VirtualPin>,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.send(&BridgeWrite::new(target_token, pin.into(), value))
    }

    /// Reports the device location.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn publish_location(&mut self, location: &Location) -> Result<()> {
        self.send(location)
    }

    /// Reports device metadata.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn publish_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        self.send(metadata)
    }

    /// Triggers a server-side automation.
    ///
    /// A trigger carrying neither a state nor a value is still sent, with a
    /// warning.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn trigger_automation(&mut self, trigger: &AutomationTrigger) -> Result<()> {
        if trigger.state.is_none() && trigger.value.is_none() {
            tracing::warn!(
                automation_id = trigger.automation_id,
                "Automation trigger has neither state nor value"
            );
        }
        self.send(trigger)
    }

    /// Writes an entry to the device log.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn device_log(&mut self, level: LogLevel, message: &str) -> Result<()> {
        self.send(&DeviceLog::new(level, message))
    }

    /// Reports the progress of an over-the-air update.
    ///
    /// # Errors
    ///
    /// See [`Publisher::send`].
    fn publish_ota_status(&mut self, status: &OtaStatus) -> Result<()> {
        self.send(status)
    }
}
