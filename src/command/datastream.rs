// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Datastream writes: own pins, widget properties and bridged devices.

use crate::command::Command;
use crate::error::ParseError;
use crate::protocol::topics;
use crate::types::{Value, VirtualPin};

/// Writes a value to a virtual pin.
///
/// A [`Value::List`] is sent as a multi-value payload.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualWrite {
    /// The target pin.
    pub pin: VirtualPin,
    /// The value to write.
    pub value: Value,
}

impl VirtualWrite {
    /// Creates a write command.
    #[must_use]
    pub fn new(pin: VirtualPin, value: impl Into<Value>) -> Self {
        Self {
            pin,
            value: value.into(),
        }
    }
}

impl Command for VirtualWrite {
    fn topic(&self) -> String {
        topics::datastream(self.pin)
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(self.value.encode())
    }
}

/// Sets a widget property.
///
/// # Examples
///
/// ```
/// use blynk_mqtt::command::{Command, SetProperty};
///
/// let cmd = SetProperty::new("v0", "color", "#00FF00");
/// assert_eq!(cmd.topic(), "ds/v0/prop/color");
/// assert_eq!(cmd.payload().unwrap(), "#00FF00");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SetProperty {
    /// The pin designator of the widget (e.g. `v0`).
    pub pin: String,
    /// The property name.
    pub property: String,
    /// The property value.
    pub value: Value,
}

impl SetProperty {
    /// Creates a property update.
    #[must_use]
    pub fn new(pin: impl Into<String>, property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            pin: pin.into(),
            property: property.into(),
            value: value.into(),
        }
    }
}

impl Command for SetProperty {
    fn topic(&self) -> String {
        topics::property(&self.pin, &self.property)
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(self.value.encode())
    }
}

/// Writes a value to a virtual pin of another device.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeWrite {
    /// The auth token of the target device.
    pub target_token: String,
    /// The target pin on that device.
    pub pin: VirtualPin,
    /// The value to write.
    pub value: Value,
}

impl BridgeWrite {
    /// Creates a bridge write.
    #[must_use]
    pub fn new(target_token: impl Into<String>, pin: VirtualPin, value: impl Into<Value>) -> Self {
        Self {
            target_token: target_token.into(),
            pin,
            value: value.into(),
        }
    }
}

impl Command for BridgeWrite {
    fn topic(&self) -> String {
        topics::bridge(&self.target_token, self.pin)
    }

    fn payload(&self) -> Result<String, ParseError> {
        Ok(self.value.encode())
    }
}
