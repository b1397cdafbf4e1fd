// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events delivered to application handlers.
//!
//! An [`Event`] is either a lifecycle transition of the connection
//! (`connect`, `disconnect`) or a decoded downlink message. Every event has
//! an [`EventKey`], and the [`EventRouter`] holds at most one handler per
//! key.
//!
//! # Event names
//!
//! | Name                  | Key                             |
//! |-----------------------|---------------------------------|
//! | `connect`             | [`EventKey::Connect`]           |
//! | `disconnect`          | [`EventKey::Disconnect`]        |
//! | `V<n>` / `v<n>`       | [`EventKey::VirtualPin`]        |
//! | `info_get`            | [`EventKey::InfoGet`]           |
//! | `property_get`        | [`EventKey::PropertyGet`]       |
//! | `automation_response` | [`EventKey::AutomationResponse`]|
//! | `ota_request`         | [`EventKey::OtaRequest`]        |

mod ota;
mod router;

pub use ota::OtaRequest;
pub use router::{EventRouter, Handler};

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;
use crate::types::{Value, VirtualPin};

/// Identifies the handler slot an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// The connection was established.
    Connect,
    /// The connection was closed or lost, or a connect attempt failed.
    Disconnect,
    /// A value was written to a virtual pin from the app or server.
    VirtualPin(VirtualPin),
    /// The server asked for the device description.
    InfoGet,
    /// The server asked for a widget property value.
    PropertyGet,
    /// The server reported the outcome of a triggered automation.
    AutomationResponse,
    /// The server sent an over-the-air update command.
    OtaRequest,
}

impl EventKey {
    /// Returns the canonical event name.
    #[must_use]
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Disconnect => f.write_str("disconnect"),
            Self::VirtualPin(pin) => write!(f, "{pin}"),
            Self::InfoGet => f.write_str("info_get"),
            Self::PropertyGet => f.write_str("property_get"),
            Self::AutomationResponse => f.write_str("automation_response"),
            Self::OtaRequest => f.write_str("ota_request"),
        }
    }
}

impl From<VirtualPin> for EventKey {
    fn from(pin: VirtualPin) -> Self {
        Self::VirtualPin(pin)
    }
}

impl FromStr for EventKey {
    type Err = ValueError;

    /// Parses an event name.
    ///
    /// Virtual pin names are case-insensitive (`"v1"` and `"V1"` are the
    /// same key); other names are matched ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let is_pin_name = s.len() > 1
            && (s.starts_with('V') || s.starts_with('v'))
            && s[1..].bytes().all(|b| b.is_ascii_digit());
        if is_pin_name {
            return s.parse::<VirtualPin>().map(Self::VirtualPin);
        }

        match s.to_ascii_lowercase().as_str() {
            "connect" => Ok(Self::Connect),
            "disconnect" => Ok(Self::Disconnect),
            "info_get" => Ok(Self::InfoGet),
            "property_get" => Ok(Self::PropertyGet),
            "automation_response" => Ok(Self::AutomationResponse),
            "ota_request" => Ok(Self::OtaRequest),
            _ => Err(ValueError::UnknownEvent(s.to_string())),
        }
    }
}

/// An event with its decoded arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The connection was established.
    Connected,
    /// The connection was closed or lost, or a connect attempt failed.
    Disconnected,
    /// A value was written to a virtual pin.
    VirtualWrite {
        /// The target pin.
        pin: VirtualPin,
        /// The decoded value (a list for multi-value widgets).
        value: Value,
    },
    /// The server asked for the device description.
    InfoGet,
    /// The server asked for a widget property.
    PropertyGet {
        /// The pin designator of the widget (e.g. `v0`).
        pin: String,
        /// The property name (e.g. `label`).
        property: String,
    },
    /// The server reported the outcome of a triggered automation.
    AutomationResponse {
        /// The automation identifier.
        automation_id: u64,
        /// The execution status (e.g. `success`).
        status: String,
        /// Optional details.
        message: Option<String>,
    },
    /// The server sent an over-the-air update command.
    OtaRequest(OtaRequest),
}

impl Event {
    /// Returns the key this event is routed by.
    #[must_use]
    pub fn key(&self) -> EventKey {
        match self {
            Self::Connected => EventKey::Connect,
            Self::Disconnected => EventKey::Disconnect,
            Self::VirtualWrite { pin, .. } => EventKey::VirtualPin(*pin),
            Self::InfoGet => EventKey::InfoGet,
            Self::PropertyGet { .. } => EventKey::PropertyGet,
            Self::AutomationResponse { .. } => EventKey::AutomationResponse,
            Self::OtaRequest(_) => EventKey::OtaRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lifecycle_names() {
        assert_eq!("connect".parse::<EventKey>().unwrap(), EventKey::Connect);
        assert_eq!("Disconnect".parse::<EventKey>().unwrap(), EventKey::Disconnect);
        assert_eq!(
            "ota_request".parse::<EventKey>().unwrap(),
            EventKey::OtaRequest
        );
    }

    #[test]
    fn parse_pin_names_normalized() {
        let expected = EventKey::VirtualPin(VirtualPin::new(3));
        assert_eq!("V3".parse::<EventKey>().unwrap(), expected);
        assert_eq!("v3".parse::<EventKey>().unwrap(), expected);
    }

    #[test]
    fn parse_pin_out_of_range() {
        assert_eq!(
            "V300".parse::<EventKey>(),
            Err(ValueError::PinOutOfRange(300))
        );
    }

    #[test]
    fn parse_unknown_name() {
        assert_eq!(
            "reboot".parse::<EventKey>(),
            Err(ValueError::UnknownEvent("reboot".to_string()))
        );
        assert!("V".parse::<EventKey>().is_err());
    }

    #[test]
    fn names_round_trip() {
        for key in [
            EventKey::Connect,
            EventKey::Disconnect,
            EventKey::VirtualPin(VirtualPin::new(42)),
            EventKey::InfoGet,
            EventKey::PropertyGet,
            EventKey::AutomationResponse,
            EventKey::OtaRequest,
        ] {
            assert_eq!(key.name().parse::<EventKey>().unwrap(), key);
            assert_eq!(key.to_string(), key.name());
        }
    }

    #[test]
    fn event_keys() {
        let event = Event::VirtualWrite {
            pin: VirtualPin::new(1),
            value: Value::from(1),
        };
        assert_eq!(event.key(), EventKey::VirtualPin(VirtualPin::new(1)));
        assert_eq!(Event::InfoGet.key(), EventKey::InfoGet);
    }
}
