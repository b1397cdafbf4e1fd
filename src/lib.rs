// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `blynk_mqtt` - A device-side Rust SDK for the Blynk IoT cloud.
//!
//! The SDK keeps a device connected to the Blynk MQTT broker and routes the
//! messages the cloud sends (virtual pin writes, info and property requests,
//! automation outcomes, OTA commands) to application handlers.
//!
//! # Supported Features
//!
//! - **Connection management**: connect, disconnect, keep-alive and
//!   automatic reconnection with a fixed delay
//! - **Event routing**: one handler per event, registered by key or by name
//! - **Datastreams**: typed virtual pin values, single or multi-value
//! - **Uplink**: notifications, timeline events, widget properties, bridge
//!   writes, location, metadata, automations, device logs, OTA status
//!
//! # Execution Model
//!
//! Everything runs on the caller's thread. [`BlynkClient::run`] is the only
//! place that waits on the network, bounded by the session's poll timeout.
//! Handlers run inside `run` and receive a [`Link`] to publish replies.
//!
//! # Quick Start
//!
//! ```no_run
//! use blynk_mqtt::{BlynkClient, Publisher, RumqttcTransport, SessionConfig};
//! use blynk_mqtt::types::{DeviceInfo, VirtualPin};
//!
//! fn main() -> blynk_mqtt::Result<()> {
//!     let session = SessionConfig::new("YOUR_AUTH_TOKEN")
//!         .with_device_info(DeviceInfo::new().with_board("ESP32").with_firmware_version("1.0.0"))
//!         .build()?;
//!     let mut client = BlynkClient::new(session, RumqttcTransport::new());
//!
//!     client.on_virtual_write(VirtualPin::new(1), |link, value| {
//!         let on = value.as_bool().unwrap_or(false);
//!         let _ = link.virtual_write(VirtualPin::new(2), on);
//!     });
//!
//!     client.connect()?;
//!     loop {
//!         client.run();
//!     }
//! }
//! ```
//!
//! ## Handlers by Name
//!
//! ```
//! use blynk_mqtt::{BlynkClient, SessionConfig};
//! use blynk_mqtt::event::Event;
//! # use blynk_mqtt::protocol::{InboundMessage, Transport};
//! # use blynk_mqtt::{ProtocolError, Session};
//! # use std::time::Duration;
//! # struct Offline;
//! # impl Transport for Offline {
//! #     fn connect(&mut self, _: &Session) -> Result<(), ProtocolError> { Ok(()) }
//! #     fn subscribe(&mut self, _: &str) -> Result<(), ProtocolError> { Ok(()) }
//! #     fn publish(&mut self, _: &str, _: &[u8]) -> Result<(), ProtocolError> { Ok(()) }
//! #     fn poll_message(&mut self, _: Duration) -> Result<Option<InboundMessage>, ProtocolError> { Ok(None) }
//! #     fn disconnect(&mut self) -> Result<(), ProtocolError> { Ok(()) }
//! # }
//!
//! let session = SessionConfig::new("YOUR_AUTH_TOKEN").build()?;
//! let mut client = BlynkClient::new(session, Offline);
//!
//! client.on_event("v3", |_link, event| {
//!     if let Event::VirtualWrite { value, .. } = event {
//!         println!("slider at {value}");
//!     }
//! })?;
//!
//! assert!(client.on_event("reboot", |_, _| {}).is_err());
//! # Ok::<(), blynk_mqtt::Error>(())
//! ```

mod client;
mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod protocol;
pub mod types;

pub use client::{BlynkClient, Link};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, Publisher};
pub use config::{Session, SessionConfig};
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{Event, EventKey, EventRouter};
#[cfg(feature = "mqtt")]
pub use protocol::RumqttcTransport;
pub use protocol::{InboundMessage, Transport};
pub use types::{DeviceInfo, LogLevel, Value, VirtualPin};
