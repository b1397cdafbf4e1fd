// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport abstraction and the Blynk topic layout.
//!
//! The SDK does not implement MQTT. It drives an external client through the
//! [`Transport`] trait:
//!
//! - [`RumqttcTransport`]: the default implementation over `rumqttc`
//!   (feature `mqtt`)
//! - [`topics`]: the fixed mapping between Blynk topics and events

#[cfg(feature = "mqtt")]
mod mqtt;
pub mod topics;

#[cfg(feature = "mqtt")]
pub use mqtt::RumqttcTransport;

use std::time::Duration;

use crate::config::Session;
use crate::error::ProtocolError;

/// A message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// The topic the message was published on.
    pub topic: String,
    /// The raw payload.
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Creates a message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// The primitives the SDK needs from an MQTT client.
///
/// All operations use QoS 0. Implementations may block, but
/// [`Transport::poll_message`] must return within the given timeout.
pub trait Transport {
    /// Opens a connection and waits for the broker's acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the broker is unreachable, refuses the
    /// credentials or does not answer in time.
    fn connect(&mut self, session: &Session) -> Result<(), ProtocolError>;

    /// Subscribes to a topic filter.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request cannot be sent.
    fn subscribe(&mut self, filter: &str) -> Result<(), ProtocolError>;

    /// Publishes a message.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the message cannot be sent.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), ProtocolError>;

    /// Processes pending network traffic and returns the next received
    /// message, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the connection failed.
    fn poll_message(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, ProtocolError>;

    /// Sends a keep-alive ping.
    ///
    /// The default does nothing, for clients that keep the session alive on
    /// their own while being polled.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the ping cannot be sent.
    fn ping(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the disconnect request fails. The
    /// connection is considered closed either way.
    fn disconnect(&mut self) -> Result<(), ProtocolError>;
}
