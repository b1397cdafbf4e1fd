// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Transport`] implementation over the `rumqttc` blocking client.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rumqttc::{
    Client, ClientError, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet, QoS,
    RecvTimeoutError, Transport as MqttTransport,
};

use crate::config::Session;
use crate::error::ProtocolError;
use crate::protocol::{InboundMessage, Transport};

/// Capacity of the request queue between the client handle and its
/// connection.
const REQUEST_CAPACITY: usize = 64;

/// How long a request waits for room in a full request queue.
const QUEUE_WAIT: Duration = Duration::from_secs(5);

/// How long [`RumqttcTransport::disconnect`] keeps driving the connection so
/// the DISCONNECT packet reaches the broker.
const DISCONNECT_GRACE: Duration = Duration::from_millis(500);

/// MQTT transport backed by `rumqttc`.
///
/// The network is only driven while the SDK calls into the transport:
/// [`connect`](Transport::connect) waits for the CONNACK and
/// [`poll_message`](Transport::poll_message) runs the event loop, which also
/// sends keep-alive pings on its own. When the request queue is full, a
/// publish drives the connection until the queue has room again.
///
/// # Examples
///
/// ```no_run
/// use blynk_mqtt::{BlynkClient, RumqttcTransport, SessionConfig};
///
/// let session = SessionConfig::new("device-auth-token").build()?;
/// let mut client = BlynkClient::new(session, RumqttcTransport::new());
/// client.connect()?;
/// # Ok::<(), blynk_mqtt::Error>(())
/// ```
#[derive(Default)]
pub struct RumqttcTransport {
    link: Option<(Client, Connection)>,
    pending: VecDeque<InboundMessage>,
}

impl RumqttcTransport {
    /// Creates a transport with no open connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> Result<&Client, ProtocolError> {
        self.link
            .as_ref()
            .map(|(client, _)| client)
            .ok_or(ProtocolError::NotConnected)
    }

    /// Drives the connection for at most `timeout` and returns the next
    /// event, or `None` if nothing happened in time.
    ///
    /// A broker DISCONNECT or a connection error closes the link.
    fn drive(&mut self, timeout: Duration) -> Result<Option<Event>, ProtocolError> {
        let Some((_, connection)) = self.link.as_mut() else {
            return Err(ProtocolError::NotConnected);
        };

        match connection.recv_timeout(timeout) {
            Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                self.close();
                Err(ProtocolError::ConnectionFailed(
                    "broker closed the session".to_string(),
                ))
            }
            Ok(Ok(event)) => Ok(Some(event)),
            Ok(Err(e)) => {
                self.close();
                Err(ProtocolError::Connection(e))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                self.close();
                Err(ProtocolError::ChannelClosed(
                    "MQTT event loop stopped".to_string(),
                ))
            }
        }
    }

    /// Queues a request on the client, driving the connection while the
    /// request queue is full.
    ///
    /// Messages received meanwhile are kept for [`Transport::poll_message`].
    fn submit<F>(&mut self, mut request: F) -> Result<(), ProtocolError>
    where
        F: FnMut(&Client) -> Result<(), ClientError>,
    {
        let deadline = Instant::now() + QUEUE_WAIT;
        loop {
            match request(self.client()?) {
                Ok(()) => return Ok(()),
                Err(ClientError::TryRequest(_)) => {}
                Err(e) => return Err(e.into()),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ProtocolError::Timeout(as_millis(QUEUE_WAIT)));
            }

            tracing::trace!("MQTT request queue full, driving connection");
            match self.drive(remaining)? {
                Some(Event::Incoming(Packet::Publish(publish))) => {
                    tracing::trace!(topic = %publish.topic, "Buffered MQTT message");
                    self.pending
                        .push_back(InboundMessage::new(publish.topic, publish.payload.to_vec()));
                }
                Some(event) => tracing::trace!(?event, "MQTT event"),
                None => {}
            }
        }
    }

    fn close(&mut self) {
        self.link = None;
        self.pending.clear();
    }
}

impl std::fmt::Debug for RumqttcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RumqttcTransport")
            .field("open", &self.link.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Translates session settings into `rumqttc` options.
fn mqtt_options(session: &Session) -> MqttOptions {
    let mut options = MqttOptions::new(session.client_id(), session.server(), session.port());
    options
        .set_keep_alive(session.keep_alive())
        .set_clean_session(session.clean_session())
        .set_credentials(session.username(), session.password());
    if session.tls() {
        options.set_transport(MqttTransport::tls_with_default_config());
    }
    options
}

/// Converts a duration to whole milliseconds for error reporting.
fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Transport for RumqttcTransport {
    fn connect(&mut self, session: &Session) -> Result<(), ProtocolError> {
        self.close();

        let timeout = session.connect_timeout();
        let (client, mut connection) = Client::new(mqtt_options(session), REQUEST_CAPACITY);
        let deadline = Instant::now() + timeout;

        tracing::debug!(
            server = %session.server(),
            port = session.port(),
            client_id = %session.client_id(),
            "Opening MQTT connection"
        );

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ProtocolError::Timeout(as_millis(timeout)));
            }

            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(ProtocolError::ConnectionRefused(format!("{:?}", ack.code)));
                    }
                    tracing::debug!(session_present = ack.session_present, "MQTT connected");
                    self.link = Some((client, connection));
                    return Ok(());
                }
                Ok(Ok(_)) => {}
                Ok(Err(rumqttc::ConnectionError::ConnectionRefused(code))) => {
                    return Err(ProtocolError::ConnectionRefused(format!("{code:?}")));
                }
                Ok(Err(e)) => return Err(ProtocolError::Connection(e)),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(ProtocolError::Timeout(as_millis(timeout)));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ProtocolError::ChannelClosed(
                        "MQTT event loop stopped".to_string(),
                    ));
                }
            }
        }
    }

    fn subscribe(&mut self, filter: &str) -> Result<(), ProtocolError> {
        self.submit(|client| client.try_subscribe(filter, QoS::AtMostOnce))
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), ProtocolError> {
        self.submit(|client| client.try_publish(topic, QoS::AtMostOnce, false, payload.to_vec()))
    }

    fn poll_message(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, ProtocolError> {
        if let Some(message) = self.pending.pop_front() {
            return Ok(Some(message));
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.drive(remaining)? {
                Some(Event::Incoming(Packet::Publish(publish))) => {
                    tracing::trace!(topic = %publish.topic, "Received MQTT message");
                    return Ok(Some(InboundMessage::new(
                        publish.topic,
                        publish.payload.to_vec(),
                    )));
                }
                Some(event) => {
                    tracing::trace!(?event, "MQTT event");
                    if remaining.is_zero() {
                        return Ok(None);
                    }
                }
                None => return Ok(None),
            }
        }
    }

    fn disconnect(&mut self) -> Result<(), ProtocolError> {
        if self.link.is_none() {
            return Ok(());
        }

        let queued = self.submit(|client| client.try_disconnect());
        self.pending.clear();
        let Some((_, mut connection)) = self.link.take() else {
            return queued;
        };
        queued?;

        let deadline = Instant::now() + DISCONNECT_GRACE;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!("MQTT disconnect not confirmed before grace period");
                return Ok(());
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) | Ok(Err(_)) | Err(_) => {
                    return Ok(());
                }
                Ok(Ok(_)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    #[test]
    fn options_from_session() {
        let session = SessionConfig::new("token-123")
            .with_server("broker.local")
            .with_client_id("blynk_test")
            .with_keep_alive(Duration::from_secs(45))
            .build()
            .unwrap();

        let options = mqtt_options(&session);

        assert_eq!(options.client_id(), "blynk_test");
        assert_eq!(options.broker_address(), ("broker.local".to_string(), 1883));
        assert_eq!(options.keep_alive(), Duration::from_secs(45));
        assert!(options.clean_session());
    }

    #[test]
    fn operations_require_connection() {
        let mut transport = RumqttcTransport::new();

        assert!(matches!(
            transport.publish("ds/V1", b"1"),
            Err(ProtocolError::NotConnected)
        ));
        assert!(matches!(
            transport.subscribe("downlink/ds/+"),
            Err(ProtocolError::NotConnected)
        ));
        assert!(matches!(
            transport.poll_message(Duration::from_millis(1)),
            Err(ProtocolError::NotConnected)
        ));
        assert!(transport.disconnect().is_ok());
    }
}
