// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Blynk device client.
//!
//! [`BlynkClient`] owns the session, the transport and the handler registry.
//! It is driven by the application: register handlers, call
//! [`connect`](BlynkClient::connect), then call [`run`](BlynkClient::run)
//! from the main loop.
//!
//! ```text
//! ┌──────────────┐  run()   ┌───────────┐ poll_message ┌───────────┐
//! │  app loop    │ ───────► │BlynkClient│ ───────────► │ Transport │
//! └──────────────┘          └─────┬─────┘              └───────────┘
//!                                 │ topics::decode
//!                                 ▼
//!                          ┌─────────────┐  &mut Link   ┌─────────┐
//!                          │ EventRouter │ ───────────► │ handler │
//!                          └─────────────┘              └─────────┘
//! ```

use std::fmt;
use std::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::command::{Command, DeviceInfoUpdate, Publisher};
use crate::config::{Session, SessionConfig};
use crate::error::{Error, ProtocolError, Result, ValueError};
use crate::event::{Event, EventKey, EventRouter, OtaRequest};
use crate::protocol::{InboundMessage, Transport, topics};
use crate::types::{DeviceInfo, Value, VirtualPin};

/// The connection state shared with event handlers.
///
/// Handlers receive `&mut Link` and publish through its [`Publisher`]
/// implementation. A failed publish closes the link; the client notices
/// once the handler returns and runs the `disconnect` handler.
pub struct Link<T> {
    transport: T,
    connected: bool,
    lost: bool,
    device_info: DeviceInfo,
    last_activity: Instant,
    clock: Box<dyn Clock>,
}

impl<T: Transport> Link<T> {
    fn new(transport: T, device_info: DeviceInfo, clock: Box<dyn Clock>) -> Self {
        let last_activity = clock.now();
        Self {
            transport,
            connected: false,
            lost: false,
            device_info,
            last_activity,
            clock,
        }
    }

    /// Returns `true` while the broker connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns the cached device description.
    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Merges `update` into the cached device description and publishes the
    /// whole cache.
    ///
    /// Passing an empty [`DeviceInfo`] republishes the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::EmptyDeviceInfo`] if no field is known, or any
    /// error of [`Publisher::send`].
    pub fn publish_device_info(&mut self, update: DeviceInfo) -> Result<()> {
        self.device_info.merge(update);
        if self.device_info.is_empty() {
            tracing::warn!("No device info available to publish");
            return Err(ValueError::EmptyDeviceInfo.into());
        }
        let command = DeviceInfoUpdate(self.device_info.clone());
        self.send(&command)
    }

    fn mark_active(&mut self) {
        self.last_activity = self.clock.now();
    }

    /// Closes a failed connection and flags it for the `disconnect` handler.
    fn drop_connection(&mut self, cause: &ProtocolError) {
        tracing::warn!(error = %cause, "Connection lost");
        self.connected = false;
        self.lost = true;
        if let Err(e) = self.transport.disconnect() {
            tracing::debug!(error = %e, "Transport cleanup failed");
        }
    }
}

impl<T: Transport> Publisher for Link<T> {
    fn send<C: Command + ?Sized>(&mut self, command: &C) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let topic = command.topic();
        let payload = command.payload()?;
        tracing::debug!(topic = %topic, payload = %payload.escape_debug(), "Publishing");

        match self.transport.publish(&topic, payload.as_bytes()) {
            Ok(()) => {
                self.mark_active();
                Ok(())
            }
            Err(e) => {
                self.drop_connection(&e);
                Err(e.into())
            }
        }
    }
}

impl<T> fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("connected", &self.connected)
            .field("device_info", &self.device_info)
            .finish_non_exhaustive()
    }
}

/// A Blynk device connected over MQTT.
///
/// # Examples
///
/// ```no_run
/// use blynk_mqtt::{BlynkClient, Publisher, RumqttcTransport, SessionConfig};
/// use blynk_mqtt::types::{DeviceInfo, VirtualPin};
///
/// let session = SessionConfig::new("device-auth-token")
///     .with_device_info(DeviceInfo::new().with_board("RPi").with_firmware_version("0.1.0"))
///     .build()?;
/// let mut client = BlynkClient::new(session, RumqttcTransport::new());
///
/// client.on_connect(|link| {
///     let _ = link.virtual_write(VirtualPin::new(0), "online");
/// });
/// client.on_virtual_write(VirtualPin::new(1), |link, value| {
///     // Echo the switch state to a LED widget
///     let _ = link.virtual_write(VirtualPin::new(2), value.clone());
/// });
///
/// client.connect()?;
/// loop {
///     client.run();
/// }
/// # Ok::<(), blynk_mqtt::Error>(())
/// ```
pub struct BlynkClient<T: Transport> {
    session: Session,
    link: Link<T>,
    router: EventRouter<Link<T>>,
    last_attempt: Option<Instant>,
    suspended: bool,
}

impl<T: Transport> BlynkClient<T> {
    /// Creates a disconnected client.
    #[must_use]
    pub fn new(session: Session, transport: T) -> Self {
        Self::with_clock(session, transport, SystemClock)
    }

    /// Creates a disconnected client reading time from `clock`.
    #[must_use]
    pub fn with_clock(session: Session, transport: T, clock: impl Clock + 'static) -> Self {
        let device_info = session.device_info().clone();
        Self {
            link: Link::new(transport, device_info, Box::new(clock)),
            session,
            router: EventRouter::new(),
            last_attempt: None,
            suspended: true,
        }
    }

    /// Validates `config` and creates a disconnected client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: SessionConfig, transport: T) -> Result<Self> {
        Ok(Self::new(config.build()?, transport))
    }

    /// Returns the session settings.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the connection state.
    #[must_use]
    pub fn link(&self) -> &Link<T> {
        &self.link
    }

    /// Returns `true` while the broker connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link.connected
    }

    /// Returns the cached device description.
    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.link.device_info
    }

    // ========== Handler registration ==========

    /// Registers the handler for `key`, replacing any previous one.
    ///
    /// Returns `true` if a previous handler was replaced.
    pub fn on<F>(&mut self, key: impl Into<EventKey>, handler: F) -> bool
    where
        F: FnMut(&mut Link<T>, &Event) + 'static,
    {
        self.router.on(key.into(), handler)
    }

    /// Registers a handler by event name (`"connect"`, `"V1"`, `"v1"`,
    /// `"info_get"`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownEvent`] for an unknown name and
    /// [`ValueError::PinOutOfRange`] for a pin above `V255`.
    pub fn on_event<F>(&mut self, name: &str, handler: F) -> Result<bool>
    where
        F: FnMut(&mut Link<T>, &Event) + 'static,
    {
        let key = name.parse::<EventKey>()?;
        Ok(self.router.on(key, handler))
    }

    /// Removes the handler for `key`.
    ///
    /// Returns `true` if a handler was registered.
    pub fn off(&mut self, key: impl Into<EventKey>) -> bool {
        self.router.off(key.into())
    }

    /// Runs `handler` after every successful connect.
    pub fn on_connect<F>(&mut self, mut handler: F) -> bool
    where
        F: FnMut(&mut Link<T>) + 'static,
    {
        self.on(EventKey::Connect, move |link, _| handler(link))
    }

    /// Runs `handler` when the connection closes, is lost or cannot be
    /// established.
    pub fn on_disconnect<F>(&mut self, mut handler: F) -> bool
    where
        F: FnMut(&mut Link<T>) + 'static,
    {
        self.on(EventKey::Disconnect, move |link, _| handler(link))
    }

    /// Runs `handler` with every value written to `pin`.
    pub fn on_virtual_write<F>(&mut self, pin: impl Into<VirtualPin>, mut handler: F) -> bool
    where
        F: FnMut(&mut Link<T>, &Value) + 'static,
    {
        self.on(pin.into(), move |link, event| {
            if let Event::VirtualWrite { value, .. } = event {
                handler(link, value);
            }
        })
    }

    /// Answers device info requests.
    ///
    /// Without this handler the client replies with the cached
    /// [`DeviceInfo`].
    pub fn on_info_get<F>(&mut self, mut handler: F) -> bool
    where
        F: FnMut(&mut Link<T>) + 'static,
    {
        self.on(EventKey::InfoGet, move |link, _| handler(link))
    }

    /// Answers widget property requests with `(pin, property)`.
    pub fn on_property_get<F>(&mut self, mut handler: F) -> bool
    where
        F: FnMut(&mut Link<T>, &str, &str) + 'static,
    {
        self.on(EventKey::PropertyGet, move |link, event| {
            if let Event::PropertyGet { pin, property } = event {
                handler(link, pin, property);
            }
        })
    }

    /// Receives automation outcomes as `(automation_id, status, message)`.
    pub fn on_automation_response<F>(&mut self, mut handler: F) -> bool
    where
        F: FnMut(&mut Link<T>, u64, &str, Option<&str>) + 'static,
    {
        self.on(EventKey::AutomationResponse, move |link, event| {
            if let Event::AutomationResponse {
                automation_id,
                status,
                message,
            } = event
            {
                handler(link, *automation_id, status, message.as_deref());
            }
        })
    }

    /// Receives over-the-air update commands.
    pub fn on_ota_request<F>(&mut self, mut handler: F) -> bool
    where
        F: FnMut(&mut Link<T>, &OtaRequest) + 'static,
    {
        self.on(EventKey::OtaRequest, move |link, event| {
            if let Event::OtaRequest(request) = event {
                handler(link, request);
            }
        })
    }

    // ========== Connection lifecycle ==========

    /// Connects to the broker and subscribes to the downlink topics.
    ///
    /// Runs the `connect` handler on success, then publishes the cached
    /// device info if any field is known. On failure the `disconnect`
    /// handler runs and the error is returned. Calling `connect` while
    /// connected does nothing.
    ///
    /// An explicit call re-enables auto-reconnect after
    /// [`disconnect`](Self::disconnect).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the broker cannot be reached or refuses
    /// the session.
    pub fn connect(&mut self) -> Result<()> {
        if self.link.connected {
            tracing::info!("Already connected");
            return Ok(());
        }
        self.suspended = false;
        self.establish()
    }

    /// Closes the connection and runs the `disconnect` handler.
    ///
    /// Auto-reconnect stays off until the next [`connect`](Self::connect).
    pub fn disconnect(&mut self) {
        self.suspended = true;
        if !self.link.connected {
            tracing::debug!("Already disconnected");
            return;
        }

        if let Err(e) = self.link.transport.disconnect() {
            tracing::warn!(error = %e, "Transport disconnect failed");
        }
        self.link.connected = false;
        self.link.lost = false;
        tracing::info!("Disconnected from Blynk");
        self.dispatch(&Event::Disconnected);
        self.settle();
    }

    /// Services the connection once.
    ///
    /// While connected, waits at most the session's poll timeout for one
    /// incoming message, dispatches it, and pings the broker when the
    /// keep-alive interval has passed without traffic. While disconnected
    /// with auto-reconnect on, makes one connect attempt once the reconnect
    /// delay has passed since the previous attempt or the connection loss.
    ///
    /// Transport failures are logged and turn into the disconnected state.
    pub fn run(&mut self) {
        if self.link.connected {
            self.service();
        } else if self.reconnect_due() {
            tracing::info!(
                delay_secs = self.session.reconnect_delay().as_secs(),
                "Reconnecting"
            );
            // The error is logged and reported to the disconnect handler.
            let _ = self.establish();
        }
    }

    fn reconnect_due(&self) -> bool {
        if self.suspended || !self.session.auto_reconnect() {
            return false;
        }
        let now = self.link.clock.now();
        self.last_attempt
            .is_none_or(|at| now.duration_since(at) >= self.session.reconnect_delay())
    }

    fn establish(&mut self) -> Result<()> {
        self.last_attempt = Some(self.link.clock.now());
        self.link.lost = false;

        tracing::info!(
            server = %self.session.server(),
            port = self.session.port(),
            "Connecting to Blynk"
        );

        if let Err(e) = self.open_session() {
            tracing::warn!(error = %e, "Connection to Blynk failed");
            self.link.connected = false;
            self.dispatch(&Event::Disconnected);
            return Err(e.into());
        }

        self.link.connected = true;
        self.link.mark_active();
        tracing::info!(client_id = %self.session.client_id(), "Connected to Blynk");

        self.dispatch(&Event::Connected);
        if self.link.connected
            && !self.link.device_info.is_empty()
            && let Err(e) = self.link.publish_device_info(DeviceInfo::new())
        {
            tracing::warn!(error = %e, "Failed to publish device info");
        }
        self.settle();
        Ok(())
    }

    fn open_session(&mut self) -> std::result::Result<(), ProtocolError> {
        self.link.transport.connect(&self.session)?;
        for filter in topics::subscriptions() {
            if let Err(e) = self.link.transport.subscribe(filter) {
                if let Err(cleanup) = self.link.transport.disconnect() {
                    tracing::debug!(error = %cleanup, "Transport cleanup failed");
                }
                return Err(e);
            }
            tracing::debug!(filter, "Subscribed");
        }
        Ok(())
    }

    fn service(&mut self) {
        match self.link.transport.poll_message(self.session.poll_timeout()) {
            Ok(Some(message)) => {
                self.link.mark_active();
                self.handle_message(&message);
            }
            Ok(None) => {}
            Err(e) => self.link.drop_connection(&e),
        }

        let keep_alive = self.session.keep_alive();
        let idle = self.link.clock.now().duration_since(self.link.last_activity);
        if self.link.connected && !keep_alive.is_zero() && idle >= keep_alive {
            tracing::trace!("Sending keep-alive ping");
            match self.link.transport.ping() {
                Ok(()) => self.link.mark_active(),
                Err(e) => self.link.drop_connection(&e),
            }
        }

        self.settle();
    }

    fn handle_message(&mut self, message: &InboundMessage) {
        tracing::debug!(topic = %message.topic, "Received downlink message");
        match topics::decode(&message.topic, &message.payload) {
            Ok(event) => self.dispatch(&event),
            Err(e) => {
                tracing::warn!(topic = %message.topic, error = %e, "Ignoring downlink message");
            }
        }
    }

    fn dispatch(&mut self, event: &Event) {
        let handled = self.router.dispatch(&mut self.link, event);
        if !handled && matches!(event, Event::InfoGet) && self.link.connected {
            tracing::debug!("Answering info_get with cached device info");
            if let Err(e) = self.link.publish_device_info(DeviceInfo::new()) {
                tracing::warn!(error = %e, "Failed to answer info_get");
            }
        }
    }

    /// Reports a connection dropped by a publish or poll failure.
    fn settle(&mut self) {
        if !self.link.lost {
            return;
        }
        self.link.lost = false;
        self.last_attempt = Some(self.link.clock.now());
        self.dispatch(&Event::Disconnected);
    }

    // ========== Uplink ==========

    /// Merges `update` into the cached device description and publishes it.
    ///
    /// # Errors
    ///
    /// See [`Link::publish_device_info`].
    pub fn publish_device_info(&mut self, update: DeviceInfo) -> Result<()> {
        let result = self.link.publish_device_info(update);
        self.settle();
        result
    }
}

impl<T: Transport> Publisher for BlynkClient<T> {
    fn send<C: Command + ?Sized>(&mut self, command: &C) -> Result<()> {
        let result = self.link.send(command);
        self.settle();
        result
    }
}

impl<T: Transport> fmt::Debug for BlynkClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlynkClient")
            .field("session", &self.session)
            .field("link", &self.link)
            .field("router", &self.router)
            .field("suspended", &self.suspended)
            .finish_non_exhaustive()
    }
}
