// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration.
//!
//! A [`SessionConfig`] is what the application provides: the auth token and
//! any overrides. [`SessionConfig::build`] validates it and resolves the
//! defaults into a [`Session`], which is what the connection manager and the
//! transport work with.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use blynk_mqtt::SessionConfig;
//!
//! let session = SessionConfig::new("my-auth-token")
//!     .with_tls(true)
//!     .with_reconnect_delay(Duration::from_secs(5))
//!     .build()?;
//!
//! assert_eq!(session.port(), 8883);
//! assert_eq!(session.username(), "my-auth-token");
//! assert!(session.client_id().starts_with("blynk_"));
//! # Ok::<(), blynk_mqtt::Error>(())
//! ```
//!
//! Configuration can also be loaded from JSON; durations are given in
//! seconds, except `poll_timeout_ms`:
//!
//! ```
//! use blynk_mqtt::SessionConfig;
//!
//! let config = SessionConfig::from_json(r#"{
//!     "auth_token": "my-auth-token",
//!     "server": "ny3.blynk.cloud",
//!     "reconnect_delay_secs": 3,
//!     "device_info": { "board": "ESP32" }
//! }"#)?;
//!
//! assert_eq!(config.server, "ny3.blynk.cloud");
//! # Ok::<(), blynk_mqtt::Error>(())
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result, ValueError};
use crate::types::DeviceInfo;

/// Default Blynk MQTT broker host.
pub const DEFAULT_SERVER: &str = "broker.blynk.cc";

/// Default port for plain TCP connections.
pub const DEFAULT_PORT_TCP: u16 = 1883;

/// Default port for TLS connections.
pub const DEFAULT_PORT_TLS: u16 = 8883;

/// Shortest non-zero keep-alive the MQTT client accepts.
const MIN_KEEP_ALIVE: Duration = Duration::from_secs(1);

/// MQTT encodes the keep-alive as a 16-bit number of seconds.
const MAX_KEEP_ALIVE: Duration = Duration::from_secs(65_535);

/// Prefix of generated client identifiers.
const CLIENT_ID_PREFIX: &str = "blynk_";

/// User-provided session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Device auth token. Required.
    pub auth_token: String,
    /// Broker host.
    pub server: String,
    /// Broker port. Defaults to 1883, or 8883 with TLS.
    pub port: Option<u16>,
    /// MQTT client identifier. Generated when absent.
    pub client_id: Option<String>,
    /// MQTT username. Defaults to the auth token.
    pub username: Option<String>,
    /// MQTT password.
    pub password: String,
    /// Whether to connect over TLS.
    pub tls: bool,
    /// MQTT keep-alive interval.
    #[serde(rename = "keep_alive_secs", with = "secs")]
    pub keep_alive: Duration,
    /// MQTT clean-session flag.
    pub clean_session: bool,
    /// Whether `run` re-attempts lost connections.
    pub auto_reconnect: bool,
    /// Minimum time between reconnect attempts.
    #[serde(rename = "reconnect_delay_secs", with = "secs")]
    pub reconnect_delay: Duration,
    /// Upper bound on how long one `run` call waits for a message.
    #[serde(rename = "poll_timeout_ms", with = "millis")]
    pub poll_timeout: Duration,
    /// Upper bound on waiting for the broker's connect acknowledgment.
    #[serde(rename = "connect_timeout_secs", with = "secs")]
    pub connect_timeout: Duration,
    /// Device description published after connecting.
    pub device_info: DeviceInfo,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_token: String::new(),
            server: DEFAULT_SERVER.to_string(),
            port: None,
            client_id: None,
            username: None,
            password: String::new(),
            tls: false,
            keep_alive: Duration::from_secs(60),
            clean_session: true,
            auto_reconnect: true,
            reconnect_delay: Duration::from_secs(10),
            poll_timeout: Duration::from_millis(10),
            connect_timeout: Duration::from_secs(10),
            device_info: DeviceInfo::default(),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with the given auth token and defaults.
    #[must_use]
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(ParseError::from)
            .map_err(Into::into)
    }

    /// Sets the broker host.
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Sets the broker port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the MQTT client identifier.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets MQTT credentials instead of the auth-token default.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = password.into();
        self
    }

    /// Enables or disables TLS.
    #[must_use]
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets the clean-session flag.
    #[must_use]
    pub fn with_clean_session(mut self, clean_session: bool) -> Self {
        self.clean_session = clean_session;
        self
    }

    /// Enables or disables automatic reconnection.
    #[must_use]
    pub fn with_auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = auto_reconnect;
        self
    }

    /// Sets the delay between reconnect attempts.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets how long one `run` call may wait for a message.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Sets how long to wait for the broker's connect acknowledgment.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the device description published after connecting.
    #[must_use]
    pub fn with_device_info(mut self, device_info: DeviceInfo) -> Self {
        self.device_info = device_info;
        self
    }

    /// Validates the configuration and resolves defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::MissingAuthToken`] if the auth token is empty
    /// and [`ValueError::InvalidKeepAlive`] if the keep-alive is not zero
    /// and outside 1 to 65535 seconds.
    pub fn build(self) -> Result<Session> {
        if self.auth_token.trim().is_empty() {
            return Err(ValueError::MissingAuthToken.into());
        }
        let keep_alive = self.keep_alive;
        if !keep_alive.is_zero() && !(MIN_KEEP_ALIVE..=MAX_KEEP_ALIVE).contains(&keep_alive) {
            let millis = u64::try_from(keep_alive.as_millis()).unwrap_or(u64::MAX);
            return Err(ValueError::InvalidKeepAlive(millis).into());
        }

        let port = self.port.unwrap_or(if self.tls {
            DEFAULT_PORT_TLS
        } else {
            DEFAULT_PORT_TCP
        });
        let client_id = self.client_id.unwrap_or_else(generate_client_id);
        let username = self.username.unwrap_or_else(|| self.auth_token.clone());

        Ok(Session {
            auth_token: self.auth_token,
            server: self.server,
            port,
            client_id,
            username,
            password: self.password,
            tls: self.tls,
            keep_alive: self.keep_alive,
            clean_session: self.clean_session,
            auto_reconnect: self.auto_reconnect,
            reconnect_delay: self.reconnect_delay,
            poll_timeout: self.poll_timeout,
            connect_timeout: self.connect_timeout,
            device_info: self.device_info,
        })
    }
}

/// Generates a short random client identifier.
fn generate_client_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{CLIENT_ID_PREFIX}{}", &id[..8])
}

/// A validated session with every default resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    auth_token: String,
    server: String,
    port: u16,
    client_id: String,
    username: String,
    password: String,
    tls: bool,
    keep_alive: Duration,
    clean_session: bool,
    auto_reconnect: bool,
    reconnect_delay: Duration,
    poll_timeout: Duration,
    connect_timeout: Duration,
    device_info: DeviceInfo,
}

impl Session {
    /// Returns the device auth token.
    #[must_use]
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Returns the broker host.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the MQTT client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the MQTT username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the MQTT password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns whether the connection uses TLS.
    #[must_use]
    pub fn tls(&self) -> bool {
        self.tls
    }

    /// Returns the keep-alive interval.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Returns the clean-session flag.
    #[must_use]
    pub fn clean_session(&self) -> bool {
        self.clean_session
    }

    /// Returns whether lost connections are re-attempted.
    #[must_use]
    pub fn auto_reconnect(&self) -> bool {
        self.auto_reconnect
    }

    /// Returns the delay between reconnect attempts.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Returns the per-`run` wait bound.
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Returns the connect acknowledgment wait bound.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the configured device description.
    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }
}

/// Serializes a [`Duration`] as whole seconds.
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Serializes a [`Duration`] as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let session = SessionConfig::new("token").build().unwrap();

        assert_eq!(session.server(), DEFAULT_SERVER);
        assert_eq!(session.port(), DEFAULT_PORT_TCP);
        assert_eq!(session.username(), "token");
        assert_eq!(session.password(), "");
        assert_eq!(session.keep_alive(), Duration::from_secs(60));
        assert!(session.clean_session());
        assert!(session.auto_reconnect());
        assert_eq!(session.reconnect_delay(), Duration::from_secs(10));
        assert!(!session.tls());
    }

    #[test]
    fn tls_default_port() {
        let session = SessionConfig::new("token").with_tls(true).build().unwrap();
        assert_eq!(session.port(), DEFAULT_PORT_TLS);
    }

    #[test]
    fn explicit_port_wins_over_tls_default() {
        let session = SessionConfig::new("token")
            .with_tls(true)
            .with_port(9443)
            .build()
            .unwrap();
        assert_eq!(session.port(), 9443);
    }

    #[test]
    fn missing_token_rejected() {
        let err = SessionConfig::new("  ").build().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Value(ValueError::MissingAuthToken)
        ));
    }

    #[test]
    fn keep_alive_bounds() {
        for keep_alive in [Duration::ZERO, Duration::from_secs(1), Duration::from_secs(65_535)] {
            let session = SessionConfig::new("token")
                .with_keep_alive(keep_alive)
                .build()
                .unwrap();
            assert_eq!(session.keep_alive(), keep_alive);
        }

        let err = SessionConfig::new("token")
            .with_keep_alive(Duration::from_millis(500))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Value(ValueError::InvalidKeepAlive(500))
        ));

        let err = SessionConfig::new("token")
            .with_keep_alive(Duration::from_secs(65_536))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Value(ValueError::InvalidKeepAlive(65_536_000))
        ));
    }

    #[test]
    fn generated_client_id() {
        let session = SessionConfig::new("token").build().unwrap();
        let id = session.client_id();
        assert!(id.starts_with(CLIENT_ID_PREFIX));
        assert_eq!(id.len(), CLIENT_ID_PREFIX.len() + 8);
        assert!(id[CLIENT_ID_PREFIX.len()..].bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn explicit_client_id_and_credentials() {
        let session = SessionConfig::new("token")
            .with_client_id("kitchen")
            .with_credentials("device", "secret")
            .build()
            .unwrap();
        assert_eq!(session.client_id(), "kitchen");
        assert_eq!(session.username(), "device");
        assert_eq!(session.password(), "secret");
    }

    #[test]
    fn from_json_partial() {
        let config = SessionConfig::from_json(
            r#"{"auth_token":"abc","keep_alive_secs":30,"poll_timeout_ms":25,"auto_reconnect":false}"#,
        )
        .unwrap();

        assert_eq!(config.auth_token, "abc");
        assert_eq!(config.keep_alive, Duration::from_secs(30));
        assert_eq!(config.poll_timeout, Duration::from_millis(25));
        assert!(!config.auto_reconnect);
        assert_eq!(config.server, DEFAULT_SERVER);
    }

    #[test]
    fn from_json_malformed() {
        let err = SessionConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::Error::Parse(ParseError::Json(_))));
    }

    #[test]
    fn json_round_trip_uses_renamed_keys() {
        let json = serde_json::to_value(SessionConfig::new("abc")).unwrap();
        assert_eq!(json["reconnect_delay_secs"], 10);
        assert_eq!(json["poll_timeout_ms"], 10);
    }
}
