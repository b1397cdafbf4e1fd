// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Blynk MQTT SDK.
//!
//! This module provides the error hierarchy used across the crate: value
//! validation, transport communication, downlink payload parsing, and the
//! connection state.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred in the MQTT transport.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a payload or configuration.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The session is not connected to the broker.
    #[error("not connected to the Blynk broker")]
    NotConnected,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A virtual pin designator could not be parsed.
    #[error("invalid virtual pin: {0}")]
    InvalidPin(String),

    /// A virtual pin number is outside the range [0, 255].
    #[error("virtual pin {0} is out of range [0, 255]")]
    PinOutOfRange(u32),

    /// A device log level is not one of trace, debug, info, warn, error.
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    /// An event name does not match any known event.
    #[error("unknown event name: {0}")]
    UnknownEvent(String),

    /// The session has no auth token.
    #[error("auth token is required")]
    MissingAuthToken,

    /// The keep-alive interval is neither zero nor between 1 and 65535
    /// seconds.
    #[error("keep-alive of {0} ms must be 0 or between 1 s and 65535 s")]
    InvalidKeepAlive(u64),

    /// Device info was requested to be published but no field is known.
    #[error("no device info (board, firmware version, app name) to publish")]
    EmptyDeviceInfo,
}

/// Errors raised by the MQTT transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The MQTT client rejected a request.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The MQTT connection failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// The broker refused the connection.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The broker did not acknowledge the connection in time.
    #[error("connection timed out after {0} ms")]
    Timeout(u64),

    /// The transport has no open connection.
    #[error("transport is not connected")]
    NotConnected,

    /// The transport's internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to parsing downlink messages and configuration.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A topic or payload is not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The topic does not match any downlink route.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
