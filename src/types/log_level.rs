// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Severity levels for device logs sent to the Blynk console.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Severity of a device log entry.
///
/// # Examples
///
/// ```
/// use blynk_mqtt::types::LogLevel;
///
/// assert_eq!(LogLevel::Warn.as_str(), "warn");
/// assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
/// assert!("fatal".parse::<LogLevel>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Finest-grained tracing output.
    Trace,
    /// Debugging output.
    Debug,
    /// Informational messages.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// A failure.
    Error,
}

impl LogLevel {
    /// Returns the level name used in the log topic.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ValueError::InvalidLogLevel(s.to_string())),
        }
    }
}
