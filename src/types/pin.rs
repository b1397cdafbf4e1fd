// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Virtual pin addressing.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// A Blynk virtual pin (`V0` to `V255`).
///
/// Virtual pins are the named data channels the Blynk app and the device
/// exchange values over. The pin number is stored as a `u8`, so every value
/// of this type is in range.
///
/// # Examples
///
/// ```
/// use blynk_mqtt::types::VirtualPin;
///
/// let pin = VirtualPin::new(5);
/// assert_eq!(pin.number(), 5);
/// assert_eq!(pin.to_string(), "V5");
///
/// // Designators are case-insensitive and the `V` prefix is optional
/// assert_eq!("v5".parse::<VirtualPin>().unwrap(), pin);
/// assert_eq!("5".parse::<VirtualPin>().unwrap(), pin);
///
/// // Out of range or malformed designators are rejected
/// assert!("V256".parse::<VirtualPin>().is_err());
/// assert!("D5".parse::<VirtualPin>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPin(u8);

impl VirtualPin {
    /// Creates a virtual pin from its number.
    #[must_use]
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// Returns the pin number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for VirtualPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

impl From<u8> for VirtualPin {
    fn from(number: u8) -> Self {
        Self(number)
    }
}

impl FromStr for VirtualPin {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('V')
            .or_else(|| s.strip_prefix('v'))
            .unwrap_or(s);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValueError::InvalidPin(s.to_string()));
        }

        let number: u32 = digits
            .parse()
            .map_err(|_| ValueError::InvalidPin(s.to_string()))?;
        u8::try_from(number)
            .map(Self)
            .map_err(|_| ValueError::PinOutOfRange(number))
    }
}
