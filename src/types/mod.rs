// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types exchanged with the Blynk cloud.
//!
//! # Types
//!
//! - [`VirtualPin`] - Virtual pin address (`V0`-`V255`)
//! - [`Value`] - Text, number or multi-value datastream payload
//! - [`LogLevel`] - Severity of a device log entry
//! - [`DeviceInfo`] - Board, firmware and application identification

mod device_info;
mod log_level;
mod pin;
mod value;

pub use device_info::DeviceInfo;
pub use log_level::LogLevel;
pub use pin::VirtualPin;
pub use value::{VALUE_SEPARATOR, Value};
