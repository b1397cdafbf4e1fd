// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Datastream values and their text encoding.
//!
//! Blynk datastream payloads are UTF-8 text. A payload carrying several
//! values separates them with a NUL (`'\0'`) character. [`Value`] is the
//! tagged form of such a payload, decided once when the payload is parsed.

use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Separator between the values of a multi-value payload.
pub const VALUE_SEPARATOR: char = '\0';

/// A value written to or received from a datastream.
///
/// # Examples
///
/// ```
/// use blynk_mqtt::types::Value;
///
/// assert_eq!(Value::from_payload("42"), Value::Number(42.0));
/// assert_eq!(Value::from_payload("on"), Value::Text("on".to_string()));
///
/// let rgb = Value::from_payload("255\u{0}128\u{0}0");
/// assert_eq!(rgb.values().len(), 3);
/// assert_eq!(rgb.values()[1].as_i64(), Some(128));
///
/// // Encoding joins lists with NUL and drops a trailing `.0`
/// assert_eq!(Value::from(vec![1, 2]).encode(), "1\u{0}2");
/// assert_eq!(Value::from(2.5).encode(), "2.5");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A text value.
    Text(String),
    /// A finite numeric value.
    Number(f64),
    /// Several values sent together (e.g. RGB components, a joystick).
    List(Vec<Value>),
}

impl Value {
    /// Parses a raw payload.
    ///
    /// A payload without separators is a scalar; otherwise each part
    /// becomes an element of a [`Value::List`].
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        if payload.contains(VALUE_SEPARATOR) {
            Self::List(payload.split(VALUE_SEPARATOR).map(Self::scalar).collect())
        } else {
            Self::scalar(payload)
        }
    }

    /// Parses a single payload part, preferring a number when the text is
    /// a finite numeric literal.
    #[must_use]
    pub fn scalar(part: &str) -> Self {
        match part.parse::<f64>() {
            Ok(number) if number.is_finite() => Self::Number(number),
            _ => Self::Text(part.to_string()),
        }
    }

    /// Encodes the value as a payload.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => format_number(*number),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(Self::encode).collect();
                parts.join(&VALUE_SEPARATOR.to_string())
            }
        }
    }

    /// Returns the scalar values: the list elements, or the value itself.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        match self {
            Self::List(items) => items,
            scalar => std::slice::from_ref(scalar),
        }
    }

    /// Returns the first scalar, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        self.values().first()
    }

    /// Returns `true` for a [`Value::List`].
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the text of a [`Value::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the number of a [`Value::Number`].
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the number as an integer when it has no fractional part.
    #[must_use]
    // Safe: the range check keeps the cast lossless
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn as_i64(&self) -> Option<i64> {
        let number = self.as_f64()?;
        if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
            Some(number as i64)
        } else {
            None
        }
    }

    /// Interprets the value as a switch state (`1`/`0`, `on`/`off`,
    /// `true`/`false`).
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Number(number) if *number == 1.0 => Some(true),
            Self::Number(number) if *number == 0.0 => Some(false),
            Self::Text(text) => match text.to_ascii_lowercase().as_str() {
                "on" | "true" => Some(true),
                "off" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Formats a number without a trailing `.0` for whole values.
// Safe: whole numbers below 2^53 convert exactly
#[allow(clippy::cast_possible_truncation)]
fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => f.write_str(&format_number(*number)),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Serializes to JSON: text as a string, numbers as integers when whole,
/// lists as arrays.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(_) => match self.as_i64() {
                Some(integer) => serializer.serialize_i64(integer),
                None => serializer.serialize_f64(self.as_f64().unwrap_or_default()),
            },
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Non-finite numbers become [`Value::Text`] (`"NaN"`, `"inf"`, `"-inf"`),
/// matching how such payloads are parsed.
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Text(value.to_string())
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::from(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Number(if value { 1.0 } else { 0.0 })
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(f64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, u8, u16, u32);

impl From<i64> for Value {
    // Safe: datastream integers stay far below 2^53
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_number() {
        assert_eq!(Value::from_payload("1"), Value::Number(1.0));
        assert_eq!(Value::from_payload("-3.25"), Value::Number(-3.25));
    }

    #[test]
    fn parse_single_text() {
        assert_eq!(Value::from_payload("hello"), Value::Text("hello".into()));
        assert_eq!(Value::from_payload(""), Value::Text(String::new()));
    }

    #[test]
    fn parse_non_finite_stays_text() {
        assert_eq!(Value::from_payload("inf"), Value::Text("inf".into()));
        assert_eq!(Value::from_payload("NaN"), Value::Text("NaN".into()));
    }

    #[test]
    fn parse_multi_value() {
        let value = Value::from_payload("12\u{0}abc\u{0}0.5");
        assert_eq!(
            value,
            Value::List(vec![
                Value::Number(12.0),
                Value::Text("abc".into()),
                Value::Number(0.5),
            ])
        );
        assert!(value.is_list());
    }

    #[test]
    fn parse_keeps_empty_parts() {
        let value = Value::from_payload("a\u{0}");
        assert_eq!(value.values().len(), 2);
        assert_eq!(value.values()[1], Value::Text(String::new()));
    }

    #[test]
    fn encode_whole_number() {
        assert_eq!(Value::from(20).encode(), "20");
        assert_eq!(Value::from(20.0).encode(), "20");
        assert_eq!(Value::from(-7_i64).encode(), "-7");
    }

    #[test]
    fn encode_fraction() {
        assert_eq!(Value::from(0.125).encode(), "0.125");
    }

    #[test]
    fn encode_list() {
        let value = Value::from(vec![Value::from(1), Value::from("x")]);
        assert_eq!(value.encode(), "1\u{0}x");
    }

    #[test]
    fn encode_bool() {
        assert_eq!(Value::from(true).encode(), "1");
        assert_eq!(Value::from(false).encode(), "0");
    }

    #[test]
    fn scalar_values_slice() {
        let value = Value::from(3);
        assert_eq!(value.values(), &[Value::Number(3.0)]);
        assert_eq!(value.first(), Some(&Value::Number(3.0)));
    }

    #[test]
    fn integer_accessor() {
        assert_eq!(Value::Number(4.0).as_i64(), Some(4));
        assert_eq!(Value::Number(4.5).as_i64(), None);
        assert_eq!(Value::Text("4".into()).as_i64(), None);
    }

    #[test]
    fn bool_accessor() {
        assert_eq!(Value::from_payload("1").as_bool(), Some(true));
        assert_eq!(Value::from_payload("0").as_bool(), Some(false));
        assert_eq!(Value::from_payload("ON").as_bool(), Some(true));
        assert_eq!(Value::from_payload("2").as_bool(), None);
    }

    #[test]
    fn display_list() {
        let value = Value::from_payload("1\u{0}two");
        assert_eq!(value.to_string(), "[1, two]");
    }

    #[test]
    fn serialize_json() {
        let value = Value::from(vec![Value::from(1), Value::from(2.5), Value::from("x")]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[1,2.5,"x"]"#);
        assert_eq!(serde_json::to_string(&Value::from(true)).unwrap(), "1");
    }

    #[test]
    fn non_finite_float_is_text() {
        assert_eq!(Value::from(f64::NAN), Value::Text("NaN".to_string()));
        assert_eq!(Value::from(f64::INFINITY), Value::Text("inf".to_string()));
        assert_eq!(Value::from(f32::NEG_INFINITY), Value::Text("-inf".to_string()));

        let encoded = Value::from(f64::NAN).encode();
        assert_eq!(Value::from_payload(&encoded), Value::from(f64::NAN));
    }
}
