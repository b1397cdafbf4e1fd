// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blynk MQTT topic layout.
//!
//! Downlink messages (server to device) are matched against the fixed
//! [`DOWNLINK_ROUTES`] table and decoded into an [`Event`]:
//!
//! ```text
//! MQTT Message: downlink/ds/V1 → 255\0128\00
//!                     ↓
//!             topics::decode()
//!                     ↓
//!    route "downlink/ds/+" captures "V1"
//!                     ↓
//!   Event::VirtualWrite { pin: V1, value: [255, 128, 0] }
//! ```
//!
//! Uplink topics (device to server) are built by the functions at the end
//! of this module.

use crate::error::ParseError;
use crate::event::{Event, OtaRequest};
use crate::types::{LogLevel, VALUE_SEPARATOR, Value, VirtualPin};

/// How a downlink payload is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownlinkKind {
    /// `downlink/ds/<pin>`: a value written to a virtual pin.
    Datastream,
    /// `downlink/info_get`: a request for the device description.
    InfoGet,
    /// `downlink/property_get`: `<pin>\0<property>`.
    PropertyGet,
    /// `downlink/automation_response`: `<id>\0<status>[\0<message>]`.
    AutomationResponse,
    /// `downlink/ota_request`: a JSON object.
    OtaRequest,
}

/// A downlink topic filter and its payload decoding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// The MQTT topic filter; `+` matches one level.
    pub filter: &'static str,
    /// How matching payloads are decoded.
    pub kind: DownlinkKind,
}

/// Every downlink topic the device subscribes to.
pub static DOWNLINK_ROUTES: [Route; 5] = [
    Route {
        filter: "downlink/ds/+",
        kind: DownlinkKind::Datastream,
    },
    Route {
        filter: "downlink/info_get",
        kind: DownlinkKind::InfoGet,
    },
    Route {
        filter: "downlink/property_get",
        kind: DownlinkKind::PropertyGet,
    },
    Route {
        filter: "downlink/automation_response",
        kind: DownlinkKind::AutomationResponse,
    },
    Route {
        filter: "downlink/ota_request",
        kind: DownlinkKind::OtaRequest,
    },
];

/// Returns the topic filters to subscribe to after connecting.
pub fn subscriptions() -> impl Iterator<Item = &'static str> {
    DOWNLINK_ROUTES.iter().map(|route| route.filter)
}

/// Matches a topic against the routing table.
///
/// Returns the route and the level captured by its `+` wildcard, if any.
#[must_use]
pub fn match_route(topic: &str) -> Option<(&'static Route, Option<&str>)> {
    DOWNLINK_ROUTES
        .iter()
        .find_map(|route| match_filter(route.filter, topic).map(|capture| (route, capture)))
}

/// Matches a topic against a filter with single-level wildcards.
///
/// Returns `Some(capture)` on a match, where `capture` is the last level
/// matched by a `+`.
fn match_filter<'t>(filter: &str, topic: &'t str) -> Option<Option<&'t str>> {
    let mut capture = None;
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (None, None) => return Some(capture),
            (Some("+"), Some(level)) if !level.is_empty() => capture = Some(level),
            (Some(expected), Some(level)) if expected == level => {}
            _ => return None,
        }
    }
}

/// Decodes a downlink message into an event.
///
/// # Errors
///
/// Returns `ParseError` if the topic is unknown or the payload is malformed.
pub fn decode(topic: &str, payload: &[u8]) -> Result<Event, ParseError> {
    let (route, capture) =
        match_route(topic).ok_or_else(|| ParseError::UnknownTopic(topic.to_string()))?;
    let payload = std::str::from_utf8(payload)?;

    match route.kind {
        DownlinkKind::Datastream => {
            let designator = capture.ok_or_else(|| ParseError::MissingField("pin".to_string()))?;
            let pin = designator
                .parse::<VirtualPin>()
                .map_err(|e| ParseError::InvalidValue {
                    field: "pin".to_string(),
                    message: e.to_string(),
                })?;
            Ok(Event::VirtualWrite {
                pin,
                value: Value::from_payload(payload),
            })
        }
        DownlinkKind::InfoGet => Ok(Event::InfoGet),
        DownlinkKind::PropertyGet => {
            let mut parts = payload.split(VALUE_SEPARATOR);
            let pin = required(parts.next(), "pin")?;
            let property = required(parts.next(), "property")?;
            Ok(Event::PropertyGet {
                pin: pin.to_string(),
                property: property.to_string(),
            })
        }
        DownlinkKind::AutomationResponse => {
            let mut parts = payload.splitn(3, VALUE_SEPARATOR);
            let id = required(parts.next(), "automationId")?;
            let automation_id = id.parse().map_err(|_| ParseError::InvalidValue {
                field: "automationId".to_string(),
                message: format!("not an integer: {id}"),
            })?;
            let status = required(parts.next(), "status")?;
            let message = parts.next().filter(|m| !m.is_empty());
            Ok(Event::AutomationResponse {
                automation_id,
                status: status.to_string(),
                message: message.map(str::to_string),
            })
        }
        DownlinkKind::OtaRequest => {
            let request = if payload.trim().is_empty() {
                OtaRequest::default()
            } else {
                serde_json::from_str(payload)?
            };
            Ok(Event::OtaRequest(request))
        }
    }
}

/// Returns a payload part, rejecting missing or empty ones.
fn required<'a>(part: Option<&'a str>, field: &str) -> Result<&'a str, ParseError> {
    part.filter(|p| !p.is_empty())
        .ok_or_else(|| ParseError::MissingField(field.to_string()))
}

/// Topic for notifications.
pub const NOTIFY: &str = "notify";
/// Topic for the device description.
pub const INFO_UPDATE: &str = "info/mcu";
/// Topic for location updates.
pub const LOCATION_UPDATE: &str = "loc";
/// Topic for metadata updates.
pub const METADATA_UPDATE: &str = "meta";
/// Topic for automation triggers.
pub const AUTOMATION_TRIGGER: &str = "automation/trigger";
/// Topic for OTA progress reports.
pub const OTA_STATUS: &str = "ota/status";

/// Topic for writing a virtual pin: `ds/V<n>`.
#[must_use]
pub fn datastream(pin: VirtualPin) -> String {
    format!("ds/{pin}")
}

/// Topic for setting a widget property: `ds/<pin>/prop/<property>`.
#[must_use]
pub fn property(pin: &str, property: &str) -> String {
    format!("ds/{pin}/prop/{property}")
}

/// Topic for logging a timeline event: `event/<code>`.
#[must_use]
pub fn event(code: &str) -> String {
    format!("event/{code}")
}

/// Topic for writing a pin on another device: `bridge/<token>/ds/<pin>`.
#[must_use]
pub fn bridge(target_token: &str, pin: VirtualPin) -> String {
    format!("bridge/{target_token}/ds/{pin}")
}

/// Topic for a device log entry: `log/<level>`.
#[must_use]
pub fn device_log(level: LogLevel) -> String {
    format!("log/{level}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKey;

    #[test]
    fn match_filter_exact() {
        assert_eq!(
            match_filter("downlink/info_get", "downlink/info_get"),
            Some(None)
        );
        assert_eq!(match_filter("downlink/info_get", "downlink/info"), None);
        assert_eq!(
            match_filter("downlink/info_get", "downlink/info_get/x"),
            None
        );
    }

    #[test]
    fn match_filter_wildcard() {
        assert_eq!(
            match_filter("downlink/ds/+", "downlink/ds/V4"),
            Some(Some("V4"))
        );
        assert_eq!(match_filter("downlink/ds/+", "downlink/ds/"), None);
        assert_eq!(match_filter("downlink/ds/+", "downlink/ds/V4/extra"), None);
    }

    #[test]
    fn subscriptions_cover_every_route() {
        let filters: Vec<&str> = subscriptions().collect();
        assert_eq!(filters.len(), DOWNLINK_ROUTES.len());
        assert!(filters.contains(&"downlink/ds/+"));
        assert!(filters.contains(&"downlink/ota_request"));
    }

    #[test]
    fn decode_single_value() {
        let event = decode("downlink/ds/V1", b"1").unwrap();
        assert_eq!(
            event,
            Event::VirtualWrite {
                pin: VirtualPin::new(1),
                value: Value::Number(1.0),
            }
        );
    }

    #[test]
    fn decode_multi_value() {
        let event = decode("downlink/ds/v7", b"10\x0020\x00abc").unwrap();
        let Event::VirtualWrite { pin, value } = event else {
            panic!("expected virtual write");
        };
        assert_eq!(pin, VirtualPin::new(7));
        assert_eq!(
            value,
            Value::List(vec![
                Value::Number(10.0),
                Value::Number(20.0),
                Value::Text("abc".into()),
            ])
        );
    }

    #[test]
    fn decode_bare_pin_number() {
        let event = decode("downlink/ds/12", b"on").unwrap();
        assert_eq!(event.key(), EventKey::VirtualPin(VirtualPin::new(12)));
    }

    #[test]
    fn decode_invalid_pin() {
        assert!(matches!(
            decode("downlink/ds/temperature", b"1"),
            Err(ParseError::InvalidValue { .. })
        ));
        assert!(matches!(
            decode("downlink/ds/V999", b"1"),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn decode_info_get_ignores_payload() {
        assert_eq!(decode("downlink/info_get", b"").unwrap(), Event::InfoGet);
        assert_eq!(decode("downlink/info_get", b"x").unwrap(), Event::InfoGet);
    }

    #[test]
    fn decode_property_get() {
        let event = decode("downlink/property_get", b"v0\x00label").unwrap();
        assert_eq!(
            event,
            Event::PropertyGet {
                pin: "v0".into(),
                property: "label".into(),
            }
        );
    }

    #[test]
    fn decode_property_get_missing_property() {
        assert!(matches!(
            decode("downlink/property_get", b"v0"),
            Err(ParseError::MissingField(field)) if field == "property"
        ));
    }

    #[test]
    fn decode_automation_response() {
        let event = decode(
            "downlink/automation_response",
            b"123\x00failed\x00device offline",
        )
        .unwrap();
        assert_eq!(
            event,
            Event::AutomationResponse {
                automation_id: 123,
                status: "failed".into(),
                message: Some("device offline".into()),
            }
        );
    }

    #[test]
    fn decode_automation_response_without_message() {
        let event = decode("downlink/automation_response", b"9\x00success").unwrap();
        assert!(matches!(
            event,
            Event::AutomationResponse { message: None, .. }
        ));
    }

    #[test]
    fn decode_automation_response_bad_id() {
        assert!(matches!(
            decode("downlink/automation_response", b"abc\x00success"),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn decode_ota_request() {
        let event = decode(
            "downlink/ota_request",
            br#"{"command":"start","url":"http://fw/x.bin","size":1024}"#,
        )
        .unwrap();
        let Event::OtaRequest(request) = event else {
            panic!("expected OTA request");
        };
        assert_eq!(request.command.as_deref(), Some("start"));
        assert_eq!(request.size, Some(1024));
        assert!(request.extra.is_empty());
    }

    #[test]
    fn decode_ota_request_malformed_json() {
        assert!(matches!(
            decode("downlink/ota_request", b"{oops"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn decode_unknown_topic() {
        assert!(matches!(
            decode("downlink/reboot", b""),
            Err(ParseError::UnknownTopic(_))
        ));
    }

    #[test]
    fn decode_invalid_utf8() {
        assert!(matches!(
            decode("downlink/ds/V1", &[0xff, 0xfe]),
            Err(ParseError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn uplink_topics() {
        assert_eq!(datastream(VirtualPin::new(5)), "ds/V5");
        assert_eq!(property("v0", "label"), "ds/v0/prop/label");
        assert_eq!(event("overheat"), "event/overheat");
        assert_eq!(bridge("other-token", VirtualPin::new(2)), "bridge/other-token/ds/V2");
        assert_eq!(device_log(LogLevel::Warn), "log/warn");
    }
}
