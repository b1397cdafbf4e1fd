// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Handler registry and dispatch.
//!
//! The [`EventRouter`] maps each [`EventKey`] to a single handler. Handlers
//! receive a mutable context (for the client this is the connection
//! [`Link`](crate::Link), so a handler can publish a reply) and the event.
//!
//! # Examples
//!
//! ```
//! use blynk_mqtt::event::{Event, EventKey, EventRouter};
//! use blynk_mqtt::types::{Value, VirtualPin};
//!
//! let mut router: EventRouter<Vec<String>> = EventRouter::new();
//! router.on(VirtualPin::new(1).into(), |log: &mut Vec<String>, event: &Event| {
//!     if let Event::VirtualWrite { value, .. } = event {
//!         log.push(value.to_string());
//!     }
//! });
//!
//! let mut log = Vec::new();
//! let event = Event::VirtualWrite { pin: VirtualPin::new(1), value: Value::from(7) };
//! assert!(router.dispatch(&mut log, &event));
//! assert_eq!(log, ["7"]);
//!
//! // No handler for V2: a no-op
//! let other = Event::VirtualWrite { pin: VirtualPin::new(2), value: Value::from(7) };
//! assert!(!router.dispatch(&mut log, &other));
//! ```

use std::collections::HashMap;
use std::fmt;

use super::{Event, EventKey};

/// A registered event handler.
pub type Handler<C> = Box<dyn FnMut(&mut C, &Event)>;

/// Maps event keys to their single handler.
pub struct EventRouter<C> {
    handlers: HashMap<EventKey, Handler<C>>,
}

impl<C> EventRouter<C> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers the handler for `key`, replacing any previous one.
    ///
    /// Returns `true` if a previous handler was replaced.
    pub fn on<F>(&mut self, key: EventKey, handler: F) -> bool
    where
        F: FnMut(&mut C, &Event) + 'static,
    {
        let replaced = self.handlers.insert(key, Box::new(handler)).is_some();
        tracing::debug!(event = %key, replaced, "Registered event handler");
        replaced
    }

    /// Removes the handler for `key`.
    ///
    /// Returns `true` if a handler was registered.
    pub fn off(&mut self, key: EventKey) -> bool {
        tracing::debug!(event = %key, "Removing event handler");
        self.handlers.remove(&key).is_some()
    }

    /// Returns whether a handler is registered for `key`.
    #[must_use]
    pub fn contains(&self, key: EventKey) -> bool {
        self.handlers.contains_key(&key)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invokes the handler registered for the event's key.
    ///
    /// Returns `true` if a handler ran. An event without a handler is a
    /// no-op.
    pub fn dispatch(&mut self, ctx: &mut C, event: &Event) -> bool {
        let key = event.key();
        let Some(handler) = self.handlers.get_mut(&key) else {
            tracing::debug!(event = %key, "No handler registered");
            return false;
        };

        tracing::trace!(event = %key, "Dispatching event");
        handler(ctx, event);
        true
    }
}

impl<C> Default for EventRouter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for EventRouter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.handlers.keys().map(EventKey::name).collect();
        keys.sort();
        f.debug_struct("EventRouter")
            .field("handlers", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Value, VirtualPin};

    fn write(pin: u8, payload: &str) -> Event {
        Event::VirtualWrite {
            pin: VirtualPin::new(pin),
            value: Value::from_payload(payload),
        }
    }

    #[test]
    fn dispatch_to_registered_handler() {
        let mut router: EventRouter<Vec<Value>> = EventRouter::new();
        router.on(VirtualPin::new(1).into(), |seen, event| {
            if let Event::VirtualWrite { value, .. } = event {
                seen.push(value.clone());
            }
        });

        let mut seen = Vec::new();
        assert!(router.dispatch(&mut seen, &write(1, "5")));
        assert_eq!(seen, vec![Value::Number(5.0)]);
    }

    #[test]
    fn dispatch_only_matching_pin() {
        let mut router: EventRouter<Vec<u8>> = EventRouter::new();
        for pin in [1, 2] {
            router.on(VirtualPin::new(pin).into(), move |seen, _| seen.push(pin));
        }

        let mut seen = Vec::new();
        router.dispatch(&mut seen, &write(2, "x"));
        assert_eq!(seen, vec![2]);
    }

    #[test]
    fn dispatch_without_handler_is_noop() {
        let mut router: EventRouter<u32> = EventRouter::new();
        let mut calls = 0;
        assert!(!router.dispatch(&mut calls, &Event::InfoGet));
        assert_eq!(calls, 0);
    }

    #[test]
    fn registration_replaces_previous() {
        let mut router: EventRouter<Vec<&'static str>> = EventRouter::new();
        assert!(!router.on(EventKey::Connect, |seen, _| seen.push("first")));
        assert!(router.on(EventKey::Connect, |seen, _| seen.push("second")));
        assert_eq!(router.len(), 1);

        let mut seen = Vec::new();
        router.dispatch(&mut seen, &Event::Connected);
        assert_eq!(seen, vec!["second"]);
    }

    #[test]
    fn off_removes_handler() {
        let mut router: EventRouter<u32> = EventRouter::new();
        router.on(EventKey::Disconnect, |calls, _| *calls += 1);
        assert!(router.contains(EventKey::Disconnect));

        assert!(router.off(EventKey::Disconnect));
        assert!(!router.off(EventKey::Disconnect));
        assert!(router.is_empty());

        let mut calls = 0;
        router.dispatch(&mut calls, &Event::Disconnected);
        assert_eq!(calls, 0);
    }

    #[test]
    fn handler_keeps_state_between_calls() {
        let mut router: EventRouter<Vec<u32>> = EventRouter::new();
        let mut count = 0;
        router.on(EventKey::InfoGet, move |seen, _| {
            count += 1;
            seen.push(count);
        });

        let mut seen = Vec::new();
        router.dispatch(&mut seen, &Event::InfoGet);
        router.dispatch(&mut seen, &Event::InfoGet);
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn debug_lists_keys() {
        let mut router: EventRouter<()> = EventRouter::new();
        router.on(EventKey::Connect, |_, _| {});
        router.on(VirtualPin::new(4).into(), |_, _| {});
        assert_eq!(
            format!("{router:?}"),
            r#"EventRouter { handlers: ["V4", "connect"] }"#
        );
    }
}
