// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the rumqttc transport using mockforge-mqtt.
//!
//! The blocking client drives its own runtime, so the broker runs on a
//! separate tokio runtime and the tests themselves are plain `#[test]`s.

#![cfg(feature = "mqtt")]

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use blynk_mqtt::types::{DeviceInfo, LogLevel, VirtualPin};
use blynk_mqtt::{BlynkClient, Error, Publisher, RumqttcTransport, SessionConfig};
use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use tokio::runtime::Runtime;

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
///
/// The broker lives as long as the returned runtime.
fn start_mock_broker(port: u16) -> Runtime {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("broker runtime");

    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };
    runtime.spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind to the port
    std::thread::sleep(Duration::from_millis(500));
    runtime
}

fn session_config(port: u16) -> SessionConfig {
    SessionConfig::new("integration-token")
        .with_server("127.0.0.1")
        .with_port(port)
        .with_connect_timeout(Duration::from_secs(5))
        .with_auto_reconnect(false)
}

// ============================================================================
// Connection Tests
// ============================================================================

mod connection {
    use super::*;

    #[test]
    fn connect_to_broker() {
        let port = get_test_port();
        let _broker = start_mock_broker(port);

        let connects = Rc::new(Cell::new(0));
        let counter = Rc::clone(&connects);

        let mut client =
            BlynkClient::from_config(session_config(port), RumqttcTransport::new()).unwrap();
        client.on_connect(move |_| counter.set(counter.get() + 1));

        let result = client.connect();

        assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
        assert!(client.is_connected());
        assert_eq!(connects.get(), 1);
    }

    #[test]
    fn connect_with_device_info() {
        let port = get_test_port();
        let _broker = start_mock_broker(port);

        let config = session_config(port)
            .with_device_info(DeviceInfo::new().with_board("Linux").with_firmware_version("0.1.0"));
        let mut client = BlynkClient::from_config(config, RumqttcTransport::new()).unwrap();

        client.connect().unwrap();
        assert!(client.is_connected());
    }

    #[test]
    fn connect_refused_runs_disconnect_handler() {
        // Nothing listens on this port
        let port = get_test_port();

        let disconnects = Rc::new(Cell::new(0));
        let counter = Rc::clone(&disconnects);

        let mut client =
            BlynkClient::from_config(session_config(port), RumqttcTransport::new()).unwrap();
        client.on_disconnect(move |_| counter.set(counter.get() + 1));

        let result = client.connect();

        assert!(matches!(result, Err(Error::Protocol(_))));
        assert!(!client.is_connected());
        assert_eq!(disconnects.get(), 1);
    }

    #[test]
    fn disconnect_closes_session() {
        let port = get_test_port();
        let _broker = start_mock_broker(port);

        let mut client =
            BlynkClient::from_config(session_config(port), RumqttcTransport::new()).unwrap();
        client.connect().unwrap();

        client.disconnect();

        assert!(!client.is_connected());
        assert!(matches!(
            client.virtual_write(VirtualPin::new(0), 1),
            Err(Error::NotConnected)
        ));
    }
}

// ============================================================================
// Uplink Tests
// ============================================================================
//
// NOTE: The mockforge-mqtt broker doesn't forward messages between clients,
// so these tests only check that publishing and polling keep the session up.
// Downlink routing is covered by tests/client_lifecycle.rs.

mod uplink {
    use super::*;

    #[test]
    fn publish_while_connected() {
        let port = get_test_port();
        let _broker = start_mock_broker(port);

        let mut client =
            BlynkClient::from_config(session_config(port), RumqttcTransport::new()).unwrap();
        client.connect().unwrap();

        client.virtual_write(VirtualPin::new(1), 23.5).unwrap();
        client.virtual_write(VirtualPin::new(2), vec![255, 128, 0]).unwrap();
        client.notify("integration test").unwrap();
        client.device_log(LogLevel::Info, "booted").unwrap();

        for _ in 0..10 {
            client.run();
        }

        assert!(client.is_connected());
    }

    #[test]
    fn publish_burst_without_run_keeps_session() {
        let port = get_test_port();
        let _broker = start_mock_broker(port);

        let disconnects = Rc::new(Cell::new(0));
        let counter = Rc::clone(&disconnects);

        let mut client =
            BlynkClient::from_config(session_config(port), RumqttcTransport::new()).unwrap();
        client.on_disconnect(move |_| counter.set(counter.get() + 1));
        client.connect().unwrap();

        // More requests than the client's request queue holds
        for i in 0..200 {
            let result = client.virtual_write(VirtualPin::new(5), i);
            assert!(result.is_ok(), "write {i} failed: {:?}", result.err());
        }

        assert!(client.is_connected());
        assert_eq!(disconnects.get(), 0);

        client.run();
        assert!(client.is_connected());
    }
}
