// SPDX-License-Identifier: MPL-2.0

//! Blynk device demo.
//!
//! Connects a device to Blynk, echoes writes on V1 to V2 and V3, answers
//! property requests and sends a counter on V5 every 15 seconds.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example device_demo -- <auth_token> [server]
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Default broker
//! cargo run --example device_demo -- aBcD1234efGh
//!
//! # Regional broker
//! cargo run --example device_demo -- aBcD1234efGh fra1.blynk.cloud
//! ```

use std::env;
use std::time::{Duration, Instant};

use blynk_mqtt::command::Metadata;
use blynk_mqtt::types::{DeviceInfo, VirtualPin};
use blynk_mqtt::{BlynkClient, Publisher, RumqttcTransport, SessionConfig};

const SEND_INTERVAL: Duration = Duration::from_secs(15);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <auth_token> [server]", args[0]);
        std::process::exit(1);
    }

    let mut config = SessionConfig::new(&args[1]).with_device_info(
        DeviceInfo::new()
            .with_board("Linux")
            .with_firmware_version(env!("CARGO_PKG_VERSION"))
            .with_app_name("BlynkDemoApp/Simple"),
    );
    if let Some(server) = args.get(2) {
        config = config.with_server(server);
    }

    let mut client = BlynkClient::from_config(config, RumqttcTransport::new())?;
    let started = Instant::now();

    client.on_connect(|link| {
        println!("Connected to Blynk");
        let _ = link.virtual_write(VirtualPin::new(0), "Demo connected");
        let _ = link.set_property("v0", "label", "Device Status");
        let _ = link.log_event("device_script_started", "Demo connected.");
        let _ = link.publish_metadata(&Metadata::new().with("demo_version", "1.3.0"));
    });

    client.on_disconnect(|_| {
        println!("Disconnected from Blynk, will retry");
    });

    client.on_virtual_write(VirtualPin::new(1), |link, value| {
        let first = value.first().cloned().unwrap_or_else(|| value.clone());
        println!("V1 received: {value}");
        let _ = link.virtual_write(VirtualPin::new(2), format!("V1 Echo: {first}"));
        match first.as_bool() {
            Some(true) => {
                let _ = link.virtual_write(VirtualPin::new(3), "V1 is ON");
            }
            Some(false) => {
                let _ = link.virtual_write(VirtualPin::new(3), "V1 is OFF");
            }
            None => {}
        }
    });

    client.on_property_get(move |link, pin, property| {
        println!("Server requested {pin}.{property}");
        match (pin, property) {
            ("v0", "label") => {
                let uptime = started.elapsed().as_secs();
                let _ = link.set_property("v0", "label", format!("Online ({uptime}s)"));
            }
            ("v5", "color") => {
                let _ = link.set_property("v5", "color", "#00FF00");
            }
            _ => {}
        }
    });

    client.on_automation_response(|link, id, status, message| {
        println!("Automation {id}: {status} {}", message.unwrap_or_default());
        let text = if status == "success" {
            format!("Auto {id} OK")
        } else {
            format!("Auto {id} Fail: {}", message.unwrap_or("Unknown"))
        };
        let _ = link.virtual_write(VirtualPin::new(8), text);
    });

    if let Err(e) = client.connect() {
        eprintln!("Initial connection failed: {e}");
    }

    let mut counter: u32 = 0;
    let mut last_send = Instant::now();
    loop {
        client.run();

        if client.is_connected() && last_send.elapsed() >= SEND_INTERVAL {
            counter += 1;
            println!("Sending V5: {counter}");
            if let Err(e) = client.virtual_write(VirtualPin::new(5), counter) {
                eprintln!("Failed to send V5: {e}");
            }
            if counter % 10 == 0 {
                let _ = client.notify(&format!("Device counter reached {counter}!"));
            }
            last_send = Instant::now();
        }
    }
}
