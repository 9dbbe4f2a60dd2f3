//! Irrigation Controller Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    LogEventSink   FlashPartition  Esp32Time   │
//! │  (Sensor+Actuator)  MqttEventSink  (BlockDevice)   (Clock)     │
//! │  Keypad (ISR edges) ConsoleDisplay                             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Roster · Threshold control · Settings store · Menu    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The MQTT callback runs on the client's own task.  It only decodes and
//! forwards commands over a channel; the roster is touched from this loop
//! alone.
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{error, info, warn};

use irrigator::adapters::display::ConsoleDisplay;
use irrigator::adapters::flash::FlashPartition;
use irrigator::adapters::hardware::HardwareAdapter;
use irrigator::adapters::log_sink::LogEventSink;
use irrigator::adapters::mqtt::{EspPublisher, MqttEventSink, decode_message};
use irrigator::adapters::time::Esp32TimeAdapter;
use irrigator::app::commands::AppCommand;
use irrigator::app::ports::Clock;
use irrigator::app::service::AppService;
use irrigator::config::{SCAN_INTERVAL_MS, SystemConfig};
use irrigator::drivers::hw_init::{self, GpioInput};
use irrigator::drivers::keypad::Keypad;
use irrigator::drivers::pump::PumpDriver;
use irrigator::events::KEYPAD_EDGES;
use irrigator::pins;
use irrigator::store::SettingsStore;

// ── Build-time credentials ────────────────────────────────────

const fn or_empty(v: Option<&'static str>) -> &'static str {
    match v {
        Some(s) => s,
        None => "",
    }
}

const WIFI_SSID: &str = or_empty(option_env!("IRRIGATION_WIFI_SSID"));
const WIFI_PASS: &str = or_empty(option_env!("IRRIGATION_WIFI_PASS"));
const MQTT_URL: &str = or_empty(option_env!("IRRIGATION_MQTT_URL"));
const MQTT_USER: Option<&str> = option_env!("IRRIGATION_MQTT_USER");
const MQTT_PASS: Option<&str> = option_env!("IRRIGATION_MQTT_PASS");

// ── Network bring-up ──────────────────────────────────────────

fn connect_wifi(wifi: &mut BlockingWifi<EspWifi<'static>>) -> Result<()> {
    let cfg = Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID.try_into().map_err(|_| anyhow!("SSID too long"))?,
        password: WIFI_PASS
            .try_into()
            .map_err(|_| anyhow!("password too long"))?,
        auth_method: if WIFI_PASS.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    });
    wifi.set_configuration(&cfg)?;
    wifi.start()?;
    wifi.connect()?;
    wifi.wait_netif_up()?;
    let ip = wifi.wifi().sta_netif().get_ip_info()?;
    info!("WiFi: connected, ip={}", ip.ip);
    Ok(())
}

/// Start the MQTT client.  Decoded commands go to `commands`; `connected`
/// tracks the session so the loop can resubscribe after a reconnect.
fn start_mqtt(
    commands: mpsc::Sender<AppCommand>,
    connected: Arc<AtomicBool>,
) -> Result<EspPublisher> {
    let cfg = MqttClientConfiguration {
        client_id: Some("irrigator"),
        username: MQTT_USER,
        password: MQTT_PASS,
        ..Default::default()
    };
    let client = EspMqttClient::new_cb(MQTT_URL, &cfg, move |event| match event.payload() {
        EventPayload::Connected(_) => {
            info!("MQTT: connected");
            connected.store(true, Ordering::Release);
        }
        EventPayload::Disconnected => {
            warn!("MQTT: disconnected");
            connected.store(false, Ordering::Release);
        }
        EventPayload::Received { topic, data, .. } => {
            match decode_message(topic.unwrap_or_default(), data) {
                Ok(cmd) => {
                    if commands.send(cmd).is_err() {
                        warn!("MQTT: control loop gone, message dropped");
                    }
                }
                Err(e) => warn!("MQTT: payload ignored ({})", e),
            }
        }
        _ => {}
    })?;
    Ok(EspPublisher::new(client))
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Irrigator v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Hardware: pumps LOW first ──────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Outputs may be floating; do not run the control loop.
        error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {} — keypad disabled", e);
    }

    // ── 3. Settings ───────────────────────────────────────────
    let mut store = SettingsStore::new(FlashPartition::new()?);
    if let Err(e) = store.load() {
        warn!("Settings load failed ({}), running on in-memory values", e);
    }

    // ── 4. Adapters + service ─────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut hw = HardwareAdapter::new(PumpDriver::new());
    let mut keypad = Keypad::new(pins::KEYPAD_GPIOS.map(GpioInput));
    let mut display = ConsoleDisplay::new();

    let mut app = AppService::new(store, SystemConfig::default());
    let mut log_sink = LogEventSink::new();
    app.start(&mut hw, &mut log_sink);

    // ── 5. Network (optional: local control works without it) ─
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs))?,
        sys_loop,
    )?;

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let connected = Arc::new(AtomicBool::new(false));
    let publisher = match connect_wifi(&mut wifi) {
        Ok(()) => match start_mqtt(cmd_tx, Arc::clone(&connected)) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("MQTT start failed ({}), running offline", e);
                None
            }
        },
        Err(e) => {
            warn!("WiFi failed ({}), running offline", e);
            None
        }
    };
    let mut sink = (log_sink, publisher.map(MqttEventSink::new));
    let mut subscribed = false;

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let now = clock.now_ms();

        for event in keypad.poll(now, &KEYPAD_EDGES) {
            app.handle_key(event, now, &mut sink);
        }

        if let Some(mqtt) = sink.1.as_mut() {
            let up = connected.load(Ordering::Acquire);
            if up && !subscribed {
                match mqtt.publisher_mut().subscribe_config() {
                    Ok(()) => subscribed = true,
                    Err(e) => warn!("MQTT: subscribe failed ({})", e),
                }
            } else if !up {
                subscribed = false;
            }
        }

        while let Ok(cmd) = cmd_rx.try_recv() {
            app.handle_command(cmd, now, &mut hw, &mut sink);
        }

        app.tick(now, &mut hw, &mut sink);
        app.render(&mut display);

        std::thread::sleep(Duration::from_millis(u64::from(SCAN_INTERVAL_MS)));
    }
}
