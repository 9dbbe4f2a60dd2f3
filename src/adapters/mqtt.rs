//! Broker message shapes and the publishing event sink.
//!
//! | Topic                  | Dir | Payload                                        |
//! |------------------------|-----|------------------------------------------------|
//! | `roslinki/config`      | in  | `{"config":{"scan_interval"},"devices":[..]}`  |
//! | `roslinki/pump_logs`   | out | `{"plant_id":1,"action":1}`                    |
//! | `roslinki/sensor_logs` | out | `{"plant_id":1,"value":512}`                   |
//!
//! Connection handling and retry belong to the client underneath the
//! [`Publisher`] port.

use heapless::Vec as BoundedVec;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::commands::AppCommand;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, Publisher};
use crate::config::MAX_DEVICES;
use crate::error::DecodeError;
use crate::roster::{ActuateTarget, ChannelId, ChannelSpec, SenseSource};

pub const TOPIC_CONFIG: &str = "roslinki/config";
pub const TOPIC_PUMP_LOGS: &str = "roslinki/pump_logs";
pub const TOPIC_SENSOR_LOGS: &str = "roslinki/sensor_logs";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub scan_interval: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeviceDescriptor {
    pub id: ChannelId,
    pub sensor_pin: u8,
    pub pump_pin: u8,
    pub threshold: i32,
}

impl From<DeviceDescriptor> for ChannelSpec {
    fn from(d: DeviceDescriptor) -> Self {
        Self {
            id: d.id,
            sense_source: SenseSource(d.sensor_pin),
            actuate_target: ActuateTarget(d.pump_pin),
            threshold: d.threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigMessage {
    #[serde(default)]
    pub config: Option<RemoteSettings>,
    #[serde(default)]
    pub devices: Vec<DeviceDescriptor>,
}

#[derive(Debug, Serialize)]
struct PumpLog {
    plant_id: ChannelId,
    action: u8,
}

#[derive(Debug, Serialize)]
struct SensorLog {
    plant_id: ChannelId,
    value: u16,
}

/// Decode a `roslinki/config` payload into a reconcile command.
/// Descriptors past [`MAX_DEVICES`] are dropped.
pub fn decode_config(payload: &[u8]) -> Result<AppCommand, DecodeError> {
    let msg: ConfigMessage = serde_json::from_slice(payload).map_err(|_| DecodeError::Malformed)?;
    let mut specs = BoundedVec::new();
    for d in msg.devices.into_iter().take(MAX_DEVICES) {
        let _ = specs.push(ChannelSpec::from(d));
    }
    Ok(AppCommand::Reconcile {
        specs,
        sample_interval_ms: msg.config.and_then(|c| c.scan_interval),
    })
}

/// Route an inbound message by topic.
pub fn decode_message(topic: &str, payload: &[u8]) -> Result<AppCommand, DecodeError> {
    match topic {
        TOPIC_CONFIG => decode_config(payload),
        _ => Err(DecodeError::UnknownTopic),
    }
}

/// [`EventSink`] that publishes pump transitions and sensor reports.
pub struct MqttEventSink<P> {
    publisher: P,
}

impl<P: Publisher> MqttEventSink<P> {
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    fn send<T: Serialize>(&mut self, topic: &str, body: &T) {
        let payload = match serde_json::to_vec(body) {
            Ok(p) => p,
            Err(_) => {
                warn!("mqtt: encode failed for {}", topic);
                return;
            }
        };
        if let Err(e) = self.publisher.publish(topic, &payload) {
            warn!("mqtt: publish to {} dropped: {}", topic, e);
        }
    }
}

impl<P: Publisher> EventSink for MqttEventSink<P> {
    fn emit(&mut self, event: &AppEvent) {
        match *event {
            // Local zones carry non-positive ids and stay off the broker.
            AppEvent::PumpStateChanged { id, on } if id > 0 => {
                self.send(
                    TOPIC_PUMP_LOGS,
                    &PumpLog {
                        plant_id: id,
                        action: u8::from(on),
                    },
                );
            }
            AppEvent::SensorReport { id, value } if id > 0 => {
                self.send(TOPIC_SENSOR_LOGS, &SensorLog { plant_id: id, value });
            }
            _ => debug!("mqtt: {:?} not published", event),
        }
    }
}

// ── ESP-IDF client ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::mqtt::client::{EspMqttClient, QoS};

    use crate::app::ports::Publisher;
    use crate::error::Error;

    use super::TOPIC_CONFIG;

    /// [`Publisher`] over the ESP-IDF MQTT client.
    pub struct EspPublisher {
        client: EspMqttClient<'static>,
    }

    impl EspPublisher {
        pub fn new(client: EspMqttClient<'static>) -> Self {
            Self { client }
        }

        /// (Re)subscribe to the config topic; call after every connect.
        pub fn subscribe_config(&mut self) -> Result<(), Error> {
            self.client
                .subscribe(TOPIC_CONFIG, QoS::AtLeastOnce)
                .map(|_| ())
                .map_err(|_| Error::Publish)
        }
    }

    impl Publisher for EspPublisher {
        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error> {
            self.client
                .enqueue(topic, QoS::AtMostOnce, false, payload)
                .map(|_| ())
                .map_err(|_| Error::Publish)
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::EspPublisher;
