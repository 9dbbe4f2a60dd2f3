//! Mock adapters for integration tests.
//!
//! Records every output change, event, display frame and flash operation
//! so tests can assert on full histories without touching real GPIO or
//! flash.

use std::collections::HashMap;

use irrigator::app::events::AppEvent;
use irrigator::app::ports::{
    ActuatorPort, BlockDevice, DisplayPort, EventSink, Publisher, SensorPort,
};
use irrigator::app::service::AppService;
use irrigator::app::ui::MenuLine;
use irrigator::config::{ERASE_BLOCK_SIZE, FLASH_FILL_BYTE, SystemConfig};
use irrigator::error::{Error, FlashError};
use irrigator::roster::{ActuateTarget, SenseSource};
use irrigator::store::SettingsStore;

// ── MockHardware ──────────────────────────────────────────────

/// Sensor + actuator double.  Unset sources read as unavailable.
#[derive(Default)]
pub struct MockHardware {
    pub readings: HashMap<u8, u16>,
    pub outputs: HashMap<u8, bool>,
    pub calls: Vec<(u8, bool)>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reading(&mut self, source: u8, value: u16) {
        self.readings.insert(source, value);
    }

    /// Current level of `pin`; never-driven pins are off.
    pub fn is_on(&self, pin: u8) -> bool {
        self.outputs.get(&pin).copied().unwrap_or(false)
    }

    pub fn on_pins(&self) -> Vec<u8> {
        let mut pins: Vec<u8> = self
            .outputs
            .iter()
            .filter_map(|(&p, &on)| on.then_some(p))
            .collect();
        pins.sort_unstable();
        pins
    }
}

impl SensorPort for MockHardware {
    fn sample(&mut self, source: SenseSource) -> Option<u16> {
        self.readings.get(&source.0).copied()
    }
}

impl ActuatorPort for MockHardware {
    fn set_output(&mut self, target: ActuateTarget, on: bool) {
        self.outputs.insert(target.0, on);
        self.calls.push((target.0, on));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pump_events(&self) -> Vec<(i32, bool)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                AppEvent::PumpStateChanged { id, on } => Some((id, on)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── RecordingPublisher ────────────────────────────────────────

/// Broker double: keeps every `(topic, payload)` as text.
#[derive(Default)]
pub struct RecordingPublisher {
    pub sent: Vec<(String, String)>,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn topics(&self) -> Vec<&str> {
        self.sent.iter().map(|(t, _)| t.as_str()).collect()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error> {
        self.sent
            .push((topic.to_owned(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }
}

// ── MockBlockDevice ───────────────────────────────────────────

/// NOR-like block with fault injection.
pub struct MockBlockDevice {
    pub block: Vec<u8>,
    pub erases: usize,
    pub programs: usize,
    pub fail_erase: bool,
    /// Silently drop the program step, so read-back fails to verify.
    pub drop_program: bool,
}

#[allow(dead_code)]
impl MockBlockDevice {
    pub fn blank() -> Self {
        Self {
            block: vec![FLASH_FILL_BYTE; ERASE_BLOCK_SIZE],
            erases: 0,
            programs: 0,
            fail_erase: false,
            drop_program: false,
        }
    }

    pub fn with_image(image: &[u8]) -> Self {
        let mut dev = Self::blank();
        dev.block[..image.len()].copy_from_slice(image);
        dev
    }
}

impl BlockDevice for MockBlockDevice {
    fn block_size(&self) -> usize {
        self.block.len()
    }

    fn erase(&mut self) -> Result<(), FlashError> {
        if self.fail_erase {
            return Err(FlashError::Erase(-1));
        }
        self.erases += 1;
        self.block.fill(FLASH_FILL_BYTE);
        Ok(())
    }

    fn program(&mut self, data: &[u8]) -> Result<(), FlashError> {
        if data.len() != self.block.len() {
            return Err(FlashError::BadLength);
        }
        self.programs += 1;
        if !self.drop_program {
            for (cell, &b) in self.block.iter_mut().zip(data) {
                *cell &= b;
            }
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), FlashError> {
        if buf.len() != self.block.len() {
            return Err(FlashError::BadLength);
        }
        buf.copy_from_slice(&self.block);
        Ok(())
    }
}

// ── MockDisplay ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub power: Vec<bool>,
    pub frames: Vec<Vec<String>>,
}

impl DisplayPort for MockDisplay {
    fn set_power(&mut self, on: bool) {
        self.power.push(on);
    }

    fn draw(&mut self, lines: &[MenuLine]) {
        self.frames.push(
            lines
                .iter()
                .map(|l| format!("{}{}", if l.selected { ">" } else { " " }, l.text))
                .collect(),
        );
    }
}

// ── Fixture ───────────────────────────────────────────────────

/// Started service over a blank, loaded store.
#[allow(dead_code)]
pub fn started_app() -> (AppService<MockBlockDevice>, MockHardware, RecordingSink) {
    let mut store = SettingsStore::new(MockBlockDevice::blank());
    store.load().expect("blank store loads");
    let mut app = AppService::new(store, SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    (app, hw, sink)
}
