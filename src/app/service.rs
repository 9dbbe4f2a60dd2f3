//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the roster, the settings store, the menu state and
//! the actuation controller.  It is the single place any of them is
//! mutated: keypad gestures, remote configuration and the periodic
//! control pass all go through it from the main loop.  All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                 │       AppService         │
//! ActuatorPort ◀──│ Roster · Control · Store │ ──▶ DisplayPort
//!                 └─────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::{
    SystemConfig, SAVE_STORAGE_INTERVAL_MS, THRESHOLD_REPEAT_STEP, THRESHOLD_SHORT_STEP,
};
use crate::control::threshold::ActuationController;
use crate::drivers::keypad::{Key, KeyEvent};
use crate::roster::{ChannelSpec, Roster, RosterMode};
use crate::store::SettingsStore;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, BlockDevice, DisplayPort, EventSink, SensorPort};
use super::ui::{self, MenuItem, MenuLine, UiState, MAX_MENU_LINES};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<B> {
    roster: Roster,
    store: SettingsStore<B>,
    config: SystemConfig,
    ui: UiState,
    controller: ActuationController,
    /// Display power last pushed to the DisplayPort.
    applied_power: Option<bool>,
    last_sample_ms: Option<u32>,
    last_report_ms: Option<u32>,
    settings_dirty: bool,
    dirty_since_ms: u32,
}

fn due(last: Option<u32>, now_ms: u32, interval_ms: u32) -> bool {
    last.is_none_or(|t| now_ms.wrapping_sub(t) >= interval_ms)
}

impl<B: BlockDevice> AppService<B> {
    /// Build the service around an already-loaded store.  The roster
    /// starts local, with the store's thresholds.
    ///
    /// Does **not** touch any output — call [`start`](Self::start) next.
    pub fn new(store: SettingsStore<B>, config: SystemConfig) -> Self {
        let roster = Roster::local(store.record());
        Self {
            roster,
            store,
            config,
            ui: UiState::new(),
            controller: ActuationController::new(),
            applied_power: None,
            last_sample_ms: None,
            last_report_ms: None,
            settings_dirty: false,
            dirty_since_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every roster output off and announce the start.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        for ch in self.roster.channels_mut() {
            ch.is_actuating = false;
            hw.set_output(ch.actuate_target, false);
        }
        sink.emit(&AppEvent::Started {
            channels: self.roster.len(),
        });
        info!("AppService started with {} local channels", self.roster.len());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run whatever is due at `now_ms`: sampling + control, value reports,
    /// and the deferred settings save.
    ///
    /// `hw` satisfies **both** [`SensorPort`] and [`ActuatorPort`].
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        if due(self.last_sample_ms, now_ms, self.config.sample_interval_ms) {
            self.last_sample_ms = Some(now_ms);
            self.sample_and_control(hw, sink);
        }
        if due(self.last_report_ms, now_ms, self.config.report_interval_ms) {
            self.last_report_ms = Some(now_ms);
            self.report_values(sink);
        }
        self.auto_save_if_needed(now_ms);
    }

    /// Sample every channel, then run one actuation pass.
    /// A channel whose source cannot be read keeps its previous value.
    pub fn sample_and_control(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        for i in 0..self.roster.len() {
            let Some(ch) = self.roster.select(i) else {
                continue;
            };
            let (id, source) = (ch.id, ch.sense_source);
            match hw.sample(source) {
                Some(value) => self.roster.set_last_value(i, value),
                None => debug!("sample: channel {} source {} unreadable", id, source.0),
            }
        }
        self.controller.tick(&mut self.roster, hw, sink);
    }

    /// Emit one [`AppEvent::SensorReport`] per channel.
    pub fn report_values(&self, sink: &mut impl EventSink) {
        for ch in self.roster.channels() {
            sink.emit(&AppEvent::SensorReport {
                id: ch.id,
                value: ch.last_value,
            });
        }
    }

    // ── Remote configuration ──────────────────────────────────

    /// Replace the roster with the one `specs` describes.  Every required
    /// pin transition is applied before the new roster becomes visible.
    /// Returns the number of transitions applied.
    pub fn reconcile(
        &mut self,
        specs: &[ChannelSpec],
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let plan = self.roster.plan_reconcile(specs);
        for t in &plan.transitions {
            hw.set_output(t.target, t.on);
        }

        if self.roster.mode() == RosterMode::Local {
            // Local edits still pending belong to the local roster.
            self.force_save_if_dirty();
            info!("roster: switching to remote configuration");
        }
        self.roster = plan.roster;
        self.ui.clamp_to(&self.roster);

        let transitions = plan.transitions.len();
        sink.emit(&AppEvent::RosterReconciled {
            mode: self.roster.mode(),
            channels: self.roster.len(),
            transitions,
        });
        info!(
            "roster: reconciled to {} channels ({} pin transitions)",
            self.roster.len(),
            transitions
        );
        transitions
    }

    // ── Keypad ────────────────────────────────────────────────

    pub fn handle_key(&mut self, event: KeyEvent, now_ms: u32, sink: &mut impl EventSink) {
        match event {
            KeyEvent::ShortPress(key) => self.handle_short_press(key, now_ms, sink),
            KeyEvent::LongPressRepeat(key) => self.handle_long_repeat(key, now_ms, sink),
        }
    }

    pub fn handle_short_press(&mut self, key: Key, now_ms: u32, sink: &mut impl EventSink) {
        if self.wake_display(sink) {
            return;
        }
        match (key, self.ui.item(&self.roster)) {
            (Key::Up, _) => self.ui.move_up(),
            (Key::Down, _) => self.ui.move_down(&self.roster),
            (Key::Left | Key::Right, MenuItem::PowerOff) => {
                self.ui.set_display(false);
                sink.emit(&AppEvent::DisplayPower(false));
                info!("ui: display off");
            }
            (Key::Left, MenuItem::Channel(i)) => {
                self.adjust_threshold(i, -THRESHOLD_SHORT_STEP, true, now_ms, sink);
            }
            (Key::Right, MenuItem::Channel(i)) => {
                self.adjust_threshold(i, THRESHOLD_SHORT_STEP, true, now_ms, sink);
            }
        }
    }

    pub fn handle_long_repeat(&mut self, key: Key, now_ms: u32, sink: &mut impl EventSink) {
        if self.wake_display(sink) {
            return;
        }
        match (key, self.ui.item(&self.roster)) {
            (Key::Left, MenuItem::Channel(i)) => {
                self.adjust_threshold(i, -THRESHOLD_REPEAT_STEP, false, now_ms, sink);
            }
            (Key::Right, MenuItem::Channel(i)) => {
                self.adjust_threshold(i, THRESHOLD_REPEAT_STEP, false, now_ms, sink);
            }
            _ => {}
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (keypad dispatcher, broker).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::Key(event) => self.handle_key(event, now_ms, sink),
            AppCommand::Reconcile {
                specs,
                sample_interval_ms,
            } => {
                if let Some(interval) = sample_interval_ms {
                    let applied = self.config.set_sample_interval(interval);
                    info!("config: sample interval {} ms", applied);
                }
                self.reconcile(&specs, hw, sink);
            }
            AppCommand::SaveSettings => self.force_save_if_dirty(),
        }
    }

    // ── Display ───────────────────────────────────────────────

    pub fn menu_lines(&self) -> heapless::Vec<MenuLine, MAX_MENU_LINES> {
        ui::menu_lines(&self.roster, &self.ui)
    }

    /// Push display power (on change) and, while on, the menu.
    pub fn render(&mut self, display: &mut impl DisplayPort) {
        let on = self.ui.display_on();
        if self.applied_power != Some(on) {
            display.set_power(on);
            self.applied_power = Some(on);
        }
        if on {
            display.draw(&self.menu_lines());
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn store(&self) -> &SettingsStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SettingsStore<B> {
        &mut self.store
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn transition_count(&self) -> u32 {
        self.controller.transition_count()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Any key while the display is off only wakes it.
    fn wake_display(&mut self, sink: &mut impl EventSink) -> bool {
        if self.ui.display_on() {
            return false;
        }
        self.ui.set_display(true);
        sink.emit(&AppEvent::DisplayPower(true));
        info!("ui: display on");
        true
    }

    fn adjust_threshold(
        &mut self,
        index: usize,
        delta: i32,
        save_now: bool,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) {
        let Some(ch) = self.roster.select(index) else {
            return;
        };
        let (id, current) = (ch.id, ch.threshold);
        let Some(threshold) = self.roster.set_threshold(index, i32::from(current) + delta) else {
            return;
        };

        let persisted = match self.roster.mode() {
            RosterMode::Remote => false,
            RosterMode::Local => {
                self.store.set_threshold(index, threshold);
                if save_now {
                    match self.store.save() {
                        Ok(()) => {
                            self.settings_dirty = false;
                            true
                        }
                        Err(e) => {
                            warn!("store: save failed: {}", e);
                            self.mark_settings_dirty(now_ms);
                            false
                        }
                    }
                } else {
                    self.mark_settings_dirty(now_ms);
                    false
                }
            }
        };

        sink.emit(&AppEvent::ThresholdChanged {
            id,
            threshold,
            persisted,
        });
    }

    // ── Settings dirty-flag management ────────────────────────

    /// Start the deferred-save window if it is not already running.
    pub fn mark_settings_dirty(&mut self, now_ms: u32) {
        if !self.settings_dirty {
            self.settings_dirty = true;
            self.dirty_since_ms = now_ms;
        }
    }

    /// Save once [`SAVE_STORAGE_INTERVAL_MS`] has passed since the first
    /// unsaved change.  Returns `true` if the settings were saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u32) -> bool {
        if !self.settings_dirty {
            return false;
        }
        if now_ms.wrapping_sub(self.dirty_since_ms) < SAVE_STORAGE_INTERVAL_MS {
            return false;
        }
        match self.store.save() {
            Ok(()) => {
                self.settings_dirty = false;
                info!("store: settings auto-saved");
                true
            }
            Err(e) => {
                // Try again after another full window.
                self.dirty_since_ms = now_ms;
                warn!("store: auto-save failed: {}", e);
                false
            }
        }
    }

    /// Save now if anything is pending.
    pub fn force_save_if_dirty(&mut self) {
        if !self.settings_dirty {
            return;
        }
        match self.store.save() {
            Ok(()) => {
                self.settings_dirty = false;
                info!("store: settings force-saved");
            }
            Err(e) => warn!("store: force-save failed: {}", e),
        }
    }

    /// Whether threshold edits are waiting to be written.
    pub fn is_settings_dirty(&self) -> bool {
        self.settings_dirty
    }
}
