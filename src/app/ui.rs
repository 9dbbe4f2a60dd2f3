//! Menu model for the display: one row per channel, then POWER OFF.
//!
//! Holds selection and display power only.  Key handling lives in the
//! service, which owns the roster and store this menu points into.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::config::MAX_DEVICES;
use crate::roster::Roster;

pub const MENU_LINE_LEN: usize = 32;
pub const MAX_MENU_LINES: usize = MAX_DEVICES + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    /// Roster position.
    Channel(usize),
    PowerOff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLine {
    pub text: String<MENU_LINE_LEN>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    selected: usize,
    display_on: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            display_on: true,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn item(&self, roster: &Roster) -> MenuItem {
        if self.selected < roster.len() {
            MenuItem::Channel(self.selected)
        } else {
            MenuItem::PowerOff
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Last row is POWER OFF; no wrap.
    pub fn move_down(&mut self, roster: &Roster) {
        if self.selected < roster.len() {
            self.selected += 1;
        }
    }

    /// Keep the cursor on a row that still exists after a roster swap.
    pub fn clamp_to(&mut self, roster: &Roster) {
        self.selected = self.selected.min(roster.len());
    }

    pub fn display_on(&self) -> bool {
        self.display_on
    }

    pub fn set_display(&mut self, on: bool) {
        self.display_on = on;
    }
}

/// Render the text rows for the current roster and cursor.
pub fn menu_lines(roster: &Roster, ui: &UiState) -> Vec<MenuLine, MAX_MENU_LINES> {
    let mut lines = Vec::new();
    for (i, ch) in roster.channels().iter().enumerate() {
        let mut text = String::new();
        let _ = write!(text, "S{}: {} T: {}", i + 1, ch.last_value, ch.threshold);
        let _ = lines.push(MenuLine {
            text,
            selected: ui.selected() == i,
        });
    }
    let mut text = String::new();
    let _ = text.push_str("[POWER OFF]");
    let _ = lines.push(MenuLine {
        text,
        selected: ui.selected() == roster.len(),
    });
    lines
}
