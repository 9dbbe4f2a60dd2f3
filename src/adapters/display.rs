//! Console display adapter.
//!
//! Stands in for the OLED: power changes and redrawn menus go to the log.
//! Redraws are deduplicated so a static menu does not flood the console.

use log::info;

use crate::app::ports::DisplayPort;
use crate::app::ui::{MenuLine, MAX_MENU_LINES};

#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    powered: bool,
    last: heapless::Vec<MenuLine, MAX_MENU_LINES>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplayPort for ConsoleDisplay {
    fn set_power(&mut self, on: bool) {
        self.powered = on;
        self.last.clear();
        info!("display: power {}", if on { "on" } else { "off" });
    }

    fn draw(&mut self, lines: &[MenuLine]) {
        if !self.powered || self.last.as_slice() == lines {
            return;
        }
        self.last.clear();
        for line in lines {
            let marker = if line.selected { '>' } else { ' ' };
            info!("display: {} {}", marker, line.text);
            let _ = self.last.push(line.clone());
        }
    }
}
