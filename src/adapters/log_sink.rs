//! Log-based event handler.
//!
//! Writes every [`PanelEvent`] to the ESP-IDF logger (UART / USB-CDC in
//! production) as one `TAG | key=value` line.  A websocket push adapter
//! subscribes the same way.

use log::{error, info};

use crate::app::events::{EventHandler, PanelEvent};

/// Handler that logs every [`PanelEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventHandler for LogEventSink {
    fn handle(&self, event: &PanelEvent) {
        match event {
            PanelEvent::Started { mode } => {
                info!("START | mode={}", mode.name());
            }
            PanelEvent::ModeChanged { from, to } => {
                info!("MODE | from={} to={}", from.name(), to.name());
            }
            PanelEvent::Debug { action } => {
                info!("DEBUG | action={}", action.name());
            }
            PanelEvent::HardwareFault { line } => {
                error!("FAULT | line={}", line);
            }
        }
    }
}
