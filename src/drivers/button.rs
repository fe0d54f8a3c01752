//! Panel button inputs and edge debouncing.
//!
//! ## Hardware
//!
//! Five momentary switches, active-low with pull-ups by default.
//! [`PanelInputs`] answers "is this button held right now?" by reading the
//! line; it is the [`ButtonPort`] the panel polls on every edge.
//!
//! ## Debounce
//!
//! [`Debouncer`] turns raw samples into press/release edges.  A new level
//! must be seen continuously for `debounce_ms` before it is reported; a
//! bounce back to the stable level restarts the window.
//!
//! | Stable | Raw sample          | Result                          |
//! |--------|---------------------|---------------------------------|
//! | low    | low                 | nothing, window cleared         |
//! | low    | high, < window      | nothing, window running         |
//! | low    | high, ≥ window      | edge `true`, stable = high      |

use std::sync::{Mutex, PoisonError};

use log::warn;

use crate::app::ports::{ButtonPort, InputLine};
use crate::fsm::{Button, Edge};

// ---------------------------------------------------------------------------
// Level reading
// ---------------------------------------------------------------------------

/// The five button lines, in [`Button::ALL`] order.
pub struct PanelInputs {
    lines: [Mutex<Box<dyn InputLine>>; 5],
    active_low: bool,
}

impl PanelInputs {
    pub fn new(lines: [Box<dyn InputLine>; 5], active_low: bool) -> Self {
        Self {
            lines: lines.map(Mutex::new),
            active_low,
        }
    }
}

impl ButtonPort for PanelInputs {
    fn is_pressed(&self, button: Button) -> bool {
        let mut line = self.lines[button as usize]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match line.read_level() {
            Ok(high) => high != self.active_low,
            Err(kind) => {
                // An unreadable button counts as released.
                warn!("{} button: read failed ({:?})", button.name(), kind);
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

/// Single-line debouncer.  `now_ms` is a monotonic millisecond clock
/// truncated to u32; wrap-around is handled.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    debounce_ms: u32,
    stable: bool,
    pending_since_ms: Option<u32>,
}

impl Debouncer {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            stable: false,
            pending_since_ms: None,
        }
    }

    /// Feed one sample.  Returns the new stable level when it changes.
    pub fn update(&mut self, raw: bool, now_ms: u32) -> Option<bool> {
        if raw == self.stable {
            self.pending_since_ms = None;
            return None;
        }
        let since = *self.pending_since_ms.get_or_insert(now_ms);
        if now_ms.wrapping_sub(since) >= self.debounce_ms {
            self.stable = raw;
            self.pending_since_ms = None;
            Some(raw)
        } else {
            None
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.stable
    }
}

/// Debouncers for all five buttons.
#[derive(Debug, Clone)]
pub struct PanelDebouncer {
    lines: [Debouncer; 5],
}

impl PanelDebouncer {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            lines: [Debouncer::new(debounce_ms); 5],
        }
    }

    /// Sample every button and collect the edges that became stable.
    pub fn sample(&mut self, mut is_pressed: impl FnMut(Button) -> bool, now_ms: u32) -> Vec<Edge> {
        Button::ALL
            .into_iter()
            .filter_map(|b| {
                self.lines[b as usize]
                    .update(is_pressed(b), now_ms)
                    .map(|pressed| if pressed { Edge::Pressed(b) } else { Edge::Released(b) })
            })
            .collect()
    }
}
