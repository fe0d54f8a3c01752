//! Port traits: the hardware boundary between panel logic and the outside world.
//!
//! ```text
//!   GPIO adapter ──▶ Port trait ──▶ drivers / PanelService (domain)
//! ```
//!
//! Output and input lines are plain `embedded-hal` digital pins; the
//! object-safe [`OutputLine`] / [`InputLine`] wrappers let the siren and the
//! panel hold them as trait objects without being generic over every pin
//! type a board might use.

use embedded_hal::digital::{Error as _, ErrorKind, InputPin, OutputPin};

use crate::fsm::Button;

// ───────────────────────────────────────────────────────────────
// Output lines (domain → relay board)
// ───────────────────────────────────────────────────────────────

/// One physical on/off output: motor contactor, damper solenoid, lamp.
pub trait OutputLine: Send {
    /// Drive the line.  `true` energises the load.
    fn set_level(&mut self, on: bool) -> Result<(), ErrorKind>;
}

impl<P> OutputLine for P
where
    P: OutputPin + Send,
{
    fn set_level(&mut self, on: bool) -> Result<(), ErrorKind> {
        let result = if on { self.set_high() } else { self.set_low() };
        result.map_err(|e| e.kind())
    }
}

// ───────────────────────────────────────────────────────────────
// Input lines (button → domain)
// ───────────────────────────────────────────────────────────────

/// One physical digital input.
pub trait InputLine: Send {
    /// Raw electrical level; `true` = high.
    fn read_level(&mut self) -> Result<bool, ErrorKind>;
}

impl<P> InputLine for P
where
    P: InputPin + Send,
{
    fn read_level(&mut self) -> Result<bool, ErrorKind> {
        self.is_high().map_err(|e| e.kind())
    }
}

/// Instantaneous state of the five panel buttons.
///
/// Implementations must be safe to query from any thread; the panel polls
/// every button each time it processes an edge.
pub trait ButtonPort: Send + Sync {
    /// `true` while `button` is physically held down.
    fn is_pressed(&self, button: Button) -> bool;
}
