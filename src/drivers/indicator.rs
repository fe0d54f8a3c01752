//! Panel lamps: green "ready" and red "alarm".
//!
//! Ready lights once the panel is constructed and stays lit; alarm is lit
//! for the lifetime of each actuation worker.  Lamp failures are logged by
//! the relay and otherwise ignored; a dead bulb must not stop the siren.

use crate::app::ports::OutputLine;
use crate::drivers::relay::Relay;
use crate::error::HardwareFault;

pub struct Indicators {
    ready: Relay,
    alarm: Relay,
}

impl Indicators {
    pub fn new(
        ready: Box<dyn OutputLine>,
        alarm: Box<dyn OutputLine>,
    ) -> Result<Self, HardwareFault> {
        let lamps = Self {
            ready: Relay::new("ready_led", ready)?,
            alarm: Relay::new("alarm_led", alarm)?,
        };
        lamps.ready.set(true)?;
        Ok(lamps)
    }

    pub fn set_alarm(&self, on: bool) {
        let _ = self.alarm.set(on);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_on()
    }

    pub fn is_alarm(&self) -> bool {
        self.alarm.is_on()
    }
}
