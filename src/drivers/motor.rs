//! Siren rotor motor driver.
//!
//! A single contactor relay.  The motor has no duty limit, so unlike the
//! damper solenoids it needs no watchdog; this driver is a dumb actuator.

use crate::app::ports::OutputLine;
use crate::drivers::relay::Relay;
use crate::error::HardwareFault;

pub struct Motor {
    relay: Relay,
}

impl Motor {
    pub fn new(line: Box<dyn OutputLine>) -> Result<Self, HardwareFault> {
        Ok(Self {
            relay: Relay::new("motor", line)?,
        })
    }

    pub fn on(&self) -> Result<(), HardwareFault> {
        self.relay.set(true)
    }

    pub fn off(&self) -> Result<(), HardwareFault> {
        self.relay.set(false)
    }

    pub fn set(&self, on: bool) -> Result<(), HardwareFault> {
        self.relay.set(on)
    }

    pub fn is_running(&self) -> bool {
        self.relay.is_on()
    }
}
