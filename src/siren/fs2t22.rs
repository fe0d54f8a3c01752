//! Federal Signal 2T22: rotor motor only.
//!
//! No solenoids, so the fire tones and damper combos have nothing to
//! drive.  The damper lines are still forced low at start-up in case
//! something is wired to them.

use crate::drivers::cancel::CancelToken;
use crate::drivers::motor::Motor;
use crate::drivers::relay::Relay;
use crate::error::HardwareFault;

use super::{Siren, SirenLines, Tone, ToneTiming};

pub struct Fs2t22 {
    motor: Motor,
    timing: ToneTiming,
}

impl Fs2t22 {
    pub fn new(lines: SirenLines, timing: ToneTiming) -> Result<Self, HardwareFault> {
        Relay::new("high_damper", lines.high_damper)?;
        Relay::new("low_damper", lines.low_damper)?;
        Ok(Self {
            motor: Motor::new(lines.motor)?,
            timing,
        })
    }
}

impl Siren for Fs2t22 {
    fn model(&self) -> &'static str {
        "2T22"
    }

    fn supports(&self, tone: Tone) -> bool {
        !matches!(tone, Tone::Fire | Tone::FireAttack)
    }

    fn alert(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        self.motor.on()?;
        cancel.wait(None);
        self.all_off()
    }

    fn attack(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        loop {
            self.motor.on()?;
            if cancel.wait(Some(self.timing.attack_phase)) {
                break;
            }
            self.motor.off()?;
            if cancel.wait(Some(self.timing.attack_phase)) {
                break;
            }
        }
        self.all_off()
    }

    fn set_motor(&self, on: bool) -> Result<(), HardwareFault> {
        self.motor.set(on)
    }

    fn all_off(&self) -> Result<(), HardwareFault> {
        self.motor.off()
    }

    fn is_energised(&self) -> bool {
        self.motor.is_running()
    }
}
