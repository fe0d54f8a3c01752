//! Federal Signal 3T22A: rotor motor plus high and low damper solenoids.
//!
//! | Tone         | Pattern                                                  |
//! |--------------|----------------------------------------------------------|
//! | alert / test | motor on until cancelled                                 |
//! | fire         | motor on; dampers swing low/high every `fire_phase`      |
//! | attack       | motor on/off every `attack_phase`                        |
//! | fire_attack  | fire's damper swing, motor toggled every `block` phases  |
//!
//! A fire phase energises one damper coil at a time; the solenoid
//! watchdog still caps each coil at `max_on` if the pattern stalls.

use log::debug;

use crate::drivers::cancel::CancelToken;
use crate::drivers::motor::Motor;
use crate::drivers::solenoid::GuardedActuator;
use crate::error::HardwareFault;

use super::{Siren, SirenLines, ToneTiming};

pub struct Fs3t22a {
    motor: Motor,
    high: GuardedActuator,
    low: GuardedActuator,
    timing: ToneTiming,
}

impl Fs3t22a {
    pub fn new(lines: SirenLines, timing: ToneTiming) -> Result<Self, HardwareFault> {
        Ok(Self {
            motor: Motor::new(lines.motor)?,
            high: GuardedActuator::new(
                "high_damper",
                lines.high_damper,
                timing.max_on,
                timing.watchdog_step,
            )?,
            low: GuardedActuator::new(
                "low_damper",
                lines.low_damper,
                timing.max_on,
                timing.watchdog_step,
            )?,
            timing,
        })
    }

    /// One half-cycle of the fire swing.  Even phases close the low damper,
    /// odd phases the high one.  Returns `true` if cancelled.
    fn fire_phase(&self, phase: u32, cancel: &CancelToken) -> Result<bool, HardwareFault> {
        if phase % 2 == 0 {
            self.high.off()?;
            self.low.on()?;
        } else {
            self.low.off()?;
            self.high.on()?;
        }
        Ok(cancel.wait(Some(self.timing.fire_phase)))
    }
}

impl Siren for Fs3t22a {
    fn model(&self) -> &'static str {
        "3T22A"
    }

    fn alert(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        self.motor.on()?;
        cancel.wait(None);
        self.all_off()
    }

    fn fire(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        self.motor.on()?;
        let mut phase = 0u32;
        while !self.fire_phase(phase, cancel)? {
            phase = phase.wrapping_add(1);
        }
        debug!("fire: cancelled after {} phases", phase.wrapping_add(1));
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

    fn fire_attack(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        let block = self.timing.fire_attack_block.max(1);
        let mut phase = 0u32;
        'wail: loop {
            for motor_on in [true, false] {
                self.motor.set(motor_on)?;
                for _ in 0..block {
                    if self.fire_phase(phase, cancel)? {
                        break 'wail;
                    }
                    phase = phase.wrapping_add(1);
                }
            }
        }
        self.all_off()
    }

    fn set_high_damper(&self, closed: bool) -> Result<(), HardwareFault> {
        self.high.set(closed)
    }

    fn set_low_damper(&self, closed: bool) -> Result<(), HardwareFault> {
        self.low.set(closed)
    }

    fn set_motor(&self, on: bool) -> Result<(), HardwareFault> {
        self.motor.set(on)
    }

    fn all_off(&self) -> Result<(), HardwareFault> {
        let motor = self.motor.off();
        let high = self.high.off();
        let low = self.low.off();
        motor.and(high).and(low)
    }

    fn is_energised(&self) -> bool {
        self.motor.is_running() || self.high.is_on() || self.low.is_on()
    }
}
