//! Named output line with in-memory state tracking.
//!
//! Every physical output on the panel (motor contactor, damper solenoids,
//! lamps) sits behind a `Relay`.  The relay owns the line, serialises writes
//! to it, remembers the last level it drove successfully, and turns a failed
//! write into a [`HardwareFault`] tagged with the line's name.
//!
//! Relays are forced off at construction so a reboot never resumes a
//! half-finished pattern.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use log::error;

use crate::app::ports::OutputLine;
use crate::error::HardwareFault;

pub struct Relay {
    name: &'static str,
    line: Mutex<Box<dyn OutputLine>>,
    energised: AtomicBool,
}

impl Relay {
    pub fn new(name: &'static str, line: Box<dyn OutputLine>) -> Result<Self, HardwareFault> {
        let relay = Self {
            name,
            line: Mutex::new(line),
            energised: AtomicBool::new(false),
        };
        relay.set(false)?;
        Ok(relay)
    }

    /// Drive the line.  On failure the tracked state is left unchanged.
    pub fn set(&self, on: bool) -> Result<(), HardwareFault> {
        let mut line = self.line.lock().unwrap_or_else(PoisonError::into_inner);
        match line.set_level(on) {
            Ok(()) => {
                self.energised.store(on, Ordering::Release);
                Ok(())
            }
            Err(kind) => {
                error!("{}: write {} failed ({:?})", self.name, on, kind);
                Err(HardwareFault::new(self.name, kind))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last level successfully driven.
    pub fn is_on(&self) -> bool {
        self.energised.load(Ordering::Acquire)
    }
}
