//! Damper solenoid driver with a continuous-on watchdog.
//!
//! ## Safety contract
//!
//! A damper coil must never stay energised longer than `max_on` (5 s by
//! default), whether or not anyone calls [`GuardedActuator::off`].  Every
//! `on()` that actually energises the coil starts a watchdog thread that
//! sleeps in increments of at most `step` (≤ 1 s) and forces the line low
//! once the budget is spent.
//!
//! - `on()` while the watchdog is still running is a no-op.
//! - `off()` drops the line immediately, stops the watchdog and joins it
//!   before returning, so no watchdog outlives an `off()` call.  The join
//!   is bounded by one `step`.
//!
//! `on()` and `off()` are serialised by the watchdog slot lock.  The
//! watchdog thread never takes that lock, only the relay's.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use embedded_hal::digital::ErrorKind;
use log::{debug, error, warn};

use crate::app::ports::OutputLine;
use crate::drivers::cancel::{CancelToken, CancellationSignal};
use crate::drivers::relay::Relay;
use crate::drivers::task::{spawn_task, TaskRole};
use crate::error::HardwareFault;

struct Watchdog {
    stop: Arc<CancellationSignal>,
    handle: JoinHandle<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Idle,
    Running,
}

pub struct GuardedActuator {
    relay: Arc<Relay>,
    max_on: Duration,
    step: Duration,
    watchdog: Mutex<Option<Watchdog>>,
}

impl GuardedActuator {
    pub fn new(
        name: &'static str,
        line: Box<dyn OutputLine>,
        max_on: Duration,
        step: Duration,
    ) -> Result<Self, HardwareFault> {
        Ok(Self {
            relay: Arc::new(Relay::new(name, line)?),
            max_on,
            step: step.min(Duration::from_secs(1)),
            watchdog: Mutex::new(None),
        })
    }

    /// Energise the coil and arm its watchdog.
    pub fn on(&self) -> Result<(), HardwareFault> {
        let mut slot = self.watchdog.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            return Ok(());
        }
        // Reap a watchdog that already tripped.
        if let Some(tripped) = slot.take() {
            let _ = tripped.handle.join();
        }

        self.relay.set(true)?;

        let stop = Arc::new(CancellationSignal::new());
        let token = stop.arm();
        let relay = Arc::clone(&self.relay);
        let (max_on, step) = (self.max_on, self.step);
        match spawn_task(TaskRole::Watchdog, "coil-watchdog\0", move || {
            run_watchdog(&relay, &token, max_on, step);
        }) {
            Ok(handle) => {
                *slot = Some(Watchdog { stop, handle });
                Ok(())
            }
            Err(e) => {
                error!("{}: {}; refusing to leave coil unguarded", self.relay.name(), e);
                let _ = self.relay.set(false);
                Err(HardwareFault::new(self.relay.name(), ErrorKind::Other))
            }
        }
    }

    /// De-energise the coil and stop its watchdog.
    pub fn off(&self) -> Result<(), HardwareFault> {
        let mut slot = self.watchdog.lock().unwrap_or_else(PoisonError::into_inner);
        let result = self.relay.set(false);
        if let Some(watchdog) = slot.take() {
            watchdog.stop.cancel();
            let _ = watchdog.handle.join();
        }
        result
    }

    pub fn set(&self, on: bool) -> Result<(), HardwareFault> {
        if on { self.on() } else { self.off() }
    }

    pub fn is_on(&self) -> bool {
        self.relay.is_on()
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        let slot = self.watchdog.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(w) if !w.handle.is_finished() => WatchdogState::Running,
            _ => WatchdogState::Idle,
        }
    }
}

impl Drop for GuardedActuator {
    fn drop(&mut self) {
        let _ = self.off();
    }
}

fn run_watchdog(relay: &Relay, token: &CancelToken, max_on: Duration, step: Duration) {
    let started = Instant::now();
    loop {
        let left = max_on.saturating_sub(started.elapsed());
        if left.is_zero() {
            break;
        }
        if token.wait(Some(left.min(step))) {
            debug!("{}: watchdog stopped", relay.name());
            return;
        }
    }

    warn!(
        "{}: energised for {:?}, watchdog forcing off",
        relay.name(),
        max_on
    );
    // A failed write here is already logged by the relay; nothing to retry.
    let _ = relay.set(false);
}
