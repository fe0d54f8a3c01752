//! Button edge poller.
//!
//! Samples the five button lines every `poll_interval_ms`, debounces them,
//! and hands each stable edge to the panel on its own short-lived thread,
//! the way a GPIO interrupt callback would.  Edge threads queue on the
//! panel's button lock; the poller never waits for them between samples.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::app::service::PanelService;
use crate::config::TimingConfig;
use crate::drivers::button::PanelDebouncer;
use crate::drivers::cancel::{CancelToken, CancellationSignal};
use crate::drivers::task::{spawn_task, TaskRole};
use crate::error::Result;
use crate::fsm::Edge;

pub struct ButtonPoller {
    stop: Arc<CancellationSignal>,
    handle: Option<JoinHandle<()>>,
}

impl ButtonPoller {
    pub fn start(panel: Arc<PanelService>, timing: &TimingConfig) -> Result<Self> {
        let stop = Arc::new(CancellationSignal::new());
        let token = stop.arm();
        let debounce_ms = u32::try_from(timing.debounce_ms).unwrap_or(u32::MAX);
        let interval = timing.poll_interval();

        let handle = spawn_task(TaskRole::Poller, "button-poller\0", move || {
            poll_loop(&panel, &token, debounce_ms, interval);
        })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop sampling and wait for in-flight edges to be processed.
    pub fn stop(&mut self) {
        self.stop.cancel();
        self.join();
    }

    /// Block until the poller exits (normally never on hardware).
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("button poller panicked");
            }
        }
    }
}

impl Drop for ButtonPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Millisecond tick for the debouncer.  Wraps every ~49.7 days; the
/// debouncer compares ticks with wrapping arithmetic, so truncation here is
/// the intended wrap rather than a saturating clamp.
fn wrapping_ms(elapsed: Duration) -> u32 {
    (elapsed.as_millis() % (1u128 << 32)) as u32
}

fn poll_loop(panel: &Arc<PanelService>, stop: &CancelToken, debounce_ms: u32, interval: Duration) {
    info!("Button poller: debounce={}ms, interval={:?}", debounce_ms, interval);
    let origin = Instant::now();
    let mut debouncer = PanelDebouncer::new(debounce_ms);
    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();

    loop {
        let now_ms = wrapping_ms(origin.elapsed());
        for edge in debouncer.sample(|b| panel.is_pressed(b), now_ms) {
            let panel = Arc::clone(panel);
            let spawned = spawn_task(TaskRole::ButtonEdge, "button-edge\0", move || match edge {
                Edge::Pressed(b) => panel.button_pressed(b),
                Edge::Released(b) => panel.button_released(b),
            });
            match spawned {
                Ok(handle) => in_flight.push(handle),
                Err(e) => warn!("Dropped {:?}: {e}", edge),
            }
        }
        in_flight.retain(|h| !h.is_finished());

        if stop.wait(Some(interval)) {
            break;
        }
    }

    for handle in in_flight {
        let _ = handle.join();
    }
    info!("Button poller stopped");
}
