//! Panel service: the hexagonal core.
//!
//! [`PanelService`] owns the current [`Mode`], the single actuation worker
//! and the cancellation signal every tone pattern waits on.  Buttons,
//! console, REST and websocket adapters all drive it through the methods
//! here; hardware is reached only through the [`Siren`] capability set and
//! the [`ButtonPort`].
//!
//! ```text
//!  ButtonPort ──▶ ┌──────────────────────────────┐ ──▶ EventBus
//!                 │         PanelService          │
//!   adapters ───▶ │  decide · worker · cancel     │ ──▶ Siren
//!                 └──────────────────────────────┘
//! ```
//!
//! Lock order is `button_push_lock` → `worker` → `state`.  The worker
//! thread itself only ever takes `state`, so `change_mode` can hold the
//! worker slot while joining it.  Every worker carries the epoch it was
//! started under; `change_mode` bumps the epoch before cancelling, so a
//! worker that was pre-empted never writes `Idle` over the next mode.
//!
//! Event handlers run synchronously on the emitting thread and must not
//! call back into the command surface.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde_json::{json, Value};

use crate::drivers::cancel::CancellationSignal;
use crate::drivers::indicator::Indicators;
use crate::drivers::task::{spawn_task, TaskRole};
use crate::error::{CommandError, Error, Result};
use crate::fsm::{decide, Button, Damper, Edge, Mode, PressedSet};
use crate::siren::{Siren, Tone};

use super::commands::{
    duration_from_secs, CommandGroup, CommandTable, Control, DebugAction, PanelCommand, Request,
};
use super::events::{EventBus, EventHandler, HandlerId, PanelEvent};
use super::ports::ButtonPort;

struct ModeState {
    mode: Mode,
    epoch: u64,
}

struct ActuationWorker {
    tone: Tone,
    handle: JoinHandle<()>,
}

/// The panel state machine.
pub struct PanelService {
    siren: Arc<dyn Siren>,
    inputs: Box<dyn ButtonPort>,
    indicators: Option<Arc<Indicators>>,
    cancel: Arc<CancellationSignal>,
    /// Serialises button decisions; held for the whole of each edge.
    button_push_lock: Mutex<()>,
    worker: Mutex<Option<ActuationWorker>>,
    state: Arc<Mutex<ModeState>>,
    events: Arc<EventBus>,
    table: CommandTable,
}

impl PanelService {
    pub fn new(siren: Arc<dyn Siren>, inputs: Box<dyn ButtonPort>) -> Self {
        let table = CommandTable::for_siren(siren.as_ref());
        Self {
            siren,
            inputs,
            indicators: None,
            cancel: Arc::new(CancellationSignal::new()),
            button_push_lock: Mutex::new(()),
            worker: Mutex::new(None),
            state: Arc::new(Mutex::new(ModeState {
                mode: Mode::Idle,
                epoch: 0,
            })),
            events: Arc::new(EventBus::new()),
            table,
        }
    }

    /// Attach the panel lamps; the alarm lamp follows the actuation worker.
    #[must_use]
    pub fn with_indicators(mut self, indicators: Arc<Indicators>) -> Self {
        self.indicators = Some(indicators);
        self
    }

    /// Announce the panel to subscribers.
    pub fn start(&self) {
        let mode = self.mode();
        info!("Panel started ({}), mode {}", self.siren.model(), mode.name());
        self.events.emit(&PanelEvent::Started { mode });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.lock_state().mode
    }

    /// `true` while a tone mode is current.
    pub fn is_on(&self) -> bool {
        self.mode().tone().is_some()
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.inputs.is_pressed(button)
    }

    pub fn siren_model(&self) -> &'static str {
        self.siren.model()
    }

    /// Grouped command mapping for adapters.
    pub fn api_mappings(&self) -> &CommandTable {
        &self.table
    }

    pub fn status(&self) -> Value {
        let mode = self.mode();
        json!({
            "mode": mode,
            "is_on": mode.tone().is_some(),
            "model": self.siren.model(),
        })
    }

    // ── Button edges ──────────────────────────────────────────

    pub fn button_pressed(&self, button: Button) {
        self.handle_edge(Edge::Pressed(button));
    }

    pub fn button_released(&self, button: Button) {
        self.handle_edge(Edge::Released(button));
    }

    fn handle_edge(&self, edge: Edge) {
        let _serial = self
            .button_push_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let held = PressedSet::poll(|b| self.inputs.is_pressed(b));
        let mode = self.mode();
        let decision = decide(mode, held, edge);
        debug!(
            "{:?} in {} with held=0b{:05b} -> {:?}",
            edge,
            mode.name(),
            held.bits(),
            decision
        );

        if let Some((damper, closed)) = decision.damper {
            let result = match damper {
                Damper::High => self.siren.set_high_damper(closed),
                Damper::Low => self.siren.set_low_damper(closed),
            };
            if let Err(fault) = result {
                error!("Damper write failed: {fault}");
                self.events.emit(&PanelEvent::HardwareFault { line: fault.line });
            }
        }

        if let Some(next) = decision.mode {
            if let Err(e) = self.change_mode(next, None) {
                warn!("Edge {:?} could not enter {}: {e}", edge, next.name());
            }
        }
    }

    // ── Mode changes ──────────────────────────────────────────

    /// Enter `mode`, pre-empting whatever is running.
    ///
    /// Always cancels and joins the current worker first, so the hardware
    /// is quiet before the next pattern starts.  For tone modes exactly one
    /// new worker is started; with `duration` it ends on its own and the
    /// panel returns to `Idle`.
    pub fn change_mode(&self, mode: Mode, duration: Option<Duration>) -> Result<()> {
        if let Some(tone) = mode.tone() {
            if !self.siren.supports(tone) {
                warn!("{} has no {} pattern", self.siren.model(), tone.name());
                return Err(CommandError::Unsupported(tone.name()).into());
            }
        }

        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        self.stop_worker(&mut slot);

        if mode.tone().is_none() {
            if let Err(fault) = self.siren.all_off() {
                error!("Quiescing outputs failed: {fault}");
            }
        }

        let (prev, epoch) = {
            let mut state = self.lock_state();
            let prev = core::mem::replace(&mut state.mode, mode);
            (prev, state.epoch)
        };
        if prev != mode {
            info!("Mode {} -> {}", prev.name(), mode.name());
            self.events.emit(&PanelEvent::ModeChanged { from: prev, to: mode });
        }

        let Some(tone) = mode.tone() else {
            return Ok(());
        };
        match self.spawn_worker(tone, epoch, duration) {
            Ok(handle) => {
                *slot = Some(ActuationWorker { tone, handle });
                Ok(())
            }
            Err(e) => {
                error!("Could not start {} worker: {e}", tone.name());
                self.lock_state().mode = Mode::Idle;
                self.events.emit(&PanelEvent::ModeChanged { from: mode, to: Mode::Idle });
                Err(e)
            }
        }
    }

    /// Look up `name` and enter that mode.  Unknown names leave the mode
    /// unchanged.
    pub fn change_mode_named(&self, name: &str, duration: Option<Duration>) -> Result<()> {
        let mode = Mode::from_name(name).inspect_err(|e| warn!("{e}"))?;
        self.change_mode(mode, duration)
    }

    pub fn play(&self, tone: Tone, duration: Option<Duration>) -> Result<()> {
        self.change_mode(tone.into(), duration)
    }

    pub fn test(&self) -> Result<()> {
        self.play(Tone::Test, None)
    }

    pub fn alert(&self, duration: Option<Duration>) -> Result<()> {
        self.play(Tone::Alert, duration)
    }

    pub fn fire(&self, duration: Option<Duration>) -> Result<()> {
        self.play(Tone::Fire, duration)
    }

    pub fn attack(&self, duration: Option<Duration>) -> Result<()> {
        self.play(Tone::Attack, duration)
    }

    pub fn fire_attack(&self, duration: Option<Duration>) -> Result<()> {
        self.play(Tone::FireAttack, duration)
    }

    pub fn cancel(&self) -> Result<()> {
        self.change_mode(Mode::Idle, None)
    }

    /// Stop any pattern and ignore buttons until [`unlock`](Self::unlock).
    pub fn lock(&self) -> Result<()> {
        self.change_mode(Mode::Locked, None)
    }

    pub fn unlock(&self) -> Result<()> {
        self.change_mode(Mode::Idle, None)
    }

    /// Drive an output directly.  Refused unless the panel is idle.
    pub fn debug(&self, action: DebugAction) -> Result<()> {
        let _slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if self.mode() != Mode::Idle {
            return Err(CommandError::Busy.into());
        }
        let siren = &self.siren;
        match action {
            DebugAction::MotorOn => siren.set_motor(true),
            DebugAction::MotorOff => siren.set_motor(false),
            DebugAction::HighDamperClose => siren.set_high_damper(true),
            DebugAction::HighDamperOpen => siren.set_high_damper(false),
            DebugAction::LowDamperClose => siren.set_low_damper(true),
            DebugAction::LowDamperOpen => siren.set_low_damper(false),
            DebugAction::AllOff => siren.all_off(),
        }?;
        info!("Debug: {}", action.name());
        self.events.emit(&PanelEvent::Debug { action });
        Ok(())
    }

    // ── Adapter entry points ──────────────────────────────────

    pub fn invoke(&self, command: PanelCommand) -> Result<()> {
        match command {
            PanelCommand::Tone(tone, duration) => self.play(tone, duration),
            PanelCommand::Control(Control::Cancel) | PanelCommand::Off => self.cancel(),
            PanelCommand::Control(Control::Lock) => self.lock(),
            PanelCommand::Control(Control::Unlock) => self.unlock(),
            PanelCommand::Debug(action) => self.debug(action),
            PanelCommand::On(duration) => self.alert(duration),
        }
    }

    /// Handle one websocket request and produce its JSON response.
    pub fn handle_request(&self, text: &str) -> Value {
        match self.try_request(text) {
            Ok(response) => response,
            Err(Error::Command(e)) => e.error_payload(),
            Err(e) => json!({ "error": e.to_string() }),
        }
    }

    fn try_request(&self, text: &str) -> Result<Value> {
        match Request::parse(text)? {
            Request::GetTones => Ok(json!({ "tones": self.table.names(CommandGroup::Tone) })),
            Request::TurnOn { duration } => {
                self.invoke(PanelCommand::On(duration_from_secs(duration)?))?;
                Ok(self.status())
            }
            Request::TurnOff => {
                self.invoke(PanelCommand::Off)?;
                Ok(self.status())
            }
            Request::SetTone { tone, duration } => {
                let command =
                    self.table
                        .resolve(CommandGroup::Tone, &tone, duration_from_secs(duration)?)?;
                self.invoke(command)?;
                Ok(self.status())
            }
            Request::GetStatus => Ok(self.status()),
        }
    }

    pub fn add_event_handler(
        &self,
        handler: Arc<dyn EventHandler>,
    ) -> core::result::Result<HandlerId, CommandError> {
        self.events.add(handler)
    }

    pub fn remove_event_handler(&self, id: HandlerId) -> bool {
        self.events.remove(id)
    }

    // ── Worker supervision ────────────────────────────────────

    fn lock_state(&self) -> MutexGuard<'_, ModeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidate, cancel and join the current worker.
    fn stop_worker(&self, slot: &mut Option<ActuationWorker>) {
        self.lock_state().epoch += 1;
        self.cancel.cancel();
        if let Some(worker) = slot.take() {
            if worker.handle.join().is_err() {
                error!("{} worker panicked", worker.tone.name());
            } else {
                debug!("{} worker joined", worker.tone.name());
            }
        }
    }

    fn spawn_worker(
        &self,
        tone: Tone,
        epoch: u64,
        duration: Option<Duration>,
    ) -> Result<JoinHandle<()>> {
        let token = match duration {
            Some(d) => self.cancel.arm().with_deadline(d),
            None => self.cancel.arm(),
        };
        let siren = Arc::clone(&self.siren);
        let state = Arc::clone(&self.state);
        let events = Arc::clone(&self.events);
        let indicators = self.indicators.clone();
        let mode = Mode::from(tone);

        spawn_task(TaskRole::Actuation, "siren-worker\0", move || {
            info!("Worker start: {}", tone.name());
            if let Some(lamps) = &indicators {
                lamps.set_alarm(true);
            }

            if let Err(fault) = siren.play(tone, &token) {
                error!("{} aborted: {fault}", tone.name());
                if let Err(e) = siren.all_off() {
                    error!("Quiescing after fault failed: {e}");
                }
                events.emit(&PanelEvent::HardwareFault { line: fault.line });
            }

            if let Some(lamps) = &indicators {
                lamps.set_alarm(false);
            }

            // Ran out on its own (deadline or fault): fall back to Idle
            // unless a newer mode has already been requested.
            let finished = {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                let current = state.epoch == epoch && state.mode == mode;
                if current {
                    state.mode = Mode::Idle;
                }
                current
            };
            if finished {
                info!("Mode {} -> idle (worker finished)", mode.name());
                events.emit(&PanelEvent::ModeChanged { from: mode, to: Mode::Idle });
            } else {
                info!("Worker stop: {}", tone.name());
            }
        })
    }
}

impl Drop for PanelService {
    fn drop(&mut self) {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        self.stop_worker(&mut slot);
        let _ = self.siren.all_off();
    }
}
