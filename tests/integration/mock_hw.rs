//! Mock hardware for integration tests.
//!
//! A [`Board`] records every write to every named output line with a
//! timestamp, so tests can assert on the full actuation history without
//! real GPIO.  Lines can be told to fail to exercise the fault path.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use afpanel::app::events::{EventHandler, PanelEvent};
use afpanel::app::ports::ButtonPort;
use afpanel::app::service::PanelService;
use afpanel::config::{PanelConfig, SirenModel, TimingConfig};
use afpanel::drivers::cancel::CancelToken;
use afpanel::drivers::indicator::Indicators;
use afpanel::error::HardwareFault;
use afpanel::fsm::{Button, Mode};
use afpanel::siren::{self, Siren, SirenLines};
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

// ── Output lines ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Write {
    pub line: &'static str,
    pub level: bool,
    pub at: Instant,
}

#[derive(Default)]
struct BoardInner {
    writes: Mutex<Vec<Write>>,
    failing: Mutex<HashSet<&'static str>>,
}

/// Shared recorder behind every [`MockPin`].
#[derive(Clone, Default)]
pub struct Board(Arc<BoardInner>);

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&self, line: &'static str) -> MockPin {
        MockPin {
            line,
            board: self.clone(),
        }
    }

    pub fn siren_lines(&self) -> SirenLines {
        SirenLines {
            motor: Box::new(self.pin("motor")),
            high_damper: Box::new(self.pin("high_damper")),
            low_damper: Box::new(self.pin("low_damper")),
        }
    }

    /// Make every later write to `line` fail.
    pub fn fail(&self, line: &'static str) {
        self.0.failing.lock().unwrap().insert(line);
    }

    /// Every successful write, in the order it happened.
    pub fn all_writes(&self) -> Vec<Write> {
        self.0.writes.lock().unwrap().clone()
    }

    pub fn writes(&self, line: &str) -> Vec<Write> {
        self.0
            .writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.line == line)
            .copied()
            .collect()
    }

    pub fn write_count(&self, line: &str) -> usize {
        self.writes(line).len()
    }

    /// Last level written to `line` (low if never written).
    pub fn level(&self, line: &str) -> bool {
        self.writes(line).last().is_some_and(|w| w.level)
    }

    /// Whether `line` was ever driven high.
    pub fn ever_high(&self, line: &str) -> bool {
        self.writes(line).iter().any(|w| w.level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct MockPin {
    line: &'static str,
    board: Board,
}

impl MockPin {
    fn write(&mut self, level: bool) -> Result<(), MockPinError> {
        if self.board.0.failing.lock().unwrap().contains(self.line) {
            return Err(MockPinError);
        }
        self.board.0.writes.lock().unwrap().push(Write {
            line: self.line,
            level,
            at: Instant::now(),
        });
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

// ── Buttons ───────────────────────────────────────────────────

/// Five held flags shared between the test and the panel.
#[derive(Clone, Default)]
pub struct MockButtons(Arc<[AtomicBool; 5]>);

impl MockButtons {
    pub fn hold(&self, button: Button, held: bool) {
        self.0[button as usize].store(held, Ordering::SeqCst);
    }
}

impl ButtonPort for MockButtons {
    fn is_pressed(&self, button: Button) -> bool {
        self.0[button as usize].load(Ordering::SeqCst)
    }
}

/// Hold `button` and deliver its press edge.
pub fn press(panel: &PanelService, buttons: &MockButtons, button: Button) {
    buttons.hold(button, true);
    panel.button_pressed(button);
}

/// Let go of `button` and deliver its release edge.
pub fn release(panel: &PanelService, buttons: &MockButtons, button: Button) {
    buttons.hold(button, false);
    panel.button_released(button);
}

// ── Events ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<PanelEvent>>>);

impl EventLog {
    pub fn events(&self) -> Vec<PanelEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn mode_changes(&self) -> Vec<(Mode, Mode)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PanelEvent::ModeChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }
}

impl EventHandler for EventLog {
    fn handle(&self, event: &PanelEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

// ── Counting siren ────────────────────────────────────────────

/// Siren whose every tone blocks until cancelled, counting how many
/// patterns are live at once.
#[derive(Default)]
pub struct CountingSiren {
    live: AtomicUsize,
    max_live: AtomicUsize,
    started: AtomicUsize,
}

impl CountingSiren {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    fn run(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(now, Ordering::SeqCst);
        self.started.fetch_add(1, Ordering::SeqCst);
        cancel.wait(None);
        self.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Siren for CountingSiren {
    fn model(&self) -> &'static str {
        "counting"
    }
    fn alert(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        self.run(cancel)
    }
    fn fire(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        self.run(cancel)
    }
    fn attack(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        self.run(cancel)
    }
    fn fire_attack(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        self.run(cancel)
    }
    fn set_motor(&self, _on: bool) -> Result<(), HardwareFault> {
        Ok(())
    }
    fn all_off(&self) -> Result<(), HardwareFault> {
        Ok(())
    }
    fn is_energised(&self) -> bool {
        self.live() > 0
    }
}

// ── Fixtures ──────────────────────────────────────────────────

/// Timing short enough that no test waits seconds.
pub fn fast_config() -> PanelConfig {
    PanelConfig {
        timing: TimingConfig {
            max_on_time_ms: 2_000,
            watchdog_step_ms: 50,
            fire_phase_ms: 20,
            attack_phase_ms: 40,
            fire_attack_block: 4,
            debounce_ms: 5,
            poll_interval_ms: 1,
        },
        ..PanelConfig::default()
    }
}

pub struct Rig {
    pub panel: Arc<PanelService>,
    pub board: Board,
    pub buttons: MockButtons,
    pub events: EventLog,
}

pub fn rig_with(config: &PanelConfig) -> Rig {
    let board = Board::new();
    let buttons = MockButtons::default();
    let siren = siren::build(config, board.siren_lines()).unwrap();
    let lamps = Indicators::new(
        Box::new(board.pin("ready_led")),
        Box::new(board.pin("alarm_led")),
    )
    .unwrap();
    let panel = PanelService::new(siren, Box::new(buttons.clone()))
        .with_indicators(Arc::new(lamps));
    let events = EventLog::default();
    panel.add_event_handler(Arc::new(events.clone())).unwrap();
    Rig {
        panel: Arc::new(panel),
        board,
        buttons,
        events,
    }
}

/// A 3T22A panel with [`fast_config`] timing.
pub fn rig() -> Rig {
    rig_with(&fast_config())
}

pub fn two_tone_rig() -> Rig {
    let config = PanelConfig {
        model: SirenModel::Fs2t22,
        ..fast_config()
    };
    rig_with(&config)
}

/// Poll `cond` until it holds or `limit` passes.
pub fn eventually(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
