//! Integration tests for buttons → PanelService → siren → output lines.
//!
//! Everything runs against a real 3T22A (or 2T22) siren model wired to
//! recording mock pins.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use afpanel::app::commands::{CommandGroup, DebugAction};
use afpanel::app::events::PanelEvent;
use afpanel::app::service::PanelService;
use afpanel::error::{CommandError, Error};
use afpanel::fsm::{Button, Mode};

use crate::mock_hw::{
    eventually, fast_config, press, release, rig, two_tone_rig, CountingSiren, MockButtons, Rig,
};

const SETTLE: Duration = Duration::from_millis(500);

// ── Button combos ─────────────────────────────────────────────

#[test]
fn test_plus_alert_moves_low_damper_only() {
    let Rig { panel, board, buttons, .. } = rig();

    press(&panel, &buttons, Button::Test);
    assert_eq!(panel.mode(), Mode::Test);
    assert!(eventually(SETTLE, || board.level("motor")), "test runs the motor");

    press(&panel, &buttons, Button::Alert);
    assert!(board.level("low_damper"));
    assert_eq!(panel.mode(), Mode::Test);

    release(&panel, &buttons, Button::Alert);
    assert!(!board.level("low_damper"));
    assert_eq!(panel.mode(), Mode::Test);

    release(&panel, &buttons, Button::Test);
    assert_eq!(panel.mode(), Mode::Idle);
    assert!(!board.level("motor"));
    assert!(!board.ever_high("high_damper"));
}

#[test]
fn fire_then_attack_escalates_and_survives_release() {
    let Rig { panel, buttons, events, .. } = rig();

    press(&panel, &buttons, Button::Fire);
    assert_eq!(panel.mode(), Mode::Fire);
    press(&panel, &buttons, Button::Attack);
    assert_eq!(panel.mode(), Mode::FireAttack);

    // Releasing the combo keeps the tone going.
    release(&panel, &buttons, Button::Fire);
    release(&panel, &buttons, Button::Attack);
    assert_eq!(panel.mode(), Mode::FireAttack);

    // Cancel press stops it; letting go of Cancel on an empty panel idles.
    press(&panel, &buttons, Button::Cancel);
    assert_eq!(panel.mode(), Mode::OffTest);
    release(&panel, &buttons, Button::Cancel);
    assert_eq!(panel.mode(), Mode::Idle);

    assert_eq!(
        events.mode_changes(),
        vec![
            (Mode::Idle, Mode::Fire),
            (Mode::Fire, Mode::FireAttack),
            (Mode::FireAttack, Mode::OffTest),
            (Mode::OffTest, Mode::Idle),
        ]
    );
}

#[test]
fn off_test_keeps_dampers_live_until_panel_empty() {
    let Rig { panel, board, buttons, .. } = rig();

    press(&panel, &buttons, Button::Cancel);
    assert_eq!(panel.mode(), Mode::OffTest);
    press(&panel, &buttons, Button::Fire);
    assert!(board.level("high_damper"));
    assert!(!board.level("motor"));

    // Cancel up while Fire still held: stay in OffTest.
    release(&panel, &buttons, Button::Cancel);
    assert_eq!(panel.mode(), Mode::OffTest);
    assert!(board.level("high_damper"));

    // Last button up opens the damper and idles.
    release(&panel, &buttons, Button::Fire);
    assert!(!board.level("high_damper"));
    assert_eq!(panel.mode(), Mode::Idle);
}

#[test]
fn alert_held_swallows_every_press() {
    let Rig { panel, buttons, events, .. } = rig();
    press(&panel, &buttons, Button::Alert);
    press(&panel, &buttons, Button::Attack);
    assert_eq!(panel.mode(), Mode::Alert);
    press(&panel, &buttons, Button::Cancel);
    assert_eq!(panel.mode(), Mode::Alert);
    assert_eq!(events.mode_changes(), vec![(Mode::Idle, Mode::Alert)]);

    // With everything let go, Cancel stops the tone again.
    release(&panel, &buttons, Button::Cancel);
    release(&panel, &buttons, Button::Attack);
    release(&panel, &buttons, Button::Alert);
    assert_eq!(panel.mode(), Mode::Alert);
    press(&panel, &buttons, Button::Cancel);
    assert_eq!(panel.mode(), Mode::OffTest);
    release(&panel, &buttons, Button::Cancel);
    assert_eq!(panel.mode(), Mode::Idle);
}

#[test]
fn commanded_test_then_alert_press_starts_alert() {
    let Rig { panel, board, buttons, .. } = rig();
    panel.test().unwrap();
    assert_eq!(panel.mode(), Mode::Test);

    press(&panel, &buttons, Button::Alert);
    assert_eq!(panel.mode(), Mode::Alert);
    assert!(!board.ever_high("low_damper"), "no Test held, so no damper combo");
    panel.cancel().unwrap();
}

#[test]
fn locked_panel_ignores_buttons() {
    let Rig { panel, board, buttons, .. } = rig();
    panel.lock().unwrap();
    let writes = board.write_count("motor");

    press(&panel, &buttons, Button::Test);
    press(&panel, &buttons, Button::Fire);
    release(&panel, &buttons, Button::Fire);
    release(&panel, &buttons, Button::Test);
    thread::sleep(Duration::from_millis(50));

    assert_eq!(panel.mode(), Mode::Locked);
    assert_eq!(board.write_count("motor"), writes, "no actuation while locked");

    panel.unlock().unwrap();
    press(&panel, &buttons, Button::Alert);
    assert_eq!(panel.mode(), Mode::Alert);
    panel.cancel().unwrap();
}

#[test]
fn concurrent_edges_are_serialised() {
    let Rig { panel, buttons, .. } = rig();
    let handles: Vec<_> = Button::ALL
        .into_iter()
        .filter(|b| *b != Button::Cancel)
        .map(|b| {
            let (panel, buttons) = (Arc::clone(&panel), buttons.clone());
            thread::spawn(move || {
                for _ in 0..10 {
                    press(&panel, &buttons, b);
                    release(&panel, &buttons, b);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_ne!(panel.mode(), Mode::Locked);
    panel.cancel().unwrap();
    assert_eq!(panel.mode(), Mode::Idle);
}

// ── Worker supervision ────────────────────────────────────────

#[test]
fn repeated_change_mode_runs_one_worker() {
    let siren = Arc::new(CountingSiren::default());
    let panel = PanelService::new(siren.clone(), Box::new(MockButtons::default()));

    panel.change_mode(Mode::Fire, None).unwrap();
    panel.change_mode(Mode::Fire, None).unwrap();
    assert!(eventually(SETTLE, || siren.started() == 2));
    assert_eq!(panel.mode(), Mode::Fire);
    assert_eq!(siren.live(), 1);

    panel.cancel().unwrap();
    assert_eq!(siren.live(), 0);
    assert_eq!(siren.max_live(), 1);
}

#[test]
fn workers_never_overlap_under_contention() {
    let siren = Arc::new(CountingSiren::default());
    let panel = Arc::new(PanelService::new(siren.clone(), Box::new(MockButtons::default())));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let panel = Arc::clone(&panel);
            thread::spawn(move || {
                for n in 0..25 {
                    let _ = match (i + n) % 5 {
                        0 => panel.alert(None),
                        1 => panel.fire(None),
                        2 => panel.attack(None),
                        3 => panel.fire_attack(None),
                        _ => panel.cancel(),
                    };
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    panel.cancel().unwrap();

    assert_eq!(siren.max_live(), 1, "two patterns ran at once");
    assert_eq!(siren.live(), 0);
}

#[test]
fn cancel_joins_fire_within_one_phase() {
    let config = afpanel::config::PanelConfig::default();
    let rig = crate::mock_hw::rig_with(&config);

    rig.panel.fire(None).unwrap();
    assert!(eventually(SETTLE, || rig.board.ever_high("low_damper")));

    let started = Instant::now();
    rig.panel.cancel().unwrap();
    let took = started.elapsed();

    assert!(took <= Duration::from_millis(500), "cancel took {took:?}");
    assert!(!rig.board.level("motor"));
    assert!(!rig.board.level("high_damper"));
    assert!(!rig.board.level("low_damper"));
}

#[test]
fn fire_swings_dampers_alternately() {
    let Rig { panel, board, .. } = rig();
    panel.fire(None).unwrap();
    assert!(eventually(SETTLE, || board.write_count("high_damper") >= 4));
    panel.cancel().unwrap();

    // One coil at a time: never both closed after any write.
    let (mut high, mut low) = (false, false);
    for w in board.all_writes() {
        match w.line {
            "high_damper" => high = w.level,
            "low_damper" => low = w.level,
            _ => continue,
        }
        assert!(!(high && low), "both dampers closed at {:?}", w.at);
    }
}

/// Level changes on `line`, starting from its idle-low state.
fn edges(board: &crate::mock_hw::Board, line: &str) -> Vec<(bool, Instant)> {
    let mut last = false;
    let mut out = Vec::new();
    for w in board.writes(line) {
        if w.level != last {
            out.push((w.level, w.at));
            last = w.level;
        }
    }
    out
}

fn assert_all_low(board: &crate::mock_hw::Board) {
    for line in ["motor", "high_damper", "low_damper"] {
        assert!(!board.level(line), "{line} left energised");
    }
}

#[test]
fn attack_pulses_motor_every_phase() {
    let Rig { panel, board, .. } = rig();
    let phase = fast_config().timing.attack_phase();

    panel.attack(None).unwrap();
    assert!(eventually(Duration::from_secs(2), || edges(&board, "motor").len() >= 5));
    panel.cancel().unwrap();
    assert_all_low(&board);

    let motor = edges(&board, "motor");
    // The last edge is the cancel, which may cut a phase short.
    let pattern = &motor[..motor.len() - 1];
    for (i, (level, _)) in pattern.iter().enumerate() {
        assert_eq!(*level, i % 2 == 0, "motor edge {i} out of order");
    }
    for pair in pattern.windows(2) {
        let gap = pair[1].1 - pair[0].1;
        assert!(gap >= phase, "motor toggled after {gap:?}");
    }
    assert!(!board.ever_high("high_damper"));
    assert!(!board.ever_high("low_damper"));
}

#[test]
fn fire_attack_toggles_motor_per_block_while_dampers_swing() {
    let Rig { panel, board, .. } = rig();
    let timing = fast_config().timing;
    let block = timing.fire_attack_block as usize;
    let block_time = timing.fire_phase() * timing.fire_attack_block;

    panel.fire_attack(None).unwrap();
    assert!(eventually(Duration::from_secs(2), || edges(&board, "motor").len() >= 4));
    panel.cancel().unwrap();
    assert_all_low(&board);

    let motor = edges(&board, "motor");
    let pattern = &motor[..motor.len() - 1];
    for (i, (level, _)) in pattern.iter().enumerate() {
        assert_eq!(*level, i % 2 == 0, "motor edge {i} out of order");
    }
    for pair in pattern.windows(2) {
        let gap = pair[1].1 - pair[0].1;
        assert!(gap >= block_time, "motor toggled after {gap:?}");
    }

    // Walk every write in order: count damper closings per motor block and
    // check that closings alternate low, high, low, ...
    let mut closings = Vec::new();
    let mut per_block = Vec::new();
    let mut in_block = 0;
    let mut motor_level = false;
    for w in board.all_writes() {
        match (w.line, w.level) {
            ("motor", level) if level != motor_level => {
                if motor_level || !per_block.is_empty() || in_block > 0 {
                    per_block.push(in_block);
                }
                in_block = 0;
                motor_level = level;
            }
            ("high_damper" | "low_damper", true) => {
                closings.push(w.line);
                in_block += 1;
            }
            _ => {}
        }
    }
    // Whole blocks only: the final entry is the block the cancel cut short.
    let whole = &per_block[..per_block.len() - 1];
    assert!(whole.len() >= 2, "blocks seen: {per_block:?}");
    assert!(whole.iter().all(|&n| n == block), "closings per block: {per_block:?}");
    for (i, line) in closings.iter().enumerate() {
        let expected = if i % 2 == 0 { "low_damper" } else { "high_damper" };
        assert_eq!(*line, expected, "closing {i}");
    }
}

#[test]
fn timed_tone_returns_to_idle() {
    let Rig { panel, board, events, .. } = rig();
    panel.alert(Some(Duration::from_millis(60))).unwrap();
    assert!(panel.is_on());

    assert!(eventually(SETTLE, || panel.mode() == Mode::Idle));
    assert!(!panel.is_on());
    assert!(!board.level("motor"));
    assert_eq!(
        events.mode_changes(),
        vec![(Mode::Idle, Mode::Alert), (Mode::Alert, Mode::Idle)]
    );
}

#[test]
fn preempted_timed_tone_does_not_idle_successor() {
    let Rig { panel, .. } = rig();
    panel.alert(Some(Duration::from_millis(30))).unwrap();
    panel.attack(None).unwrap();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(panel.mode(), Mode::Attack);
    panel.cancel().unwrap();
}

#[test]
fn hardware_fault_folds_back_to_idle() {
    let Rig { panel, board, events, .. } = rig();
    board.fail("motor");

    panel.alert(None).unwrap();
    assert!(eventually(SETTLE, || panel.mode() == Mode::Idle));
    assert!(events
        .events()
        .contains(&PanelEvent::HardwareFault { line: "motor" }));

    // Still safe to drive afterwards.
    panel.cancel().unwrap();
    assert_eq!(panel.mode(), Mode::Idle);
}

#[test]
fn alarm_lamp_follows_worker() {
    let Rig { panel, board, .. } = rig();
    assert!(board.level("ready_led"));
    panel.attack(None).unwrap();
    assert!(eventually(SETTLE, || board.level("alarm_led")));
    panel.cancel().unwrap();
    assert!(!board.level("alarm_led"));
}

// ── Watchdog ──────────────────────────────────────────────────

#[test]
fn debug_damper_is_dropped_by_watchdog() {
    let mut config = crate::mock_hw::fast_config();
    config.timing.max_on_time_ms = 150;
    let Rig { panel, board, events, .. } = crate::mock_hw::rig_with(&config);

    panel.debug(DebugAction::HighDamperClose).unwrap();
    assert!(board.level("high_damper"));
    assert!(events
        .events()
        .contains(&PanelEvent::Debug { action: DebugAction::HighDamperClose }));

    thread::sleep(Duration::from_millis(150 + 50 + 100));
    assert!(!board.level("high_damper"), "watchdog did not trip");

    let writes = board.writes("high_damper");
    let on = writes.iter().rev().find(|w| w.level).unwrap();
    let off = writes.last().unwrap();
    assert!(off.at.duration_since(on.at) <= Duration::from_millis(150 + 50 + 50));
}

#[test]
fn debug_refused_unless_idle() {
    let Rig { panel, .. } = rig();
    panel.alert(None).unwrap();
    assert_eq!(
        panel.debug(DebugAction::MotorOff),
        Err(Error::Command(CommandError::Busy))
    );
    panel.cancel().unwrap();
    assert!(panel.debug(DebugAction::AllOff).is_ok());
}

// ── Command surface ───────────────────────────────────────────

#[test]
fn unknown_mode_name_is_rejected() {
    let Rig { panel, events, .. } = rig();
    let err = panel.change_mode_named("whoop", None).unwrap_err();
    assert_eq!(err, Error::Command(CommandError::UnknownMode("whoop".into())));
    assert_eq!(panel.mode(), Mode::Idle);
    assert!(events.mode_changes().is_empty());
}

#[test]
fn two_tone_refuses_fire() {
    let Rig { panel, board, .. } = two_tone_rig();
    assert_eq!(
        panel.fire(None),
        Err(Error::Command(CommandError::Unsupported("fire")))
    );
    assert_eq!(panel.mode(), Mode::Idle);
    assert_eq!(
        panel.api_mappings().names(CommandGroup::Tone),
        vec!["alert", "attack", "test"]
    );

    panel.attack(None).unwrap();
    assert!(eventually(SETTLE, || board.level("motor")));
    panel.cancel().unwrap();
    assert!(!board.ever_high("high_damper"));
}

#[test]
fn websocket_requests() {
    let Rig { panel, .. } = rig();

    let tones = panel.handle_request(r#"{"request":"get_tones"}"#);
    assert_eq!(tones["tones"].as_array().map(Vec::len), Some(5));

    let on = panel.handle_request(r#"{"request":"turn_on","duration":5}"#);
    assert_eq!(on["mode"], "alert");
    assert_eq!(on["is_on"], true);

    let tone = panel.handle_request(r#"{"request":"set_tone","tone":"fire_attack"}"#);
    assert_eq!(tone["mode"], "fire_attack");

    let bad = panel.handle_request(r#"{"request":"set_tone","tone":"whoop"}"#);
    assert_eq!(bad["error"], "Tone whoop not valid");
    assert_eq!(panel.mode(), Mode::FireAttack);

    let off = panel.handle_request(r#"{"request":"turn_off"}"#);
    assert_eq!(off["mode"], "idle");

    let garbage = panel.handle_request("not json");
    assert!(garbage["error"].as_str().unwrap().starts_with("bad request"));
}

#[test]
fn removed_handler_hears_nothing() {
    let Rig { panel, .. } = rig();
    let extra = crate::mock_hw::EventLog::default();
    let id = panel.add_event_handler(Arc::new(extra.clone())).unwrap();
    panel.lock().unwrap();
    assert!(panel.remove_event_handler(id));
    panel.unlock().unwrap();
    assert_eq!(extra.mode_changes(), vec![(Mode::Idle, Mode::Locked)]);
}
