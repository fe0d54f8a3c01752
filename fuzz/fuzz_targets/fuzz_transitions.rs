//! Fuzz target: button transition table
//!
//! Interprets each byte as a button toggle on a simulated panel and drives
//! `decide` with the resulting edges, verifying:
//! - Buttons never enter or leave `Locked`
//! - Dampers only move in `Test` / `OffTest`
//! - A release never starts a tone
//!
//! cargo fuzz run fuzz_transitions

#![no_main]

use afpanel::fsm::{decide, Button, Edge, Mode, PressedSet};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let mut mode = Mode::ALL[first as usize % Mode::ALL.len()];
    let locked = mode == Mode::Locked;
    let mut held = PressedSet::empty();

    for &byte in rest {
        let button = Button::ALL[byte as usize % Button::ALL.len()];
        let edge = if held.contains(button) {
            held = held.without(button);
            Edge::Released(button)
        } else {
            held = held.with(button);
            Edge::Pressed(button)
        };

        let decision = decide(mode, held, edge);
        if decision.damper.is_some() {
            assert!(matches!(mode, Mode::Test | Mode::OffTest));
        }
        if let (Edge::Released(_), Some(next)) = (edge, decision.mode) {
            assert_eq!(next, Mode::Idle);
        }
        if let Some(next) = decision.mode {
            mode = next;
        }
        assert_eq!(mode == Mode::Locked, locked);
    }
});
