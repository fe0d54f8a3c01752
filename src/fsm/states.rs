//! Button transition table.
//!
//! Rows are evaluated top to bottom; the first that matches wins.
//!
//! | # | Current mode / held               | Edge                  | Result                     |
//! |---|-----------------------------------|-----------------------|----------------------------|
//! | 1 | `Locked`                          | any                   | ignored                    |
//! | 2 | `Test` + Test, `OffTest` + Cancel | press Alert / Fire    | close low / high damper    |
//! |   |                                   | release Alert / Fire  | open low / high damper     |
//! |   | `Test`                            | release Test          | `Idle`                     |
//! |   | `OffTest`                         | release Cancel        | `Idle` once nothing held   |
//! | 3 | `Attack`, Attack held             | press Fire            | `FireAttack`               |
//! | 4 | `Fire`, Fire held                 | press Attack          | `FireAttack`               |
//! | 5 | `Alert`, Alert held               | any press             | no-op                      |
//! | 6 | `FireAttack`, Fire+Attack held    | any press             | no-op                      |
//! | 7 | otherwise                         | press X               | mode of X (Cancel→OffTest) |
//! |   |                                   | release Cancel, empty | `Idle`                     |
//!
//! In `OffTest`, releasing a damper button while Cancel is already up
//! opens the damper and, once nothing is held, also returns to `Idle`.
//! A press while Cancel is up is the first button of a new combo (rule 7).

use super::{Button, Edge, Mode, PressedSet};

/// Which damper solenoid a combo drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Damper {
    High,
    Low,
}

impl Damper {
    /// Damper closed by holding `button` during Test / OffTest.
    fn for_button(button: Button) -> Option<Self> {
        match button {
            Button::Alert => Some(Self::Low),
            Button::Fire => Some(Self::High),
            _ => None,
        }
    }
}

/// What an edge means.  Both fields may be set (damper first, then mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    /// `(damper, closed)`
    pub damper: Option<(Damper, bool)>,
    pub mode: Option<Mode>,
}

impl Decision {
    pub const NONE: Self = Self {
        damper: None,
        mode: None,
    };

    const fn to(mode: Mode) -> Self {
        Self {
            damper: None,
            mode: Some(mode),
        }
    }

    pub fn is_none(&self) -> bool {
        self.damper.is_none() && self.mode.is_none()
    }
}

/// Decide what `edge` does given the current mode and the polled set of
/// held buttons.
///
/// `held` is corrected for the edge itself (the pressed button counts as
/// held, the released one as up) so a line that bounced between the edge
/// and the poll cannot flip the outcome.
pub fn decide(mode: Mode, held: PressedSet, edge: Edge) -> Decision {
    let held = match edge {
        Edge::Pressed(b) => held.with(b),
        Edge::Released(b) => held.without(b),
    };

    // 1
    if mode == Mode::Locked {
        return Decision::NONE;
    }

    // 2
    if damper_combo_live(mode, held, edge) {
        if let Some(damper) = Damper::for_button(edge.button()) {
            return match edge {
                Edge::Pressed(_) => Decision {
                    damper: Some((damper, true)),
                    mode: None,
                },
                Edge::Released(_) => Decision {
                    damper: Some((damper, false)),
                    mode: (mode == Mode::OffTest && held.is_empty()).then_some(Mode::Idle),
                },
            };
        }
        match (mode, edge) {
            (Mode::Test, Edge::Released(Button::Test)) => return Decision::to(Mode::Idle),
            (Mode::OffTest, Edge::Released(Button::Cancel)) => {
                return if held.is_empty() {
                    Decision::to(Mode::Idle)
                } else {
                    Decision::NONE
                };
            }
            _ => {}
        }
    }

    if let Edge::Pressed(pressed) = edge {
        let both = held.contains(Button::Fire) && held.contains(Button::Attack);
        match (mode, pressed) {
            // 3, 4
            (Mode::Attack, Button::Fire) | (Mode::Fire, Button::Attack) if both => {
                return Decision::to(Mode::FireAttack);
            }
            // 5, 6
            (Mode::Alert, _) if held.contains(Button::Alert) => return Decision::NONE,
            (Mode::FireAttack, _) if both => return Decision::NONE,
            _ => {}
        }
    }

    // 7
    match edge {
        Edge::Pressed(b) => Decision::to(b.first_press_mode()),
        Edge::Released(Button::Cancel) if held.is_empty() => Decision::to(Mode::Idle),
        Edge::Released(_) => Decision::NONE,
    }
}

/// Whether rule 2 governs `edge`: `Test` while Test is (or was, for its own
/// release) held, or `OffTest` while Cancel is held.
///
/// `OffTest` also keeps handling Alert / Fire releases after Cancel is up, so
/// a damper closed during the combo always reopens and the last release
/// idles the panel.  Presses with Cancel up fall through to rule 7.
fn damper_combo_live(mode: Mode, held: PressedSet, edge: Edge) -> bool {
    match mode {
        Mode::Test => held.contains(Button::Test) || edge == Edge::Released(Button::Test),
        Mode::OffTest => {
            held.contains(Button::Cancel)
                || matches!(
                    edge,
                    Edge::Released(Button::Cancel | Button::Alert | Button::Fire)
                )
        }
        _ => false,
    }
}
