//! Panel mode state machine: identities and the button transition table.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  GPIO edge ──▶ PressedSet (polled) ──▶ decide(mode, held, edge)│
//! │                                           │                   │
//! │                            ┌──────────────┴─────────────┐     │
//! │                            ▼                            ▼     │
//! │                      damper effect                new Mode    │
//! │                 (Test / OffTest combos)      (change_mode)    │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module is pure: it never touches hardware or threads.  The
//! [`PanelService`](crate::app::service::PanelService) polls the buttons,
//! asks [`states::decide`] what an edge means, and carries out the result.

pub mod context;
pub mod states;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::siren::Tone;

pub use context::PressedSet;
pub use states::{decide, Damper, Decision};

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// What the siren is doing.  Exactly one is current at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Mode {
    #[default]
    Idle = 0,
    Test = 1,
    Alert = 2,
    Fire = 3,
    Attack = 4,
    FireAttack = 5,
    /// Idle while Cancel is physically held; damper buttons stay live.
    OffTest = 6,
    /// Buttons have no effect until unlocked.
    Locked = 7,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Idle,
        Mode::Test,
        Mode::Alert,
        Mode::Fire,
        Mode::Attack,
        Mode::FireAttack,
        Mode::OffTest,
        Mode::Locked,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Test => "test",
            Self::Alert => "alert",
            Self::Fire => "fire",
            Self::Attack => "attack",
            Self::FireAttack => "fire_attack",
            Self::OffTest => "off_test",
            Self::Locked => "locked",
        }
    }

    /// Look up a mode by its wire name.
    pub fn from_name(name: &str) -> Result<Self, CommandError> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| CommandError::UnknownMode(name.to_owned()))
    }

    /// The actuation pattern this mode runs, if any.
    pub fn tone(self) -> Option<Tone> {
        match self {
            Self::Test => Some(Tone::Test),
            Self::Alert => Some(Tone::Alert),
            Self::Fire => Some(Tone::Fire),
            Self::Attack => Some(Tone::Attack),
            Self::FireAttack => Some(Tone::FireAttack),
            Self::Idle | Self::OffTest | Self::Locked => None,
        }
    }
}

impl From<Tone> for Mode {
    fn from(tone: Tone) -> Self {
        match tone {
            Tone::Test => Self::Test,
            Tone::Alert => Self::Alert,
            Tone::Fire => Self::Fire,
            Tone::Attack => Self::Attack,
            Tone::FireAttack => Self::FireAttack,
        }
    }
}

// ---------------------------------------------------------------------------
// Buttons and edges
// ---------------------------------------------------------------------------

/// The five momentary panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Button {
    Test = 0,
    Alert = 1,
    Fire = 2,
    Attack = 3,
    Cancel = 4,
}

impl Button {
    /// Polling order; matches [`PinMap::buttons`](crate::config::PinMap::buttons).
    pub const ALL: [Button; 5] = [
        Button::Test,
        Button::Alert,
        Button::Fire,
        Button::Attack,
        Button::Cancel,
    ];

    pub const fn mask(self) -> u8 {
        1 << self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Alert => "alert",
            Self::Fire => "fire",
            Self::Attack => "attack",
            Self::Cancel => "cancel",
        }
    }

    /// Mode selected when this button starts a new combo.
    pub fn first_press_mode(self) -> Mode {
        match self {
            Self::Test => Mode::Test,
            Self::Alert => Mode::Alert,
            Self::Fire => Mode::Fire,
            Self::Attack => Mode::Attack,
            Self::Cancel => Mode::OffTest,
        }
    }
}

/// A debounced physical edge on one button line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed(Button),
    Released(Button),
}

impl Edge {
    pub fn button(self) -> Button {
        match self {
            Self::Pressed(b) | Self::Released(b) => b,
        }
    }
}
