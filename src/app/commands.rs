//! Inbound command surface.
//!
//! Console, REST and websocket adapters build their routes from a
//! [`CommandTable`] instead of hard-coding method names, then hand the
//! resolved [`PanelCommand`] to
//! [`PanelService::invoke`](super::service::PanelService::invoke).
//! The websocket protocol's JSON requests are parsed into [`Request`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::siren::{Siren, Tone};

/// Panel-level controls that are not tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Cancel,
    Lock,
    Unlock,
}

impl Control {
    pub const ALL: [Control; 3] = [Control::Cancel, Control::Lock, Control::Unlock];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CommandError> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| CommandError::UnknownControl(name.to_owned()))
    }
}

/// Direct output actuation for bench testing.  Only honoured while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugAction {
    MotorOn,
    MotorOff,
    HighDamperClose,
    HighDamperOpen,
    LowDamperClose,
    LowDamperOpen,
    AllOff,
}

impl DebugAction {
    pub const ALL: [DebugAction; 7] = [
        DebugAction::MotorOn,
        DebugAction::MotorOff,
        DebugAction::HighDamperClose,
        DebugAction::HighDamperOpen,
        DebugAction::LowDamperClose,
        DebugAction::LowDamperOpen,
        DebugAction::AllOff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::MotorOn => "motor_on",
            Self::MotorOff => "motor_off",
            Self::HighDamperClose => "high_damper_close",
            Self::HighDamperOpen => "high_damper_open",
            Self::LowDamperClose => "low_damper_close",
            Self::LowDamperOpen => "low_damper_open",
            Self::AllOff => "all_off",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CommandError> {
        Self::ALL
            .into_iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| CommandError::UnknownDebug(name.to_owned()))
    }
}

/// Named groups in the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Tone,
    Control,
    Debug,
}

/// Everything an adapter can ask the panel to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Tone(Tone, Option<Duration>),
    Control(Control),
    Debug(DebugAction),
    /// Generic "sound the siren": the alert tone.
    On(Option<Duration>),
    /// Generic "stop": cancel.
    Off,
}

/// Grouped mapping adapters use to build their route tables.
///
/// Only tones the attached siren supports are listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTable {
    tones: heapless::Vec<Tone, 5>,
}

impl CommandTable {
    pub fn for_siren(siren: &dyn Siren) -> Self {
        Self {
            tones: Tone::ALL.into_iter().filter(|t| siren.supports(*t)).collect(),
        }
    }

    pub fn tones(&self) -> &[Tone] {
        &self.tones
    }

    pub fn names(&self, group: CommandGroup) -> Vec<&'static str> {
        match group {
            CommandGroup::Tone => self.tones.iter().map(|t| t.name()).collect(),
            CommandGroup::Control => Control::ALL.iter().map(|c| c.name()).collect(),
            CommandGroup::Debug => DebugAction::ALL.iter().map(|d| d.name()).collect(),
        }
    }

    /// Look up `name` within `group`.  `duration` only applies to tones.
    pub fn resolve(
        &self,
        group: CommandGroup,
        name: &str,
        duration: Option<Duration>,
    ) -> Result<PanelCommand, CommandError> {
        match group {
            CommandGroup::Tone => {
                let tone = Tone::from_name(name)?;
                if !self.tones.contains(&tone) {
                    return Err(CommandError::Unsupported(tone.name()));
                }
                Ok(PanelCommand::Tone(tone, duration))
            }
            CommandGroup::Control => Control::from_name(name).map(PanelCommand::Control),
            CommandGroup::Debug => DebugAction::from_name(name).map(PanelCommand::Debug),
        }
    }

    /// `{tone: [...], control: [...], debug: [...], on, off, is_on}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "tone": self.names(CommandGroup::Tone),
            "control": self.names(CommandGroup::Control),
            "debug": self.names(CommandGroup::Debug),
            "on": Tone::Alert.name(),
            "off": Control::Cancel.name(),
            "is_on": "is_on",
        })
    }
}

// ---------------------------------------------------------------------------
// Websocket request protocol
// ---------------------------------------------------------------------------

/// One websocket request.  Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum Request {
    GetTones,
    TurnOn {
        #[serde(default)]
        duration: Option<f64>,
    },
    TurnOff,
    SetTone {
        tone: String,
        #[serde(default)]
        duration: Option<f64>,
    },
    GetStatus,
}

impl Request {
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        serde_json::from_str(text).map_err(|e| CommandError::BadRequest(e.to_string()))
    }
}

/// Seconds from the wire to a tone duration.
pub fn duration_from_secs(secs: Option<f64>) -> Result<Option<Duration>, CommandError> {
    secs.map(|s| {
        Duration::try_from_secs_f64(s)
            .map_err(|_| CommandError::BadRequest(format!("duration {s} out of range")))
    })
    .transpose()
}
